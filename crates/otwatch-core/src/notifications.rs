//! Session-scoped notification store.
//!
//! Owned by the shell and shared with the notifications drawer. Newest
//! entries sit at the front. Appends from the telemetry ticker keep the
//! store bounded at [`TICKER_CAP`]; appends from user actions are not
//! bounded (they are rare).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most-recent entries kept after a ticker append.
pub const TICKER_CAP: usize = 10;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One entry in the drawer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique within the session, strictly increasing.
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub acknowledged: bool,
}

/// Ordered store of notifications, newest first.
#[derive(Debug, Default)]
pub struct NotificationStore {
    entries: Vec<Notification>,
    last_id: u64,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are wall-clock milliseconds, bumped past the previous id when two
    /// appends land in the same millisecond.
    fn mint_id(&mut self) -> u64 {
        #[allow(clippy::cast_sign_loss)]
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;
        id
    }

    fn push_inner(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.mint_id();
        self.entries.insert(
            0,
            Notification {
                id,
                kind,
                title: title.into(),
                message: message.into(),
                timestamp: Utc::now(),
                read: false,
                acknowledged: false,
            },
        );
        id
    }

    /// Append from a user action. Unbounded.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        self.push_inner(kind, title, message)
    }

    /// Append from the telemetry ticker. Trims the tail to [`TICKER_CAP`].
    pub fn push_from_ticker(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.push_inner(kind, title, message);
        self.entries.truncate(TICKER_CAP);
        id
    }

    /// Mark one entry read. Idempotent; unknown ids are no-ops.
    pub fn mark_read(&mut self, id: u64) {
        if let Some(n) = self.entries.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
    }

    /// Mark every entry read.
    pub fn mark_all_read(&mut self) {
        for n in &mut self.entries {
            n.read = true;
        }
    }

    /// Acknowledge an entry. Acknowledging implies reading.
    pub fn acknowledge(&mut self, id: u64) {
        if let Some(n) = self.entries.iter_mut().find(|n| n.id == id) {
            n.acknowledged = true;
            n.read = true;
        }
    }

    /// Remove one entry. Unknown ids are no-ops.
    pub fn remove(&mut self, id: u64) {
        self.entries.retain(|n| n.id != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn get(&self, id: u64) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ticker_appends_cap_at_ten_with_increasing_ids() {
        let mut store = NotificationStore::new();
        let mut ids = Vec::new();
        for i in 0..15 {
            ids.push(store.push_from_ticker(
                NotificationKind::Info,
                "tick",
                format!("tick {i}"),
            ));
            assert!(store.len() <= TICKER_CAP);
        }
        assert_eq!(store.len(), TICKER_CAP);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {ids:?}");
        // Newest first: the head carries the last minted id.
        assert_eq!(store.entries()[0].id, *ids.last().unwrap());
    }

    #[test]
    fn user_appends_are_unbounded() {
        let mut store = NotificationStore::new();
        for _ in 0..15 {
            store.push(NotificationKind::Warning, "manual", "from a page action");
        }
        assert_eq!(store.len(), 15);
    }

    #[test]
    fn mark_all_read_leaves_zero_unread() {
        let mut store = NotificationStore::new();
        for _ in 0..5 {
            store.push(NotificationKind::Error, "e", "m");
        }
        assert_eq!(store.unread_count(), 5);
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        // Idempotent.
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn acknowledge_sets_both_flags() {
        let mut store = NotificationStore::new();
        let id = store.push(NotificationKind::Warning, "w", "m");
        store.acknowledge(id);
        let n = store.get(id).unwrap();
        assert!(n.acknowledged);
        assert!(n.read);
    }

    #[test]
    fn remove_and_unknown_ids_are_noops() {
        let mut store = NotificationStore::new();
        let id = store.push(NotificationKind::Info, "i", "m");
        store.mark_read(9_999_999_999_999);
        store.acknowledge(9_999_999_999_999);
        store.remove(9_999_999_999_999);
        assert_eq!(store.len(), 1);
        store.remove(id);
        assert!(store.is_empty());
    }
}
