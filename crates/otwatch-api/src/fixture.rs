//! Offline fixture store for the workflow endpoints.
//!
//! Only the `/api/workflows/...` paths have offline behavior; every other
//! surface keeps its own page-local seeds. The store is stateful so that a
//! cancel or create during an outage is still visible to the next list call
//! in the same session.

use std::sync::Mutex;

use chrono::{Duration, Utc};
use serde_json::{Value, json};

use otwatch_core::model::workflow::{
    InstanceStatus, WorkflowAction, WorkflowInstance, WorkflowTemplate,
};

use crate::error::Error;

fn action(action_type: &str, target: &str, description: &str) -> WorkflowAction {
    WorkflowAction {
        action_type: action_type.into(),
        target: target.into(),
        description: description.into(),
        parameters: None,
    }
}

fn seed_templates() -> Vec<WorkflowTemplate> {
    let now = Utc::now();
    vec![
        WorkflowTemplate {
            id: "1".into(),
            name: "Isolate compromised device".into(),
            description: "Quarantine a device at the switch and notify the on-call engineer.".into(),
            threat_type: "Malware".into(),
            created_by: "sarah.chen".into(),
            created_at: now - Duration::days(40),
            actions: vec![
                action("isolate", "switch", "Move the device port to the quarantine VLAN"),
                action("notify", "on-call", "Page the on-call OT engineer"),
                action("capture", "span-port", "Start a packet capture on the mirrored port"),
            ],
        },
        WorkflowTemplate {
            id: "2".into(),
            name: "Block malicious indicator".into(),
            description: "Push a firewall block for a confirmed bad address or domain.".into(),
            threat_type: "Command and Control".into(),
            created_by: "marcus.webb".into(),
            created_at: now - Duration::days(25),
            actions: vec![
                action("block", "edge-firewall", "Add the indicator to the egress denylist"),
                action("verify", "firewall-logs", "Confirm subsequent hits are dropped"),
            ],
        },
        WorkflowTemplate {
            id: "3".into(),
            name: "PLC change-window lockdown".into(),
            description: "Reject engineering writes outside an approved change window.".into(),
            threat_type: "Protocol Abuse".into(),
            created_by: "sarah.chen".into(),
            created_at: now - Duration::days(10),
            actions: vec![
                action("policy", "ids", "Arm the write-blocking IDS rule set"),
                action("notify", "operations", "Announce lockdown start in the ops channel"),
            ],
        },
    ]
}

fn seed_instances() -> Vec<WorkflowInstance> {
    let now = Utc::now();
    vec![
        WorkflowInstance {
            id: "100".into(),
            template_id: "2".into(),
            template_name: "Block malicious indicator".into(),
            status: InstanceStatus::Completed,
            current_step: 2,
            total_steps: 2,
            target_device: "Edge-Firewall-01".into(),
            started_at: now - Duration::hours(5),
            completed_at: Some(now - Duration::hours(5) + Duration::minutes(4)),
            started_by: "marcus.webb".into(),
            alert_id: Some("5".into()),
        },
        WorkflowInstance {
            id: "101".into(),
            template_id: "1".into(),
            template_name: "Isolate compromised device".into(),
            status: InstanceStatus::InProgress,
            current_step: 1,
            total_steps: 3,
            target_device: "Eng-Workstation-03".into(),
            started_at: now - Duration::minutes(12),
            completed_at: None,
            started_by: "sarah.chen".into(),
            alert_id: Some("1".into()),
        },
        WorkflowInstance {
            id: "102".into(),
            template_id: "3".into(),
            template_name: "PLC change-window lockdown".into(),
            status: InstanceStatus::Failed,
            current_step: 1,
            total_steps: 2,
            target_device: "PLC-Station-02".into(),
            started_at: now - Duration::hours(30),
            completed_at: Some(now - Duration::hours(30) + Duration::minutes(1)),
            started_by: "priya.nair".into(),
            alert_id: None,
        },
    ]
}

struct Inner {
    templates: Vec<WorkflowTemplate>,
    instances: Vec<WorkflowInstance>,
    last_id: u64,
}

/// Stateful fixture data behind the workflow endpoints when offline.
pub struct FixtureStore {
    inner: Mutex<Inner>,
}

impl Default for FixtureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                templates: seed_templates(),
                instances: seed_instances(),
                last_id: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Mutex poisoning cannot leave fixture data inconsistent; recover.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Mint a string id, monotonic from the current millisecond.
    fn mint_id(inner: &mut Inner) -> String {
        #[allow(clippy::cast_sign_loss)]
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        let id = now_ms.max(inner.last_id + 1);
        inner.last_id = id;
        id.to_string()
    }

    pub fn templates(&self) -> Vec<WorkflowTemplate> {
        self.lock().templates.clone()
    }

    pub fn instances(&self) -> Vec<WorkflowInstance> {
        self.lock().instances.clone()
    }

    /// Insert a template from a POST body: the body merged with a fresh id.
    pub fn create_template(&self, body: &Value) -> Result<WorkflowTemplate, Error> {
        let mut inner = self.lock();
        let id = Self::mint_id(&mut inner);
        let mut merged = body.clone();
        if let Some(obj) = merged.as_object_mut() {
            obj.insert("id".into(), json!(id));
            obj.entry("created_at").or_insert_with(|| json!(Utc::now()));
        }
        let template: WorkflowTemplate =
            serde_json::from_value(merged).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.to_string(),
            })?;
        inner.templates.push(template.clone());
        Ok(template)
    }

    /// Insert an instance from a POST body, same merge rule as templates.
    pub fn create_instance(&self, body: &Value) -> Result<WorkflowInstance, Error> {
        let mut inner = self.lock();
        let id = Self::mint_id(&mut inner);
        let mut merged = body.clone();
        if let Some(obj) = merged.as_object_mut() {
            obj.insert("id".into(), json!(id));
            obj.entry("status").or_insert_with(|| json!("pending"));
            obj.entry("started_at").or_insert_with(|| json!(Utc::now()));
        }
        let instance: WorkflowInstance =
            serde_json::from_value(merged).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.to_string(),
            })?;
        inner.instances.push(instance.clone());
        Ok(instance)
    }

    /// Cancel an instance in place so the next list reflects it.
    pub fn cancel_instance(&self, id: &str) -> Result<WorkflowInstance, Error> {
        let mut inner = self.lock();
        let instance = inner
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound {
                kind: "workflow instance",
                id: id.to_owned(),
            })?;
        if !instance.status.is_terminal() {
            instance.status = InstanceStatus::Cancelled;
            instance.completed_at = Some(Utc::now());
        }
        Ok(instance.clone())
    }

    pub fn delete_template(&self, id: &str) {
        self.lock().templates.retain(|t| t.id != id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seeds_include_the_in_progress_instance() {
        let store = FixtureStore::new();
        let instances = store.instances();
        let running = instances.iter().find(|i| i.id == "101").unwrap();
        assert_eq!(running.status, InstanceStatus::InProgress);
    }

    #[test]
    fn cancel_is_visible_to_the_next_list() {
        let store = FixtureStore::new();
        store.cancel_instance("101").unwrap();
        let instances = store.instances();
        let cancelled = instances.iter().find(|i| i.id == "101").unwrap();
        assert_eq!(cancelled.status, InstanceStatus::Cancelled);
        assert!(cancelled.completed_at.is_some());
    }

    #[test]
    fn cancel_of_terminal_instance_is_a_noop() {
        let store = FixtureStore::new();
        let done = store.cancel_instance("100").unwrap();
        assert_eq!(done.status, InstanceStatus::Completed);
    }

    #[test]
    fn created_template_gets_a_minted_string_id() {
        let store = FixtureStore::new();
        let body = json!({
            "name": "New playbook",
            "description": "test",
            "threat_type": "Anomaly",
            "created_by": "tester",
            "actions": [{"type": "notify", "target": "ops", "description": "ping"}],
        });
        let created = store.create_template(&body).unwrap();
        assert!(created.id.parse::<u64>().is_ok());
        assert_eq!(store.templates().len(), 4);

        let again = store.create_template(&body).unwrap();
        assert!(again.id.parse::<u64>().unwrap() > created.id.parse::<u64>().unwrap());
    }

    #[test]
    fn unknown_instance_cancel_is_not_found() {
        let store = FixtureStore::new();
        let err = store.cancel_instance("999").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
