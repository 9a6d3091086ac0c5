//! Simulated telemetry generation for the 5-second ticker.
//!
//! The ticker task in the TUI calls [`random_status`] every period and
//! replaces the shell's `SystemStatus` wholesale, then rolls
//! [`maybe_notification`] to decide whether the tick also pushes a
//! notification.

use rand::Rng;

use crate::model::status::{DeviceCounters, ModelCounters, SystemStatus, ThreatCounters};
use crate::notifications::NotificationKind;

/// Tick period in seconds.
pub const TICK_SECS: u64 = 5;

/// Probability that a tick appends a notification.
pub const NOTIFY_PROBABILITY: f64 = 0.2;

/// The four templated ticker notifications, one per kind.
pub const TEMPLATES: &[(NotificationKind, &str, &str)] = &[
    (
        NotificationKind::Warning,
        "High CPU usage",
        "PLC-Station-07 CPU load exceeded 85% for five minutes",
    ),
    (
        NotificationKind::Error,
        "Device unreachable",
        "Communication lost with RTU-Field-12 on 10.20.1.45",
    ),
    (
        NotificationKind::Info,
        "Model retraining finished",
        "Scheduled retraining of the anomaly detector completed",
    ),
    (
        NotificationKind::Success,
        "Signatures updated",
        "Threat signature database updated to the latest revision",
    ),
];

/// Fresh random header counters, all within the simulated ranges.
pub fn random_status<R: Rng + ?Sized>(rng: &mut R) -> SystemStatus {
    SystemStatus {
        devices: DeviceCounters {
            total: rng.gen_range(100..150),
            online: rng.gen_range(80..120),
            critical: rng.gen_range(2..7),
        },
        threats: ThreatCounters {
            active: rng.gen_range(5..15),
            resolved: rng.gen_range(30..50),
            investigating: rng.gen_range(3..11),
        },
        models: ModelCounters {
            active: rng.gen_range(8..13),
            training: rng.gen_range(1..4),
            accuracy: format!("{:.3}", rng.gen_range(0.9..1.0)),
        },
    }
}

/// With probability [`NOTIFY_PROBABILITY`], pick one of the four templates.
pub fn maybe_notification<R: Rng + ?Sized>(
    rng: &mut R,
) -> Option<(NotificationKind, &'static str, &'static str)> {
    if !rng.gen_bool(NOTIFY_PROBABILITY) {
        return None;
    }
    let idx = rng.gen_range(0..TEMPLATES.len());
    TEMPLATES.get(idx).copied()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn status_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = random_status(&mut rng);
            assert!((100..150).contains(&s.devices.total));
            assert!((80..120).contains(&s.devices.online));
            assert!((2..7).contains(&s.devices.critical));
            assert!((5..15).contains(&s.threats.active));
            assert!((30..50).contains(&s.threats.resolved));
            assert!((3..11).contains(&s.threats.investigating));
            assert!((8..13).contains(&s.models.active));
            assert!((1..4).contains(&s.models.training));

            let acc: f64 = s.models.accuracy.parse().unwrap();
            assert!((0.9..=1.0).contains(&acc), "accuracy {acc}");
            // Three decimals, as a string.
            assert_eq!(s.models.accuracy.split('.').nth(1).unwrap().len(), 3);
        }
    }

    #[test]
    fn notification_rate_is_roughly_one_in_five() {
        let mut rng = StdRng::seed_from_u64(42);
        let fired = (0..10_000)
            .filter(|_| maybe_notification(&mut rng).is_some())
            .count();
        assert!((1_600..2_400).contains(&fired), "fired {fired} of 10000");
    }

    #[test]
    fn templates_cover_all_four_kinds() {
        let kinds: Vec<_> = TEMPLATES.iter().map(|(k, _, _)| *k).collect();
        assert!(kinds.contains(&NotificationKind::Info));
        assert!(kinds.contains(&NotificationKind::Success));
        assert!(kinds.contains(&NotificationKind::Warning));
        assert!(kinds.contains(&NotificationKind::Error));
    }
}
