//! Entity types for every console surface.
//!
//! All entities are in-memory only. Page-local collections are seeded from
//! [`crate::fixtures`] when a page opens and discarded when it closes; the
//! shell-scoped types ([`status::SystemStatus`], the notification store)
//! live for the session.

pub mod admin;
pub mod ai_model;
pub mod device;
pub mod monitoring;
pub mod pcap;
pub mod status;
pub mod threat;
pub mod topology;
pub mod workflow;
