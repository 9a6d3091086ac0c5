//! `otwatch-api` — transport for the otwatch console.
//!
//! The layering mirrors the backend split: [`RestClient`] is a thin
//! request/response wrapper with a per-call health probe; [`WorkflowService`]
//! decorates it with offline fixture fallback for the workflow endpoints;
//! [`PcapService`] maps the PCAP control plane onto typed calls and never
//! falls back (its errors surface in the page banner instead).

pub mod client;
pub mod error;
pub mod fixture;
pub mod pcap;
pub mod transport;
pub mod workflows;

pub use client::RestClient;
pub use error::Error;
pub use fixture::FixtureStore;
pub use pcap::PcapService;
pub use transport::TransportConfig;
pub use workflows::{WorkflowService, WorkflowSource};
