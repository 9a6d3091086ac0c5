//! Workflow endpoints with transparent offline fallback.
//!
//! [`WorkflowService`] decorates [`RestClient`]: before every call it probes
//! `/health`, and routes to the backend only on a 2xx. A failed probe, or a
//! network failure from the forwarded request itself, falls through to the
//! [`FixtureStore`]. Server-side errors (4xx/5xx) do NOT fall back; they
//! surface to the caller.

use serde_json::{Value, json};
use tracing::{debug, info};

use otwatch_core::model::workflow::{WorkflowInstance, WorkflowTemplate};

use crate::client::{RestClient, decode};
use crate::error::Error;
use crate::fixture::FixtureStore;

/// Where a workflow response came from. The workflows page shows an
/// "offline" badge when responses are served from fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowSource {
    Backend,
    Fixture,
}

/// Offline-tolerant facade over the `/api/workflows/...` endpoints.
pub struct WorkflowService {
    client: RestClient,
    fixtures: FixtureStore,
}

impl WorkflowService {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            fixtures: FixtureStore::new(),
        }
    }

    /// Swap in a pre-seeded store (tests).
    pub fn with_fixtures(client: RestClient, fixtures: FixtureStore) -> Self {
        Self { client, fixtures }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// One probe per call, never cached.
    async fn backend_available(&self) -> bool {
        let available = self.client.probe().await;
        if !available {
            info!("backend unavailable, serving workflow fixtures");
        }
        available
    }

    pub async fn list_templates(&self) -> Result<(Vec<WorkflowTemplate>, WorkflowSource), Error> {
        if self.backend_available().await {
            match self.client.get("/api/workflows/templates").await {
                Ok(value) => return Ok((decode(value)?, WorkflowSource::Backend)),
                Err(err) if err.is_network() => {
                    debug!(%err, "template list fell back to fixtures");
                }
                Err(err) => return Err(err),
            }
        }
        Ok((self.fixtures.templates(), WorkflowSource::Fixture))
    }

    pub async fn list_instances(&self) -> Result<(Vec<WorkflowInstance>, WorkflowSource), Error> {
        if self.backend_available().await {
            match self.client.get("/api/workflows/instances").await {
                Ok(value) => return Ok((decode(value)?, WorkflowSource::Backend)),
                Err(err) if err.is_network() => {
                    debug!(%err, "instance list fell back to fixtures");
                }
                Err(err) => return Err(err),
            }
        }
        Ok((self.fixtures.instances(), WorkflowSource::Fixture))
    }

    pub async fn create_template(
        &self,
        body: &Value,
    ) -> Result<(WorkflowTemplate, WorkflowSource), Error> {
        if self.backend_available().await {
            match self.client.post("/api/workflows/templates", Some(body)).await {
                Ok(value) => return Ok((decode(value)?, WorkflowSource::Backend)),
                Err(err) if err.is_network() => {
                    debug!(%err, "template create fell back to fixtures");
                }
                Err(err) => return Err(err),
            }
        }
        Ok((self.fixtures.create_template(body)?, WorkflowSource::Fixture))
    }

    pub async fn delete_template(&self, id: &str) -> Result<WorkflowSource, Error> {
        if self.backend_available().await {
            match self
                .client
                .delete(&format!("/api/workflows/templates/{id}"))
                .await
            {
                Ok(_) => return Ok(WorkflowSource::Backend),
                Err(err) if err.is_network() => {
                    debug!(%err, "template delete fell back to fixtures");
                }
                Err(err) => return Err(err),
            }
        }
        self.fixtures.delete_template(id);
        Ok(WorkflowSource::Fixture)
    }

    /// Execute a template: POST a new instance.
    pub async fn execute_template(
        &self,
        template: &WorkflowTemplate,
        target_device: &str,
        started_by: &str,
    ) -> Result<(WorkflowInstance, WorkflowSource), Error> {
        #[allow(clippy::cast_possible_truncation)]
        let body = json!({
            "template_id": template.id,
            "template_name": template.name,
            "status": "pending",
            "current_step": 0,
            "total_steps": template.actions.len() as u32,
            "target_device": target_device,
            "started_by": started_by,
        });
        if self.backend_available().await {
            match self.client.post("/api/workflows/instances", Some(&body)).await {
                Ok(value) => return Ok((decode(value)?, WorkflowSource::Backend)),
                Err(err) if err.is_network() => {
                    debug!(%err, "instance create fell back to fixtures");
                }
                Err(err) => return Err(err),
            }
        }
        Ok((self.fixtures.create_instance(&body)?, WorkflowSource::Fixture))
    }

    pub async fn cancel_instance(
        &self,
        id: &str,
    ) -> Result<(WorkflowInstance, WorkflowSource), Error> {
        if self.backend_available().await {
            match self
                .client
                .post(&format!("/api/workflows/instances/{id}/cancel"), None)
                .await
            {
                Ok(value) => return Ok((decode(value)?, WorkflowSource::Backend)),
                Err(err) if err.is_network() => {
                    debug!(%err, "instance cancel fell back to fixtures");
                }
                Err(err) => return Err(err),
            }
        }
        Ok((self.fixtures.cancel_instance(id)?, WorkflowSource::Fixture))
    }
}
