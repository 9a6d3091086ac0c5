//! Typed facade over the PCAP control plane.
//!
//! Unlike workflows, PCAP calls never fall back to fixtures: failures
//! surface as errors and the page renders them in an inline banner.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use otwatch_core::model::pcap::{PcapFile, PcapStats};

use crate::client::{RestClient, decode};
use crate::error::Error;

/// Body of `GET /api/v1/pcap/?limit=N`.
#[derive(Debug, Deserialize)]
struct FilesResponse {
    files: Vec<PcapFile>,
}

/// Body of the capture status/start/stop endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureStatus {
    pub running: bool,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub packet_count: Option<u64>,
}

/// Body of the training status endpoint, polled until terminal.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingStatus {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TrainingStatus {
    /// Terminal statuses stop the poll loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed")
    }
}

/// Client for the `/api/v1/pcap/...` endpoints.
pub struct PcapService {
    client: RestClient,
}

impl PcapService {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// List the most recent capture files.
    pub async fn list(&self, limit: usize) -> Result<Vec<PcapFile>, Error> {
        let value = self.client.get(&format!("/api/v1/pcap/?limit={limit}")).await?;
        let resp: FilesResponse = decode(value)?;
        Ok(resp.files)
    }

    /// Aggregate counters for the stats strip.
    pub async fn stats(&self) -> Result<PcapStats, Error> {
        decode(self.client.get("/api/v1/pcap/stats").await?)
    }

    /// Metadata for one file.
    pub async fn get(&self, id: i64) -> Result<PcapFile, Error> {
        decode(self.client.get(&format!("/api/v1/pcap/{id}")).await?)
    }

    /// Raw capture bytes.
    pub async fn download(&self, id: i64) -> Result<Bytes, Error> {
        self.client.get_bytes(&format!("/api/v1/pcap/{id}/download")).await
    }

    /// Upload a capture as multipart field `file`, optionally queueing an
    /// automatic training run.
    pub async fn upload(
        &self,
        filename: &str,
        contents: Vec<u8>,
        auto_train: bool,
    ) -> Result<PcapFile, Error> {
        let part = reqwest::multipart::Part::bytes(contents).file_name(filename.to_owned());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if auto_train {
            form = form.text("auto_train", "true");
        }
        decode(self.client.post_multipart("/api/v1/pcap/upload", form).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        self.client.delete(&format!("/api/v1/pcap/{id}")).await?;
        Ok(())
    }

    /// Queue an analysis run for one file.
    pub async fn analyze(&self, id: i64, options: &Value) -> Result<Value, Error> {
        self.client
            .post(&format!("/api/v1/pcap/{id}/analyze"), Some(options))
            .await
    }

    /// Flag or unflag a file for prioritized training.
    pub async fn set_flagged(&self, id: i64, flagged: bool) -> Result<PcapFile, Error> {
        let verb = if flagged { "flag" } else { "unflag" };
        decode(self.client.post(&format!("/api/v1/pcap/{id}/{verb}"), None).await?)
    }

    // ── Capture control plane ────────────────────────────────────────

    pub async fn capture_status(&self) -> Result<CaptureStatus, Error> {
        decode(self.client.get("/api/v1/pcap/capture/status").await?)
    }

    pub async fn capture_start(&self, interface: Option<&str>) -> Result<CaptureStatus, Error> {
        let body = interface.map(|i| json!({ "interface": i }));
        decode(
            self.client
                .post("/api/v1/pcap/capture/start", body.as_ref())
                .await?,
        )
    }

    pub async fn capture_stop(&self) -> Result<CaptureStatus, Error> {
        decode(self.client.post("/api/v1/pcap/capture/stop", None).await?)
    }

    // ── Training ─────────────────────────────────────────────────────

    pub async fn training_start(&self, file_ids: &[i64]) -> Result<TrainingStatus, Error> {
        let body = json!({ "file_ids": file_ids });
        decode(self.client.post("/api/v1/pcap/training/start", Some(&body)).await?)
    }

    pub async fn training_status(&self) -> Result<TrainingStatus, Error> {
        decode(self.client.get("/api/v1/pcap/training/status").await?)
    }

    /// Export selected captures in the requested format.
    pub async fn export(&self, file_ids: &[i64], format: &str) -> Result<Value, Error> {
        let body = json!({ "file_ids": file_ids, "format": format });
        self.client.post("/api/v1/pcap/export", Some(&body)).await
    }
}
