// src/source.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{FetchCause, PipelineError};
use crate::models::{AppointmentRecord, PatientRecord};

/// Upstream collections consumed by a run.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch_appointments(&self) -> Result<Vec<AppointmentRecord>, PipelineError>;
    async fn fetch_patients(&self) -> Result<Vec<PatientRecord>, PipelineError>;
}

pub struct HttpSourceClient {
    client: reqwest::Client,
    appointments_url: String,
    patients_url: String,
}

impl HttpSourceClient {
    pub fn new(
        base_url: &str,
        appointments_endpoint: &str,
        patients_endpoint: &str,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            appointments_url: join_url(base_url, appointments_endpoint),
            patients_url: join_url(base_url, patients_endpoint),
        })
    }

    async fn get_all<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<Vec<T>, PipelineError> {
        tracing::info!("Fetching all {what} from {url}");

        let fail = |source: FetchCause| {
            tracing::error!("Error fetching {what} from {url}: {source}");
            PipelineError::UpstreamFetch {
                url: url.to_string(),
                source,
            }
        };

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| fail(e.into()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(FetchCause::Status(status)));
        }

        let body = resp.bytes().await.map_err(|e| fail(e.into()))?;
        let records = decode_collection::<T>(&body).map_err(|e| fail(e.into()))?;

        if records.is_empty() {
            tracing::warn!("No {what} found at {url}");
        } else {
            tracing::info!("Successfully fetched {} {what}", records.len());
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn fetch_appointments(&self) -> Result<Vec<AppointmentRecord>, PipelineError> {
        self.get_all(&self.appointments_url, "appointments").await
    }

    async fn fetch_patients(&self) -> Result<Vec<PatientRecord>, PipelineError> {
        self.get_all(&self.patients_url, "patients").await
    }
}

/// Decodes a JSON array body. An empty body or a literal `null` is an empty
/// collection; anything else that is not an array of records is an error.
pub fn decode_collection<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice::<Option<Vec<T>>>(body)?.unwrap_or_default())
}

fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base.trim_end_matches('/'), path),
        (false, false) if !path.is_empty() => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}
