// src/trigger.rs

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::PipelineError;
use crate::pipeline::{Pipeline, RunReport};

/// Where a run request came from, for logging only.
#[derive(Debug, Clone, Copy)]
pub enum Origin {
    Manual,
    Timer,
}

/// Single-flight entry point shared by the HTTP endpoint and the timer.
///
/// Overlapping runs would interleave delete/insert statements on the same
/// tables, so a request arriving while a run is in flight is rejected.
/// A started run is never cancelled: it executes on its own task, and a caller
/// that goes away (e.g. a dropped HTTP request) only stops waiting for it.
pub struct Trigger {
    pipeline: Arc<Pipeline>,
    in_flight: Arc<Mutex<()>>,
}

impl Trigger {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub async fn fire(&self, origin: Origin) -> Result<RunReport, PipelineError> {
        let Ok(guard) = self.in_flight.clone().try_lock_owned() else {
            tracing::warn!(?origin, "Aggregation run requested while another is in progress");
            return Err(PipelineError::AlreadyRunning);
        };

        tracing::info!(?origin, "Initiating data aggregation process.");
        let pipeline = self.pipeline.clone();
        let run = tokio::spawn(async move {
            let _guard = guard;
            match pipeline.run().await {
                Ok(report) => {
                    tracing::info!(
                        ?origin,
                        tables = ?report.tables,
                        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
                        "Data aggregation process completed successfully."
                    );
                    Ok(report)
                }
                Err(e) => {
                    tracing::error!(?origin, "Error occurred during data aggregation: {e}");
                    Err(e)
                }
            }
        });

        run.await?
    }
}
