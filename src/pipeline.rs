// src/pipeline.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate;
use crate::error::PipelineError;
use crate::sink::{ReportBatch, ReportTable, SinkWriter};
use crate::source::SourceClient;

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub table: ReportTable,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableSummary>,
}

/// fetch -> (aggregate -> replace) x 3.
///
/// The first failure aborts the run. Tables replaced before that point keep
/// their new rows; nothing is rolled back across tables.
pub struct Pipeline {
    source: Arc<dyn SourceClient>,
    sink: Arc<dyn SinkWriter>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn SourceClient>, sink: Arc<dyn SinkWriter>) -> Self {
        Self { source, sink }
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        tracing::info!("Starting data aggregation...");

        // Independent sources: fetched concurrently, either failure fails the run.
        let (appointments, patients) =
            tokio::try_join!(self.source.fetch_appointments(), self.source.fetch_patients())?;

        let mut tables = Vec::with_capacity(3);
        let per_doctor = aggregate::appointments_per_doctor(&appointments);
        self.replace(ReportBatch::AppointmentsPerDoctor(per_doctor), &mut tables)
            .await?;

        let over_time = aggregate::appointments_over_time(&appointments);
        self.replace(ReportBatch::AppointmentsOverTime(over_time), &mut tables)
            .await?;

        let symptoms = aggregate::symptoms_by_specialty(&patients);
        self.replace(ReportBatch::SymptomsBySpecialty(symptoms), &mut tables)
            .await?;

        let finished_at = Utc::now();
        tracing::info!(
            "Data aggregation completed in {} ms",
            (finished_at - started_at).num_milliseconds()
        );
        Ok(RunReport {
            started_at,
            finished_at,
            tables,
        })
    }

    async fn replace(
        &self,
        batch: ReportBatch,
        done: &mut Vec<TableSummary>,
    ) -> Result<(), PipelineError> {
        let table = batch.table();
        let rows = self.sink.replace(batch).await?;
        done.push(TableSummary { table, rows });
        Ok(())
    }
}
