// src/sink.rs

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::PipelineError;
use crate::models::{AppointmentsOverTime, AppointmentsPerDoctor, SymptomsBySpecialty};

/*
Reporting tables (all fully replaced on every run):
  appointments_per_doctor(doctor_id, doctor_name, appointment_count, updated_at)
  appointments_over_time(period, appointment_count, updated_at)
  symptoms_by_specialty(specialty, symptom, occurrence_count, updated_at)
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTable {
    AppointmentsPerDoctor,
    AppointmentsOverTime,
    SymptomsBySpecialty,
}

impl ReportTable {
    pub fn name(self) -> &'static str {
        match self {
            ReportTable::AppointmentsPerDoctor => "appointments_per_doctor",
            ReportTable::AppointmentsOverTime => "appointments_over_time",
            ReportTable::SymptomsBySpecialty => "symptoms_by_specialty",
        }
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows destined for one reporting table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBatch {
    AppointmentsPerDoctor(Vec<AppointmentsPerDoctor>),
    AppointmentsOverTime(Vec<AppointmentsOverTime>),
    SymptomsBySpecialty(Vec<SymptomsBySpecialty>),
}

impl ReportBatch {
    pub fn table(&self) -> ReportTable {
        match self {
            ReportBatch::AppointmentsPerDoctor(_) => ReportTable::AppointmentsPerDoctor,
            ReportBatch::AppointmentsOverTime(_) => ReportTable::AppointmentsOverTime,
            ReportBatch::SymptomsBySpecialty(_) => ReportTable::SymptomsBySpecialty,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReportBatch::AppointmentsPerDoctor(rows) => rows.len(),
            ReportBatch::AppointmentsOverTime(rows) => rows.len(),
            ReportBatch::SymptomsBySpecialty(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replaces the whole content of a reporting table.
#[async_trait]
pub trait SinkWriter: Send + Sync {
    /// Returns the number of rows written.
    async fn replace(&self, batch: ReportBatch) -> Result<usize, PipelineError>;
}

pub struct PgSinkWriter {
    db: PgPool,
}

impl PgSinkWriter {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SinkWriter for PgSinkWriter {
    // Delete and inserts share one transaction: a failed replace leaves the
    // previous rows in place. Other tables are not affected either way.
    async fn replace(&self, batch: ReportBatch) -> Result<usize, PipelineError> {
        let table = batch.table();
        let fail = |source: sqlx::Error| {
            tracing::error!("Failed to replace table {table}: {source}");
            PipelineError::SinkWrite { table, source }
        };

        let mut tx = self.db.begin().await.map_err(fail)?;

        tracing::info!("Clearing table: {table}");
        // DELETE rather than TRUNCATE so the statement stays inside the transaction
        // on stores where TRUNCATE commits implicitly.
        sqlx::query(&format!("DELETE FROM {}", table.name()))
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        let written_at = Utc::now();
        if batch.is_empty() {
            tracing::warn!("No rows for {table}; it will be left empty");
        } else {
            tracing::info!("Pushing {} rows to {table}...", batch.len());
        }
        let written = insert_rows(&mut tx, &batch, written_at).await.map_err(fail)?;

        tx.commit().await.map_err(fail)?;
        tracing::info!("Replaced table {table} with {written} rows");
        Ok(written)
    }
}

async fn insert_rows(
    tx: &mut Transaction<'_, Postgres>,
    batch: &ReportBatch,
    written_at: DateTime<Utc>,
) -> Result<usize, sqlx::Error> {
    match batch {
        ReportBatch::AppointmentsPerDoctor(rows) => {
            for r in rows {
                sqlx::query(
                    r#"
                    INSERT INTO appointments_per_doctor (doctor_id, doctor_name, appointment_count, updated_at)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&r.doctor_id)
                .bind(&r.doctor_name)
                .bind(r.appointment_count)
                .bind(written_at)
                .execute(&mut **tx)
                .await?;
            }
            Ok(rows.len())
        }
        ReportBatch::AppointmentsOverTime(rows) => {
            for r in rows {
                sqlx::query(
                    r#"
                    INSERT INTO appointments_over_time (period, appointment_count, updated_at)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(&r.period)
                .bind(r.appointment_count)
                .bind(written_at)
                .execute(&mut **tx)
                .await?;
            }
            Ok(rows.len())
        }
        ReportBatch::SymptomsBySpecialty(rows) => {
            for r in rows {
                sqlx::query(
                    r#"
                    INSERT INTO symptoms_by_specialty (specialty, symptom, occurrence_count, updated_at)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&r.specialty)
                .bind(&r.symptom)
                .bind(r.occurrence_count)
                .bind(written_at)
                .execute(&mut **tx)
                .await?;
            }
            Ok(rows.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_match_reporting_schema() {
        assert_eq!(ReportTable::AppointmentsPerDoctor.name(), "appointments_per_doctor");
        assert_eq!(ReportTable::AppointmentsOverTime.to_string(), "appointments_over_time");
        assert_eq!(ReportTable::SymptomsBySpecialty.name(), "symptoms_by_specialty");
    }

    #[test]
    fn batch_knows_its_table() {
        let batch = ReportBatch::AppointmentsOverTime(vec![AppointmentsOverTime {
            period: "2024-01-01".into(),
            appointment_count: 3,
        }]);
        assert_eq!(batch.table(), ReportTable::AppointmentsOverTime);
        assert_eq!(batch.len(), 1);
        assert!(ReportBatch::SymptomsBySpecialty(vec![]).is_empty());
    }

    #[test]
    fn table_serializes_as_its_name() {
        let json = serde_json::to_string(&ReportTable::SymptomsBySpecialty).unwrap();
        assert_eq!(json, "\"symptoms_by_specialty\"");
    }
}
