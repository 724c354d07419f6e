use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::sink::ReportTable;

/* -------------------------
   Pipeline errors
--------------------------*/

/// Terminal failures of a run. None of them are retried in-process.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {source}")]
    UpstreamFetch {
        url: String,
        #[source]
        source: FetchCause,
    },

    #[error("failed to replace table {table}: {source}")]
    SinkWrite {
        table: ReportTable,
        #[source]
        source: sqlx::Error,
    },

    #[error("an aggregation run is already in progress")]
    AlreadyRunning,

    #[error("aggregation run task failed: {0}")]
    RunTask(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchCause {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("response is not a valid record array: {0}")]
    Decode(#[from] serde_json::Error),
}

/* -------------------------
   HTTP surface
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

impl From<PipelineError> for ApiError {
    // Detail stays in the logs; callers only get a generic message.
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::AlreadyRunning => ApiError::Conflict(
                "RUN_IN_PROGRESS",
                "A data aggregation run is already in progress.".into(),
            ),
            _ => ApiError::Internal("Failed to run data aggregation process.".into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::to_error_response("INTERNAL", &msg),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_error_names_the_table() {
        let err = PipelineError::SinkWrite {
            table: ReportTable::AppointmentsOverTime,
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(err.to_string().contains("appointments_over_time"));
    }

    #[test]
    fn fetch_error_names_the_url() {
        let err = PipelineError::UpstreamFetch {
            url: "http://upstream/api/patients".into(),
            source: FetchCause::Status(reqwest::StatusCode::BAD_GATEWAY),
        };
        let msg = err.to_string();
        assert!(msg.contains("http://upstream/api/patients"));
        assert!(msg.contains("502"));
    }

    #[test]
    fn api_error_hides_pipeline_detail() {
        let err = PipelineError::UpstreamFetch {
            url: "http://10.0.0.7/internal".into(),
            source: FetchCause::Status(reqwest::StatusCode::NOT_FOUND),
        };
        match ApiError::from(err) {
            ApiError::Internal(msg) => assert!(!msg.contains("10.0.0.7")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            ApiError::from(PipelineError::AlreadyRunning),
            ApiError::Conflict("RUN_IN_PROGRESS", _)
        ));
    }

    #[test]
    fn status_codes() {
        let res = ApiError::Internal("x".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let res = ApiError::Conflict("C", "y".into()).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
