use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub upstream_base_url: String,
    pub appointments_endpoint: String,
    pub patients_endpoint: String,
    /// `None` disables the timer; runs are then manual only.
    pub aggregation_interval: Option<Duration>,
    pub http_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("missing required environment variable {key}"))
        };
        let positive_secs = |key: &str| {
            get(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        };

        let database_url = required("DATABASE_URL")?;
        let upstream_base_url = required("UPSTREAM_BASE_URL")?;
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let appointments_endpoint =
            get("APPOINTMENTS_ENDPOINT").unwrap_or_else(|| "/api/appointments".to_string());
        let patients_endpoint =
            get("PATIENTS_ENDPOINT").unwrap_or_else(|| "/api/patients".to_string());
        let db_max_connections = get("DB_MAX_CONNECTIONS")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            upstream_base_url,
            appointments_endpoint,
            patients_endpoint,
            aggregation_interval: positive_secs("AGGREGATION_INTERVAL_SECS"),
            http_timeout: positive_secs("HTTP_TIMEOUT_SECS"),
        })
    }
}
