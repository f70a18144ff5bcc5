/// Health check for the active store engine
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::store::KvStore;

/// How long the store may take to answer a health probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Overall health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub engine: String,
    pub checks: Vec<HealthCheck>,
}

/// Individual health check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub entries: Option<usize>,
    pub duration_ms: f64,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Check that the store answers a `len` call in time
pub async fn check_store_health(store: &Arc<dyn KvStore>) -> HealthCheck {
    let start = std::time::Instant::now();
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let (status, message, entries) =
        match tokio::time::timeout(PROBE_TIMEOUT, store.len(&cancel)).await {
            Ok(Ok(n)) => ("healthy", None, Some(n)),
            Ok(Err(e)) => ("unhealthy", Some(format!("Store check failed: {}", e)), None),
            Err(_) => (
                "unhealthy",
                Some(format!("Store did not answer within {:?}", PROBE_TIMEOUT)),
                None,
            ),
        };

    HealthCheck {
        name: "store".to_string(),
        status: status.to_string(),
        message,
        entries,
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Get overall health status
pub async fn get_health_status(store: &Arc<dyn KvStore>) -> HealthStatus {
    let checks = vec![check_store_health(store).await];
    let all_healthy = checks.iter().all(|c| c.status == "healthy");

    HealthStatus {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        engine: store.engine().to_string(),
        checks,
    }
}
