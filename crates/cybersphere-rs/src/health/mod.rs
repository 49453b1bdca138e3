use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    config::{AppConfig, ServiceEndpoint},
    models::{ComponentHealth, HealthStatus},
};

const SYSTEM_NAME: &str = "CyberSphere-RS";

/// Probes every enabled sibling service plus the local datastore.
/// Components are independent: one bad dependency never blocks the rest.
pub struct HealthAggregator {
    config: Arc<AppConfig>,
    pool: SqlitePool,
    http: reqwest::Client,
}

impl HealthAggregator {
    pub fn new(config: Arc<AppConfig>, pool: SqlitePool) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { config, pool, http })
    }

    pub async fn check(&self) -> Value {
        let probes = self
            .config
            .services
            .iter()
            .filter(|(_, service)| service.enabled)
            .map(|(name, service)| self.probe_service(name, service));
        let results = join_all(probes).await;

        let mut components: BTreeMap<String, ComponentHealth> = results.into_iter().collect();
        components.insert("database".to_string(), self.probe_database().await);

        // Top-level status is static; per-component records carry the
        // actual outcomes.
        json!({
            "timestamp": Utc::now().to_rfc3339(),
            "system": SYSTEM_NAME,
            "status": "healthy",
            "components": components,
        })
    }

    async fn probe_service(
        &self,
        name: &str,
        service: &ServiceEndpoint,
    ) -> (String, ComponentHealth) {
        let url = format!("http://{}:{}/health", service.host, service.port);
        let started = Instant::now();

        let record = match self.http.get(&url).send().await {
            Ok(response) => ComponentHealth {
                status: if response.status() == reqwest::StatusCode::OK {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Unhealthy
                },
                response_time: Some(started.elapsed().as_secs_f64()),
                error: None,
            },
            Err(e) => ComponentHealth {
                status: HealthStatus::Unhealthy,
                response_time: None,
                error: Some(e.to_string()),
            },
        };
        (name.to_string(), record)
    }

    async fn probe_database(&self) -> ComponentHealth {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => ComponentHealth {
                status: HealthStatus::Healthy,
                response_time: None,
                error: None,
            },
            Err(e) => ComponentHealth {
                status: HealthStatus::Unhealthy,
                response_time: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::collections::BTreeMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn spawn_health_endpoint() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should work");
        let port = listener.local_addr().expect("addr should work").port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    )
                    .await;
            }
        });
        port
    }

    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should work");
        let port = listener.local_addr().expect("addr should work").port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn one_bad_service_never_blocks_the_rest() {
        let up_port = spawn_health_endpoint().await;
        let down_port = closed_port().await;

        let mut services = BTreeMap::new();
        services.insert(
            "up_service".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: up_port,
                enabled: true,
            },
        );
        services.insert(
            "down_service".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: down_port,
                enabled: true,
            },
        );
        services.insert(
            "disabled_service".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: down_port,
                enabled: false,
            },
        );
        let mut config = AppConfig::default();
        config.services = services;

        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("pool should work");
        let aggregator =
            HealthAggregator::new(Arc::new(config), pool).expect("aggregator should build");
        let report = aggregator.check().await;

        let components = report["components"].as_object().expect("components object");
        assert!(components.get("disabled_service").is_none());

        let up = &components["up_service"];
        assert_eq!(up["status"], "healthy");
        assert!(up["response_time"].as_f64().expect("latency") >= 0.0);

        let down = &components["down_service"];
        assert_eq!(down["status"], "unhealthy");
        assert!(!down["error"].as_str().expect("error string").is_empty());
    }

    #[tokio::test]
    async fn top_level_status_stays_healthy_regardless_of_components() {
        let down_port = closed_port().await;
        let mut config = AppConfig::default();
        config.services = BTreeMap::new();
        config.services.insert(
            "down_service".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: down_port,
                enabled: true,
            },
        );

        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("pool should work");
        let aggregator =
            HealthAggregator::new(Arc::new(config), pool).expect("aggregator should build");
        let report = aggregator.check().await;

        assert_eq!(report["status"], "healthy");
        assert_eq!(report["system"], SYSTEM_NAME);
        assert_eq!(
            report["components"]["down_service"]["status"],
            "unhealthy"
        );
    }

    #[tokio::test]
    async fn database_component_reports_liveness() {
        let mut config = AppConfig::default();
        config.services = BTreeMap::new();

        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("pool should work");
        let aggregator =
            HealthAggregator::new(Arc::new(config), pool).expect("aggregator should build");
        let report = aggregator.check().await;

        assert_eq!(report["components"]["database"]["status"], "healthy");
    }
}
