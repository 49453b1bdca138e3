use std::{collections::BTreeMap, env, fs};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub probe_timeout_ms: u64,
    pub scan_concurrency: usize,
    pub services: BTreeMap<String, ServiceEndpoint>,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub discord: DiscordConfig,
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
}

impl AppConfig {
    /// Missing or unparsable config files degrade to defaults; boot must
    /// never fail because of configuration.
    pub fn load() -> Self {
        let path = env::var("CYBERSPHERE_CONFIG").unwrap_or_else(|_| "config.json".to_string());
        let mut cfg = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(error = %e, path, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Ok(v) = env::var("CS_HOST") {
            cfg.host = v;
        }
        if let Ok(v) = env::var("CS_PORT") {
            cfg.port = v.parse().unwrap_or(cfg.port);
        }
        if let Ok(v) = env::var("CS_DATABASE_URL") {
            cfg.database_url = v;
        }

        cfg
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut services = BTreeMap::new();
        services.insert(
            "node_events".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: 3000,
                enabled: true,
            },
        );
        services.insert(
            "java_service".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: 8081,
                enabled: true,
            },
        );
        services.insert(
            "go_microservice".to_string(),
            ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: 8082,
                enabled: true,
            },
        );

        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite://cybersphere.db".to_string(),
            probe_timeout_ms: 100,
            scan_concurrency: 64,
            services,
            notifications: NotificationsConfig::default(),
        }
    }
}
