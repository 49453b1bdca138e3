use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskExecution,
    TaskResult,
    TaskError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskExecution => "task_execution",
            EventKind::TaskResult => "task_result",
            EventKind::TaskError => "task_error",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub source: String,
    pub data: String,
    pub timestamp: DateTime<Utc>,
}

/// Uniform success-or-error shape returned by every core operation.
/// Serializes either as the success payload or as `{"error": "..."}`,
/// never both.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum TaskResult {
    Err { error: String },
    Ok(Value),
}

impl TaskResult {
    pub fn ok(payload: Value) -> Self {
        TaskResult::Ok(payload)
    }

    pub fn err(message: impl Into<String>) -> Self {
        TaskResult::Err {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TaskResult::Err { .. })
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Info,
    Medium,
    High,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Vulnerability {
    OpenPort {
        port: u16,
        service: String,
        risk: Risk,
        description: String,
    },
    MissingSecurityHeaders {
        risk: Risk,
        description: String,
        headers: Vec<String>,
    },
    UnauthenticatedAccess {
        risk: Risk,
        description: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_serializes_with_only_the_error_key() {
        let result = TaskResult::err("Unknown task: frobnicate");
        let json = serde_json::to_value(&result).expect("serialization should work");
        let obj = json.as_object().expect("envelope should be an object");
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["error"], "Unknown task: frobnicate");
    }

    #[test]
    fn vulnerability_serializes_with_type_tag() {
        let vuln = Vulnerability::OpenPort {
            port: 23,
            service: "Telnet".to_string(),
            risk: Risk::Medium,
            description: "Telnet service running on port 23".to_string(),
        };
        let json = serde_json::to_value(&vuln).expect("serialization should work");
        assert_eq!(json["type"], "open_port");
        assert_eq!(json["risk"], "medium");
        assert_eq!(json["port"], 23);
    }

    #[test]
    fn component_health_omits_absent_fields() {
        let record = ComponentHealth {
            status: HealthStatus::Healthy,
            response_time: None,
            error: None,
        };
        let json = serde_json::to_value(&record).expect("serialization should work");
        let obj = json.as_object().expect("record should be an object");
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["status"], "healthy");
    }
}
