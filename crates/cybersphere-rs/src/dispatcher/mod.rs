use std::{str::FromStr, sync::Arc};

use serde_json::Value;
use tracing::{error, info};

use crate::{
    analysis, automation,
    config::AppConfig,
    events::EventLog,
    models::{EventKind, TaskResult},
    parser,
    scanner::SecurityScanner,
};

const SOURCE: &str = "task_dispatcher";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    AiProcess,
    SecurityScan,
    DataParse,
    WebAutomation,
}

impl FromStr for TaskKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai_process" => Ok(TaskKind::AiProcess),
            "security_scan" => Ok(TaskKind::SecurityScan),
            "data_parse" => Ok(TaskKind::DataParse),
            "web_automation" => Ok(TaskKind::WebAutomation),
            _ => Err(()),
        }
    }
}

/// Single entry point for every task family. Faults never escape: each
/// failure becomes a normal error envelope, and the audit writes around
/// dispatch are best-effort.
pub struct TaskDispatcher {
    config: Arc<AppConfig>,
    events: EventLog,
    scanner: Arc<SecurityScanner>,
    http: reqwest::Client,
}

impl TaskDispatcher {
    pub fn new(
        config: Arc<AppConfig>,
        events: EventLog,
        scanner: Arc<SecurityScanner>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            config,
            events,
            scanner,
            http,
        })
    }

    pub async fn execute(&self, task_name: &str, params: &Value) -> TaskResult {
        info!(task = task_name, "executing task");
        self.events
            .append(
                EventKind::TaskExecution,
                SOURCE,
                &format!("Executing task: {task_name}"),
            )
            .await;

        let result = match task_name.parse::<TaskKind>() {
            Ok(TaskKind::AiProcess) => self.run_ai_task(params),
            Ok(TaskKind::SecurityScan) => self.run_security_task(params).await,
            Ok(TaskKind::DataParse) => self.run_parsing_task(params),
            Ok(TaskKind::WebAutomation) => {
                automation::forward(&self.http, &self.config, params).await
            }
            Err(()) => TaskResult::err(format!("Unknown task: {task_name}")),
        };

        let payload = serde_json::to_string(&result).unwrap_or_default();
        if result.is_error() {
            error!(task = task_name, result = %payload, "task failed");
            self.events
                .append(
                    EventKind::TaskError,
                    SOURCE,
                    &format!("Task {task_name} failed: {payload}"),
                )
                .await;
        } else {
            self.events
                .append(
                    EventKind::TaskResult,
                    SOURCE,
                    &format!("Task {task_name} completed: {payload}"),
                )
                .await;
        }

        result
    }

    fn run_ai_task(&self, params: &Value) -> TaskResult {
        let data = params
            .get("data")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let operation = str_param(params, "operation", "process");

        let outcome = match operation {
            "process" => analysis::process_data(&data),
            "anomaly_detect" => analysis::detect_anomalies(&data),
            "predict_trends" => analysis::predict_trends(&data),
            other => return TaskResult::err(format!("Unknown AI operation: {other}")),
        };

        match outcome {
            Ok(payload) => TaskResult::ok(payload),
            Err(e) => TaskResult::err(format!("AI task execution failed: {e}")),
        }
    }

    async fn run_security_task(&self, params: &Value) -> TaskResult {
        let target = str_param(params, "target", "localhost");
        let scan_type = str_param(params, "scan_type", "basic");

        match scan_type {
            "port_scan" => {
                let range = str_param(params, "port_range", "1-1000");
                self.scanner.scan_ports(target, range).await
            }
            "vulnerability_scan" => self.scanner.scan_vulnerabilities(target).await,
            "full_scan" => self.scanner.full_scan(target).await,
            other => TaskResult::err(format!("Unknown scan type: {other}")),
        }
    }

    fn run_parsing_task(&self, params: &Value) -> TaskResult {
        let data = str_param(params, "data", "");
        let format = str_param(params, "format", "json");

        match format {
            "json" => parser::parse_json(data),
            "yaml" => parser::parse_yaml(data),
            "csv" => parser::parse_csv(data),
            "xml" => parser::parse_xml(data),
            other => TaskResult::err(format!("Unknown format type: {other}")),
        }
    }
}

fn str_param<'a>(params: &'a Value, key: &str, default: &'a str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or(default)
}
