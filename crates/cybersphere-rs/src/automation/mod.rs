use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use crate::{config::AppConfig, models::TaskResult};

/// Forward a web-automation task to the sibling runner over one HTTP hop.
/// 30 second timeout, response JSON passed through verbatim, no retries.
pub async fn forward(client: &reqwest::Client, config: &AppConfig, params: &Value) -> TaskResult {
    match forward_inner(client, config, params).await {
        Ok(response) => TaskResult::ok(response),
        Err(e) => TaskResult::err(format!("Web automation task execution failed: {e}")),
    }
}

async fn forward_inner(
    client: &reqwest::Client,
    config: &AppConfig,
    params: &Value,
) -> anyhow::Result<Value> {
    let service = config
        .services
        .get("node_events")
        .context("web automation service not configured")?;
    let url = format!("http://{}:{}/automate", service.host, service.port);
    info!(url, "forwarding web automation task");

    let response = client
        .post(&url)
        .timeout(Duration::from_secs(30))
        .json(params)
        .send()
        .await?;
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn unreachable_runner_is_a_normal_error_result() {
        let mut config = AppConfig::default();
        // Bind then drop to get a port with no listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should work");
        let port = listener.local_addr().expect("addr should work").port();
        drop(listener);
        config.services.get_mut("node_events").expect("configured").port = port;

        let client = reqwest::Client::new();
        let result = forward(&client, &config, &json!({"action": "screenshot"})).await;
        assert!(result.is_error());
        let value = serde_json::to_value(&result).expect("serialization should work");
        let message = value["error"].as_str().expect("error string");
        assert!(message.starts_with("Web automation task execution failed: "));
    }

    #[tokio::test]
    async fn missing_service_config_is_a_normal_error_result() {
        let mut config = AppConfig::default();
        config.services.remove("node_events");

        let client = reqwest::Client::new();
        let result = forward(&client, &config, &json!({})).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn runner_response_is_passed_through_verbatim() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should work");
        let port = listener.local_addr().expect("addr should work").port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let body = r#"{"status": "done", "pages": 3}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        let mut config = AppConfig::default();
        config.services.get_mut("node_events").expect("configured").port = port;

        let client = reqwest::Client::new();
        let result = forward(&client, &config, &json!({"action": "crawl"})).await;
        let value = serde_json::to_value(&result).expect("serialization should work");
        assert_eq!(value, json!({"status": "done", "pages": 3}));
    }
}
