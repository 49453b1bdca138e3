use std::{collections::BTreeMap, sync::Arc, time::Duration};

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;
use tracing::{error, warn};

use crate::config::AppConfig;

const SENDER_NAME: &str = "CyberSphere-RS";

/// Multi-channel notification fan-out. Each channel call is independent;
/// a failure in one never affects the others, and a missing configuration
/// is a warned false, never a fault.
pub struct Notifier {
    config: Arc<AppConfig>,
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { config, http })
    }

    /// Channels default to whichever are enabled in configuration.
    pub async fn send(
        &self,
        message: &str,
        channels: Option<Vec<String>>,
    ) -> BTreeMap<String, bool> {
        let channels = channels.unwrap_or_else(|| self.enabled_channels());

        let mut results = BTreeMap::new();
        for channel in channels {
            let sent = match channel.as_str() {
                "discord" => self.send_discord(message).await,
                "telegram" => self.send_telegram(message).await,
                "email" => {
                    self.send_email(&format!("{SENDER_NAME} Notification"), message)
                        .await
                }
                other => {
                    warn!(channel = other, "unknown notification channel");
                    false
                }
            };
            results.insert(channel, sent);
        }
        results
    }

    fn enabled_channels(&self) -> Vec<String> {
        let cfg = &self.config.notifications;
        let mut channels = Vec::new();
        if cfg.discord.enabled {
            channels.push("discord".to_string());
        }
        if cfg.telegram.enabled {
            channels.push("telegram".to_string());
        }
        if cfg.email.enabled {
            channels.push("email".to_string());
        }
        channels
    }

    async fn send_discord(&self, message: &str) -> bool {
        let Some(webhook_url) = self.config.notifications.discord.webhook_url.as_deref() else {
            warn!("Discord webhook URL not configured");
            return false;
        };

        let payload = json!({ "content": message, "username": SENDER_NAME });
        match self.http.post(webhook_url).json(&payload).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::NO_CONTENT,
            Err(e) => {
                error!(error = %e, "failed to send Discord notification");
                false
            }
        }
    }

    async fn send_telegram(&self, message: &str) -> bool {
        let cfg = &self.config.notifications.telegram;
        let (Some(bot_token), Some(chat_id)) = (cfg.bot_token.as_deref(), cfg.chat_id.as_deref())
        else {
            warn!("Telegram bot token or chat ID not configured");
            return false;
        };

        let url = format!("https://api.telegram.org/bot{bot_token}/sendMessage");
        let payload = json!({ "chat_id": chat_id, "text": message });
        match self.http.post(url).json(&payload).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                error!(error = %e, "failed to send Telegram notification");
                false
            }
        }
    }

    async fn send_email(&self, subject: &str, body: &str) -> bool {
        match self.deliver_email(subject, body).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to send email notification");
                false
            }
        }
    }

    async fn deliver_email(&self, subject: &str, body: &str) -> anyhow::Result<()> {
        let cfg = &self.config.notifications.email;
        if !cfg.enabled {
            warn!("email notifications not enabled");
            anyhow::bail!("email notifications not enabled");
        }
        let (Some(server), Some(username), Some(password)) = (
            cfg.smtp_server.as_deref(),
            cfg.username.as_deref(),
            cfg.password.as_deref(),
        ) else {
            anyhow::bail!("email SMTP settings not configured");
        };

        let from: Mailbox = username.parse()?;
        let to: Mailbox = cfg.recipient.as_deref().unwrap_or(username).parse()?;
        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body.to_string())?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)?
            .port(cfg.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        transport.send(email).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(config: AppConfig) -> Notifier {
        Notifier::new(Arc::new(config)).expect("notifier should build")
    }

    #[tokio::test]
    async fn default_channel_set_is_empty_when_nothing_is_enabled() {
        let results = notifier(AppConfig::default()).send("hello", None).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn unknown_channel_reports_false() {
        let results = notifier(AppConfig::default())
            .send("hello", Some(vec!["pager".to_string()]))
            .await;
        assert_eq!(results.get("pager"), Some(&false));
    }

    #[tokio::test]
    async fn unconfigured_channels_report_false_without_failing() {
        let results = notifier(AppConfig::default())
            .send(
                "hello",
                Some(vec![
                    "discord".to_string(),
                    "telegram".to_string(),
                    "email".to_string(),
                ]),
            )
            .await;
        assert_eq!(results.get("discord"), Some(&false));
        assert_eq!(results.get("telegram"), Some(&false));
        assert_eq!(results.get("email"), Some(&false));
    }

    #[tokio::test]
    async fn enabled_channels_drive_the_default_set() {
        let mut config = AppConfig::default();
        config.notifications.telegram.enabled = true;
        // No token or chat configured: the channel is attempted and fails.
        let results = notifier(config).send("hello", None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results.get("telegram"), Some(&false));
    }
}
