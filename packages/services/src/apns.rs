//! Push notifications through APNS.

use std::time::Duration;

use reqwest::Client;
use scribe_core::{CapabilityFuture, Notification, Notifier, StageError};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ApnsConfig;
use crate::error::{Result, ServiceError, check_status};

#[derive(Debug, Serialize, PartialEq)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Aps {
    pub alert: Alert,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    pub sound: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl From<&Notification> for ApnsPayload {
    fn from(notification: &Notification) -> Self {
        let (badge, subtitle) = match notification {
            Notification::ArticleReady { .. } => (Some(1), None),
            Notification::ArticleFailed { reason, .. } => (None, Some(reason.clone())),
        };

        ApnsPayload {
            aps: Aps {
                alert: Alert {
                    title: notification.headline().to_string(),
                    body: notification.body(),
                    subtitle,
                },
                badge,
                sound: "default",
            },
        }
    }
}

pub struct ApnsNotifier {
    client: Client,
    config: ApnsConfig,
}

impl ApnsNotifier {
    pub fn new(config: ApnsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .http2_prior_knowledge()
            .build()?;
        Ok(Self { client, config })
    }

    /// Send `notification`. Without a token and a device token this does nothing.
    pub async fn send(&self, notification: &Notification) -> Result<()> {
        let (Some(token), Some(device_token)) = (
            self.config.token.as_deref(),
            self.config.device_token.as_deref(),
        ) else {
            debug!("APNS not configured, skipping push notification");
            return Ok(());
        };

        let url = format!("{}/3/device/{}", self.config.endpoint(), device_token);
        let payload = ApnsPayload::from(notification);

        let response = self
            .client
            .post(&url)
            .header("apns-topic", &self.config.bundle_id)
            .header("apns-push-type", "alert")
            .header("apns-priority", "10")
            .header("apns-expiration", "0")
            .header("authorization", format!("bearer {token}"))
            .json(&payload)
            .send()
            .await?;

        check_status("apns", response).await?;
        info!(article_id = %notification.article_id(), "Sent push notification");
        Ok(())
    }
}

impl Notifier for ApnsNotifier {
    fn notify(&self, notification: Notification) -> CapabilityFuture<'_, ()> {
        Box::pin(async move { self.send(&notification).await.map_err(notification_error) })
    }
}

/// Undelivered notifications are logged by the caller.
fn notification_error(e: ServiceError) -> StageError {
    StageError::Notification(e.to_string())
}

#[cfg(test)]
mod tests {
    use scribe_core::ArticleId;
    use serde_json::json;

    use super::*;

    #[test]
    fn ready_payload() {
        let n = Notification::ArticleReady {
            article_id: ArticleId::new(),
            title: "Rust 2024".into(),
        };
        let value = serde_json::to_value(ApnsPayload::from(&n)).unwrap();
        assert_eq!(
            value,
            json!({
                "aps": {
                    "alert": {
                        "title": "Article Ready!",
                        "body": "Your article 'Rust 2024' is ready to read"
                    },
                    "badge": 1,
                    "sound": "default"
                }
            })
        );
    }

    #[test]
    fn failed_payload_carries_reason() {
        let n = Notification::ArticleFailed {
            article_id: ArticleId::new(),
            reason: "Failed to summarize".into(),
        };
        let value = serde_json::to_value(ApnsPayload::from(&n)).unwrap();
        assert_eq!(
            value,
            json!({
                "aps": {
                    "alert": {
                        "title": "Article Processing Failed",
                        "body": "There was an error processing your article",
                        "subtitle": "Failed to summarize"
                    },
                    "sound": "default"
                }
            })
        );
    }

    #[tokio::test]
    async fn unconfigured_notifier_is_a_no_op() {
        let notifier = ApnsNotifier::new(ApnsConfig {
            token: Some("jwt".into()),
            ..Default::default()
        })
        .unwrap();
        let n = Notification::ArticleFailed {
            article_id: ArticleId::new(),
            reason: "x".into(),
        };
        notifier.notify(n).await.unwrap();
    }

    #[test]
    fn rejected_push_becomes_notification_error() {
        let err = notification_error(ServiceError::Api {
            service: "apns",
            status: 403,
            body: "ExpiredProviderToken".into(),
        });
        match err {
            StageError::Notification(message) => {
                assert_eq!(message, "apns API error: 403 - ExpiredProviderToken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
