//! Outbound notifications.
//!
//! Flows hand a recipient, subject, plain-text content and a small map of
//! template values to a [`NotificationDispatcher`]. The configured dispatcher
//! is wrapped in a [`BackgroundDispatcher`], so delivery runs on its own task
//! and a request never waits on the mail server. Failures are logged, never
//! returned to the client.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info, instrument, warn};

use playhub_config::EmailConfig;

/// Values substituted into a notification template.
///
/// `action_url` and `action_label`, when present, render as a button.
pub type TemplateData = BTreeMap<String, String>;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
        template_data: &TemplateData,
    ) -> anyhow::Result<()>;
}

/// Picks the SMTP dispatcher when SMTP is enabled, otherwise the log dispatcher,
/// and moves delivery off the request path.
pub fn dispatcher_from_config(config: &EmailConfig) -> Arc<dyn NotificationDispatcher> {
    let inner: Arc<dyn NotificationDispatcher> = if config.enabled {
        Arc::new(SmtpNotifier::new(config.clone()))
    } else {
        Arc::new(LogNotifier)
    };
    Arc::new(BackgroundDispatcher::new(inner))
}

/// Hands each notification to a spawned task and returns at once.
pub struct BackgroundDispatcher {
    inner: Arc<dyn NotificationDispatcher>,
}

impl BackgroundDispatcher {
    pub fn new(inner: Arc<dyn NotificationDispatcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl NotificationDispatcher for BackgroundDispatcher {
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
        template_data: &TemplateData,
    ) -> anyhow::Result<()> {
        let inner = Arc::clone(&self.inner);
        let recipient = recipient.to_string();
        let subject = subject.to_string();
        let content = content.to_string();
        let template_data = template_data.clone();

        tokio::spawn(async move {
            if let Err(e) = inner
                .send_notification(&recipient, &subject, &content, &template_data)
                .await
            {
                warn!(recipient = %recipient, subject = %subject, error = %e, "Notification delivery failed");
            }
        });

        Ok(())
    }
}

pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
        template_data: &TemplateData,
    ) -> anyhow::Result<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let html_body = render_html(&self.config.from_name, subject, content, template_data);

        Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from email: {}", e))?)
            .to(recipient
                .parse()
                .map_err(|e| anyhow!("Invalid recipient email: {}", e))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(content.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .context("Failed to build email")
    }

    fn transport(&self) -> anyhow::Result<SmtpTransport> {
        if self.config.smtp_username.is_empty() {
            return Ok(SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        Ok(SmtpTransport::relay(&self.config.smtp_host)
            .context("Failed to create SMTP relay")?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }
}

#[async_trait]
impl NotificationDispatcher for SmtpNotifier {
    #[instrument(skip(self, content, template_data))]
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
        template_data: &TemplateData,
    ) -> anyhow::Result<()> {
        let email = self.build_message(recipient, subject, content, template_data)?;
        let mailer = self.transport()?;

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .context("Task join error")?
            .context("Failed to send email")?;

        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
        _template_data: &TemplateData,
    ) -> anyhow::Result<()> {
        info!(recipient = %recipient, subject = %subject, "Notification not delivered (SMTP disabled)");
        debug!(recipient = %recipient, content = %content, "Notification content");
        Ok(())
    }
}

fn render_html(brand: &str, subject: &str, content: &str, template_data: &TemplateData) -> String {
    let paragraphs: String = content
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            format!(
                r#"<p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">{}</p>"#,
                escape(p).replace('\n', "<br>")
            )
        })
        .collect();

    let action = match (
        template_data.get("action_url"),
        template_data.get("action_label"),
    ) {
        (Some(url), Some(label)) => format!(
            r#"<p style="margin: 30px 0; text-align: center;"><a href="{}" style="display: inline-block; padding: 14px 40px; background-color: #7C3AED; color: #ffffff; text-decoration: none; border-radius: 6px; font-size: 16px; font-weight: bold;">{}</a></p>"#,
            escape(url),
            escape(label)
        ),
        _ => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{subject}</title>
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="600" align="center" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px;">
        <tr>
            <td style="background-color: #7C3AED; padding: 30px; text-align: center;">
                <h1 style="margin: 0; color: #ffffff; font-size: 28px;">{brand}</h1>
            </td>
        </tr>
        <tr>
            <td style="padding: 40px 30px;">
                <h2 style="margin: 0 0 20px 0; color: #333333; font-size: 24px;">{subject}</h2>
                {paragraphs}
                {action}
            </td>
        </tr>
        <tr>
            <td style="background-color: #f8f9fa; padding: 20px 30px; text-align: center;">
                <p style="margin: 0; color: #999999; font-size: 12px;">This is an automated email from {brand}. Please do not reply.</p>
            </td>
        </tr>
    </table>
</body>
</html>"#,
        subject = escape(subject),
        brand = escape(brand),
        paragraphs = paragraphs,
        action = action,
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{FailingNotifier, RecordingNotifier};

    #[test]
    fn test_render_includes_action_button() {
        let mut data = TemplateData::new();
        data.insert(
            "action_url".to_string(),
            "https://playhub.gg/reset-password?token=abc&email=a%40b.com".to_string(),
        );
        data.insert("action_label".to_string(), "Reset Password".to_string());

        let html = render_html("PlayHub", "Password Reset Request", "Hi Sam,\n\nReset below.", &data);
        assert!(html.contains("token=abc&amp;email=a%40b.com"));
        assert!(html.contains("Reset Password</a>"));
        assert!(html.contains("Hi Sam,"));
    }

    #[test]
    fn test_render_escapes_content() {
        let html = render_html("PlayHub", "Hello", "<script>alert(1)</script>", &TemplateData::new());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_smtp_message_rejects_bad_recipient() {
        let notifier = SmtpNotifier::new(EmailConfig::default());
        let result = notifier.build_message("not an address", "Subject", "Body", &TemplateData::new());
        assert!(result.is_err());
    }

    struct StalledNotifier;

    #[async_trait]
    impl NotificationDispatcher for StalledNotifier {
        async fn send_notification(
            &self,
            _recipient: &str,
            _subject: &str,
            _content: &str,
            _template_data: &TemplateData,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_background_dispatch_does_not_wait_for_delivery() {
        let dispatcher = BackgroundDispatcher::new(Arc::new(StalledNotifier));

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            dispatcher.send_notification("player@example.com", "Hi", "Body", &TemplateData::new()),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_background_dispatch_delivers() {
        let recorder = Arc::new(RecordingNotifier::default());
        let dispatcher = BackgroundDispatcher::new(recorder.clone());
        let mut data = TemplateData::new();
        data.insert("token".to_string(), "abc".to_string());

        dispatcher
            .send_notification("player@example.com", "Hi", "Body", &data)
            .await
            .unwrap();
        for _ in 0..10 {
            if !recorder.sent().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        let sent = recorder.last().unwrap();
        assert_eq!(sent.recipient, "player@example.com");
        assert_eq!(sent.template_data["token"], "abc");
    }

    #[tokio::test]
    async fn test_background_dispatch_swallows_failures() {
        let dispatcher = BackgroundDispatcher::new(Arc::new(FailingNotifier));
        let result = dispatcher
            .send_notification("player@example.com", "Hi", "Body", &TemplateData::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let result = LogNotifier
            .send_notification("player@example.com", "Hi", "Body", &TemplateData::new())
            .await;
        assert!(result.is_ok());
    }
}
