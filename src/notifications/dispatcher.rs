use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics::Metrics;
use super::event::{NotificationEvent, Toggle};
use super::settings::{NotificationSettings, SettingsProvider};
use super::templates::{render, Branding};
use super::transport::{MailTransport, NotificationError, OutgoingEmail, SEND_TIMEOUT};

// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Renders an event and attempts one delivery. Never returns an error and
// never retries: the outcome is reported to the caller, who has already
// persisted the state change that triggered the notification.
//
// ============================================================================

/// What happened to a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DispatchOutcome {
    Delivered,
    /// Sending is switched off or not configured; nothing was attempted
    Disabled { reason: String },
    Failed { error: String },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered => "delivered",
            DispatchOutcome::Disabled { .. } => "disabled",
            DispatchOutcome::Failed { .. } => "failed",
        }
    }

    fn disabled(reason: impl Into<String>) -> Self {
        DispatchOutcome::Disabled {
            reason: reason.into(),
        }
    }
}

enum Recipient<'a> {
    Address(&'a str),
    Operator,
}

pub struct NotificationDispatcher {
    settings: Arc<dyn SettingsProvider>,
    transport: Arc<dyn MailTransport>,
    metrics: Arc<Metrics>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        transport: Arc<dyn MailTransport>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            settings,
            transport,
            metrics,
            timeout: SEND_TIMEOUT,
        }
    }

    /// Override the per-attempt bound (tests)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `event` to a customer address
    pub async fn send(&self, event: &NotificationEvent, recipient: &str) -> DispatchOutcome {
        self.dispatch(event, Recipient::Address(recipient)).await
    }

    /// Send `event` to the operator contact address from the settings store
    pub async fn send_to_operator(&self, event: &NotificationEvent) -> DispatchOutcome {
        self.dispatch(event, Recipient::Operator).await
    }

    async fn dispatch(&self, event: &NotificationEvent, recipient: Recipient<'_>) -> DispatchOutcome {
        let kind = event.kind();
        let outcome = self.attempt(event, recipient).await;

        match &outcome {
            DispatchOutcome::Delivered => {
                tracing::info!(event = kind, "📧 Notification delivered");
            }
            DispatchOutcome::Disabled { reason } => {
                tracing::debug!(event = kind, reason = %reason, "Notification skipped");
            }
            DispatchOutcome::Failed { error } => {
                tracing::warn!(event = kind, error = %error, "Notification failed");
            }
        }

        self.metrics
            .notifications
            .with_label_values(&[kind, outcome.label()])
            .inc();

        outcome
    }

    async fn attempt(&self, event: &NotificationEvent, recipient: Recipient<'_>) -> DispatchOutcome {
        // Reload on every send so console edits apply immediately
        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(e) => {
                return DispatchOutcome::Failed {
                    error: format!("settings unavailable: {:#}", e),
                }
            }
        };

        let Some(smtp) = settings.smtp() else {
            return DispatchOutcome::disabled("email transport is disabled or not configured");
        };

        if let Some(toggle) = event.toggle() {
            if !toggle_enabled(&settings, toggle) {
                return DispatchOutcome::disabled(format!("{} emails are switched off", event.kind()));
            }
        }

        let to = match recipient {
            Recipient::Address(address) if !address.trim().is_empty() => address.trim().to_string(),
            Recipient::Address(_) => return DispatchOutcome::disabled("no recipient address"),
            Recipient::Operator => match settings.admin_address() {
                Some(address) => address,
                None => return DispatchOutcome::disabled("no operator address configured"),
            },
        };

        let branding = Branding {
            store_name: settings.store_name.clone(),
            account_url: settings.account_url(),
        };
        let message = render(event, &branding);
        let email = OutgoingEmail {
            to,
            subject: message.subject,
            html: message.html,
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.transport.deliver(&smtp, &email)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(self.timeout)),
        };

        self.metrics
            .notification_duration
            .with_label_values(&[event.kind()])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => DispatchOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

fn toggle_enabled(settings: &NotificationSettings, toggle: Toggle) -> bool {
    match toggle {
        Toggle::OrderConfirmation => settings.notify_order_confirmation,
        Toggle::Welcome => settings.notify_welcome,
        Toggle::Shipping => settings.notify_shipping,
    }
}

// ============================================================================
// Test doubles shared by lifecycle tests
// ============================================================================


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::notifications::event::WelcomeNotice;
    use crate::notifications::settings::tests::complete_settings;
    use crate::notifications::settings::{SmtpSettings, StaticSettings};
    use async_trait::async_trait;

    fn welcome() -> NotificationEvent {
        NotificationEvent::Welcome(WelcomeNotice {
            customer_name: "Jane".to_string(),
        })
    }

    #[tokio::test]
    async fn test_delivers_with_complete_settings() {
        let (dispatcher, transport) = working_dispatcher();
        let outcome = dispatcher.send(&welcome(), "jane@example.com").await;

        assert_eq!(outcome, DispatchOutcome::Delivered);
        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert_eq!(sent[0].subject, "Welcome to Driftwood & Bloom");
    }

    #[tokio::test]
    async fn test_incomplete_settings_are_disabled_not_failed() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(NotificationSettings::default(), transport.clone());

        let outcome = dispatcher.send(&welcome(), "jane@example.com").await;
        assert!(matches!(outcome, DispatchOutcome::Disabled { .. }));
        assert!(outcome.error().is_none());
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_switches_off_event_type() {
        let mut settings = complete_settings();
        settings.notify_welcome = false;
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(settings, transport.clone());

        let outcome = dispatcher.send(&welcome(), "jane@example.com").await;
        assert!(matches!(outcome, DispatchOutcome::Disabled { .. }));
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_once() {
        let transport = Arc::new(RecordingTransport::failing());
        let dispatcher = dispatcher_with(complete_settings(), transport);

        let outcome = dispatcher.send(&welcome(), "jane@example.com").await;
        assert_eq!(outcome.error(), Some("SMTP delivery failed: connection refused"));
    }

    #[tokio::test]
    async fn test_operator_address_comes_from_settings() {
        let (dispatcher, transport) = working_dispatcher();
        dispatcher.send_to_operator(&welcome()).await;
        assert_eq!(transport.sent().await[0].to, "owner@example.com");
    }

    #[tokio::test]
    async fn test_settings_are_reloaded_per_send() {
        let settings = Arc::new(StaticSettings::new(NotificationSettings::default()));
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = NotificationDispatcher::new(
            settings.clone(),
            transport.clone(),
            Arc::new(Metrics::new().unwrap()),
        );

        let first = dispatcher.send(&welcome(), "jane@example.com").await;
        assert!(matches!(first, DispatchOutcome::Disabled { .. }));

        settings.replace(complete_settings()).await;
        let second = dispatcher.send(&welcome(), "jane@example.com").await;
        assert_eq!(second, DispatchOutcome::Delivered);
    }

    struct HangingTransport;

    #[async_trait]
    impl MailTransport for HangingTransport {
        async fn deliver(
            &self,
            _smtp: &SmtpSettings,
            _email: &OutgoingEmail,
        ) -> Result<(), NotificationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_delivery_times_out() {
        let dispatcher = NotificationDispatcher::new(
            Arc::new(StaticSettings::new(complete_settings())),
            Arc::new(HangingTransport),
            Arc::new(Metrics::new().unwrap()),
        )
        .with_timeout(Duration::from_millis(50));

        let outcome = dispatcher.send(&welcome(), "jane@example.com").await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert!(outcome.error().unwrap().contains("timed out"));
    }
}
