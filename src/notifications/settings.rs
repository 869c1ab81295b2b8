use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

// ============================================================================
// Notification Settings - read through a provider on every send
// ============================================================================

/// Operator-editable notification settings.
///
/// Missing transport fields disable sending; they are not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub admin_email: Option<String>,
    pub store_name: String,
    pub storefront_url: String,
    pub notify_order_confirmation: bool,
    pub notify_welcome: bool,
    pub notify_shipping: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            from_name: None,
            from_email: None,
            admin_email: None,
            store_name: "Our Store".to_string(),
            storefront_url: "http://localhost:3000".to_string(),
            notify_order_confirmation: true,
            notify_welcome: true,
            notify_shipping: true,
        }
    }
}

/// Complete SMTP configuration, only available when every field is set
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
}

pub const DEFAULT_SMTP_PORT: u16 = 587;

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl NotificationSettings {
    /// SMTP settings if sending is enabled and the configuration is complete
    pub fn smtp(&self) -> Option<SmtpSettings> {
        if !self.enabled {
            return None;
        }

        let from_email = present(&self.from_email)?;
        Some(SmtpSettings {
            host: present(&self.smtp_host)?,
            port: self.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
            user: present(&self.smtp_user)?,
            password: present(&self.smtp_password)?,
            from_name: present(&self.from_name).unwrap_or_else(|| self.store_name.clone()),
            from_email,
        })
    }

    pub fn admin_address(&self) -> Option<String> {
        present(&self.admin_email)
    }

    /// Storefront page where customers follow their orders and refunds
    pub fn account_url(&self) -> String {
        format!("{}/account", self.storefront_url.trim_end_matches('/'))
    }
}

#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Fetch the current settings. Called once per send so edits apply
    /// without a restart.
    async fn load(&self) -> anyhow::Result<NotificationSettings>;
}

/// Settings held in memory; `replace` swaps them at runtime
#[derive(Default)]
pub struct StaticSettings {
    settings: RwLock<NotificationSettings>,
}

impl StaticSettings {
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub async fn replace(&self, settings: NotificationSettings) {
        *self.settings.write().await = settings;
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn load(&self) -> anyhow::Result<NotificationSettings> {
        Ok(self.settings.read().await.clone())
    }
}

/// Settings stored as a JSON file, re-read on every call.
/// A missing file yields the defaults, which leave sending disabled.
pub struct JsonFileSettings {
    path: PathBuf,
    storefront_url: Option<String>,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storefront_url: None,
        }
    }

    /// Storefront URL used when the file does not set `storefrontUrl`
    pub fn with_storefront_url(mut self, url: impl Into<String>) -> Self {
        self.storefront_url = Some(url.into());
        self
    }

    fn apply_fallbacks(&self, settings: &mut NotificationSettings) {
        if let Some(url) = &self.storefront_url {
            settings.storefront_url = url.clone();
        }
    }
}

#[async_trait]
impl SettingsProvider for JsonFileSettings {
    async fn load(&self) -> anyhow::Result<NotificationSettings> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
                let mut settings = NotificationSettings::default();
                self.apply_fallbacks(&mut settings);
                return Ok(settings);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid settings in {}", self.path.display()))?;
        let has_storefront_url = value
            .get("storefrontUrl")
            .and_then(|url| url.as_str())
            .is_some_and(|url| !url.trim().is_empty());

        let mut settings: NotificationSettings = serde_json::from_value(value)
            .with_context(|| format!("invalid settings in {}", self.path.display()))?;
        if !has_storefront_url {
            self.apply_fallbacks(&mut settings);
        }

        Ok(settings)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn complete_settings() -> NotificationSettings {
        NotificationSettings {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: Some(587),
            smtp_user: Some("mailer".to_string()),
            smtp_password: Some("secret".to_string()),
            from_name: Some("Driftwood & Bloom".to_string()),
            from_email: Some("orders@example.com".to_string()),
            admin_email: Some("owner@example.com".to_string()),
            store_name: "Driftwood & Bloom".to_string(),
            storefront_url: "https://shop.example.com/".to_string(),
            ..NotificationSettings::default()
        }
    }

    #[test]
    fn test_complete_settings_yield_smtp() {
        let smtp = complete_settings().smtp().unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
    }

    #[test]
    fn test_incomplete_or_disabled_settings_yield_none() {
        assert!(NotificationSettings::default().smtp().is_none());

        let mut no_password = complete_settings();
        no_password.smtp_password = Some("  ".to_string());
        assert!(no_password.smtp().is_none());

        let mut disabled = complete_settings();
        disabled.enabled = false;
        assert!(disabled.smtp().is_none());
    }

    #[test]
    fn test_account_url_trims_trailing_slash() {
        assert_eq!(complete_settings().account_url(), "https://shop.example.com/account");
    }

    #[tokio::test]
    async fn test_json_file_is_reloaded_on_every_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let provider = JsonFileSettings::new(&path);

        assert_eq!(provider.load().await.unwrap(), NotificationSettings::default());

        std::fs::write(&path, r#"{"smtpHost": "smtp.one.test", "notifyShipping": false}"#).unwrap();
        let first = provider.load().await.unwrap();
        assert_eq!(first.smtp_host.as_deref(), Some("smtp.one.test"));
        assert!(!first.notify_shipping);
        assert!(first.notify_welcome);

        std::fs::write(&path, r#"{"smtpHost": "smtp.two.test"}"#).unwrap();
        let second = provider.load().await.unwrap();
        assert_eq!(second.smtp_host.as_deref(), Some("smtp.two.test"));
    }

    #[tokio::test]
    async fn test_json_file_without_storefront_url_uses_configured_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let provider = JsonFileSettings::new(&path).with_storefront_url("https://shop.example.com/");

        let missing_file = provider.load().await.unwrap();
        assert_eq!(missing_file.account_url(), "https://shop.example.com/account");

        std::fs::write(&path, r#"{"smtpHost": "smtp.one.test", "storefrontUrl": " "}"#).unwrap();
        let no_url = provider.load().await.unwrap();
        assert_eq!(no_url.account_url(), "https://shop.example.com/account");

        std::fs::write(&path, r#"{"storefrontUrl": "https://other.example.com"}"#).unwrap();
        let own_url = provider.load().await.unwrap();
        assert_eq!(own_url.account_url(), "https://other.example.com/account");
    }
}
