use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub realtime: RealtimeSettings,
    pub push: PushSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Origin of the HR backend, without a trailing slash.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    pub sse_path: String,
    /// Query parameter carrying the access token on the subscribe request.
    pub token_param: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PushSettings {
    pub default_title: String,
    pub default_icon: String,
    pub default_badge: String,
    pub default_tag: String,
    pub default_url: String,
    /// URL-safe base64 application server key, used when resubscribing
    /// without a previous subscription to copy options from.
    pub vapid_public_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub access_token: Option<String>,
}

impl ApiSettings {
    /// Joins `path` onto the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl RealtimeSettings {
    pub fn subscribe_url(&self, api: &ApiSettings) -> String {
        api.url(&self.sse_path)
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("HRSAAS"),
            )
            .set_default("api.base_url", "http://localhost:8080")?
            .set_default("api.timeout_secs", 10)?
            .set_default("realtime.sse_path", "/api/v1/notifications/sse/subscribe")?
            .set_default("realtime.token_param", "token")?
            .set_default("push.default_title", "HR SaaS")?
            .set_default("push.default_icon", "/icons/icon-192x192.png")?
            .set_default("push.default_badge", "/icons/badge-72x72.png")?
            .set_default("push.default_tag", "hr-saas-notification")?
            .set_default("push.default_url", "/notifications")?
            .set_default("push.vapid_public_key", None::<String>)?
            .set_default("auth.access_token", None::<String>)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            default_title: "HR SaaS".to_string(),
            default_icon: "/icons/icon-192x192.png".to_string(),
            default_badge: "/icons/badge-72x72.png".to_string(),
            default_tag: "hr-saas-notification".to_string(),
            default_url: "/notifications".to_string(),
            vapid_public_key: None,
        }
    }
}
