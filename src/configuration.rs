use std::env;
use std::env::current_dir;
use std::fmt::Display;

use anyhow::Context;
use config::Config;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::webhook_client::WebhookClient;

/// Global configuration, loaded from `configuration/*.yaml` and the
/// environment. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub webhook: WebhookSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Value of `Access-Control-Allow-Origin` on every signup response
    pub allowed_origin: String,

    /// Shown as the `Source:` field of every notification
    pub source_label: String,
}

/// Destination of signup notifications.
#[derive(Deserialize, Clone)]
pub struct WebhookSettings {
    /// The url embeds its own credentials, so it is kept secret. Missing or
    /// empty means notifications are dropped (and logged), but the server
    /// still starts.
    #[serde(default)]
    pub url: Option<Secret<String>>,
}

impl WebhookSettings {
    pub fn url(&self) -> Option<Secret<String>> {
        self.url
            .as_ref()
            .filter(|u| !u.expose_secret().trim().is_empty())
            .cloned()
    }

    pub fn client(&self) -> WebhookClient { WebhookClient::new(self.url()) }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// apply overrides from the environment.
///
/// `APP_WEBHOOK__URL=https://hooks.slack.com/...` -> `Settings.webhook.url`
///
/// `SLACK_WEBHOOK_URL` is also accepted, and takes precedence, since that is
/// the name most hosting dashboards already have configured.
pub fn get_configuration() -> Result<Settings, anyhow::Error> {
    let cfg_dir = current_dir()
        .context("could not get current dir")?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, `serde-aux` is required to parse other
            // types
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("webhook.url", env::var("SLACK_WEBHOOK_URL").ok())?
        .build()
        .with_context(|| format!("could not load config for {env} env"))?;

    Ok(settings.try_deserialize::<Settings>()?)
}
