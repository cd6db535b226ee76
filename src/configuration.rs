use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};
use std::time::Duration;
use tracing_log::log::LevelFilter;

/// Environment inputs the service has always recognized, mapped onto settings keys.
const LEGACY_ENV_OVERRIDES: [(&str, &str); 7] = [
    ("SNS_TOPIC_ARN", "notifications.topic_arn"),
    ("DELAY_THRESHOLD_MINUTES", "alerts.delay_threshold_minutes"),
    ("VEHICLE_DELAY_THRESHOLD", "alerts.vehicle_delay_threshold"),
    ("MAX_SUBSCRIPTIONS", "alerts.max_subscriptions"),
    ("MAX_RETRIES", "alerts.max_retries"),
    ("RETRY_DELAY", "alerts.retry_delay_seconds"),
    ("MTA_API_KEY", "transit.api_key"),
];

#[derive(Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub notifications: NotificationSettings,
    pub transit: TransitSettings,
    pub alerts: AlertSettings,
}

#[derive(Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.database_name)
            .log_statements(LevelFilter::Trace)
    }

    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .ssl_mode(ssl_mode)
    }
}

#[derive(Deserialize)]
pub struct NotificationSettings {
    pub topic_arn: String,
    pub region: Option<String>,
    /// Overrides the SNS endpoint, e.g. for a local emulator.
    pub endpoint_url: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl NotificationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Deserialize)]
pub struct TransitSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl TransitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Business thresholds.
///
/// `max_retries` and `retry_delay_seconds` are accepted and logged at startup,
/// but no call is ever retried.
#[derive(Clone, Debug, Deserialize)]
pub struct AlertSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_threshold_minutes: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub vehicle_delay_threshold: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_subscriptions: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_retries: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub retry_delay_seconds: u64,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let config_dir = std::env::current_dir()
        .map(|dir| dir.join("configuration"))
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {e}")))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let env_config = format!("{}.yaml", environment.as_str());

    let builder = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base.yaml")))
        .add_source(config::File::from(config_dir.join(env_config)))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    with_legacy_overrides(builder, |name| std::env::var(name).ok())?
        .build()?
        .try_deserialize()
}

fn with_legacy_overrides<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (variable, key) in LEGACY_ENV_OVERRIDES {
        builder = builder.set_override_option(key, lookup(variable))?;
    }

    Ok(builder)
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "`{other}` is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
