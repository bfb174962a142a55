use std::{path::Path, str::FromStr};

use serde::Deserialize;
use spark_avatar::AvatarConfig;
use spark_mercury::MercuryConfig;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub service: ServiceSettings,
    pub credentials: CredentialSettings,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub mercury: MercurySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServiceSettings {
    pub avatar_url: String,
    pub mercury_url: String,
}

#[derive(Deserialize, Clone)]
pub struct CredentialSettings {
    #[serde(default)]
    pub access_token: String,
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct MercurySettings {
    pub ping_interval: u64,
    pub pong_timeout: u64,
}

impl Default for MercurySettings {
    fn default() -> Self {
        let defaults = MercuryConfig::new("");
        Self {
            ping_interval: defaults.ping_interval,
            pong_timeout: defaults.pong_timeout,
        }
    }
}

impl Settings {
    pub fn mercury_config(&self) -> MercuryConfig {
        MercuryConfig {
            url: self.service.mercury_url.clone(),
            ping_interval: self.mercury.ping_interval,
            pong_timeout: self.mercury.pong_timeout,
        }
    }

    pub fn access_token(&self) -> anyhow::Result<&str> {
        let token = self.credentials.access_token.trim();
        anyhow::ensure!(
            !token.is_empty(),
            "No access token configured, set SPARK_CREDENTIALS__ACCESS_TOKEN"
        );
        Ok(token)
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {}", e)))?;

    read_config_from(&base_path.join("config"), environment)
}

pub fn read_config_from(
    config_directory: &Path,
    environment: Environment,
) -> Result<Settings, config::ConfigError> {
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("SPARK")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
