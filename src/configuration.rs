use config::{ConfigError, Environment};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub backend: BackendSettings,
    pub gateway: GatewaySettings,
    pub earnings: EarningsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub authorization_token: SecretString,
    pub timeout_milliseconds: u64,
}

impl BackendSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Publishable key only. The matching private secret never leaves the
/// backend.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub key_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarningsSettings {
    pub monthly_target: u64,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("configuration.yaml"),
        ))
        .add_source(Environment::default().separator("_"))
        .build()?;
    builder.try_deserialize::<Settings>()
}
