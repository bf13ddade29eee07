use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::TenancyConfig;
use thiserror::Error;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub tenancy: TenancyConfig,
    pub site: SiteSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the booking API (e.g. https://api.blyss.uz).
    pub url: String,
    /// Shared HMAC key for `x-signature`. Never sent to clients.
    pub api_secret: Secret<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Deserialize, Clone)]
pub struct SiteSettings {
    /// Public URL of the main marketing site, used in robots.txt and the sitemap.
    pub url: String,
    /// Domain for auth cookies, e.g. `.blyss.uz` so every tenant subdomain sees them.
    #[serde(default)]
    pub cookie_domain: Option<String>,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("backend.api_secret must be set (APP_BACKEND__API_SECRET)")]
    MissingApiSecret,
    #[error("backend.url must be set")]
    MissingBackendUrl,
    #[error("tenancy.main_domain must be set")]
    MissingMainDomain,
}

impl Settings {
    /// Startup checks for misconfiguration that would otherwise surface per request.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.backend.api_secret.expose_secret().trim().is_empty() {
            return Err(SettingsError::MissingApiSecret);
        }
        if self.backend.url.trim().is_empty() {
            return Err(SettingsError::MissingBackendUrl);
        }
        if self.tenancy.main_domain.trim().is_empty() {
            return Err(SettingsError::MissingMainDomain);
        }
        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Check if we're already in the storefront directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("storefront") {
        base_path.join("config")
    } else {
        base_path.join("storefront").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: &str) -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            backend: BackendSettings {
                url: "http://localhost:3001".to_string(),
                api_secret: Secret::new(secret.to_string()),
                timeout_secs: 10,
            },
            tenancy: TenancyConfig::default(),
            site: SiteSettings {
                url: "https://blyss.uz".to_string(),
                cookie_domain: None,
                secure_cookies: false,
            },
            telemetry: TelemetrySettings::default(),
        }
    }

    #[test]
    fn empty_secret_fails_validation() {
        assert_eq!(
            settings("").validate(),
            Err(SettingsError::MissingApiSecret)
        );
        assert_eq!(
            settings("   ").validate(),
            Err(SettingsError::MissingApiSecret)
        );
    }

    #[test]
    fn configured_secret_passes_validation() {
        assert_eq!(settings("s3cret").validate(), Ok(()));
    }

    #[test]
    fn base_yaml_parses() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../../config/base.yaml"),
                config::FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.tenancy.main_domain, "blyss.uz");
        assert!(settings.tenancy.is_reserved("mail"));
        assert_eq!(settings.validate(), Err(SettingsError::MissingApiSecret));
    }
}
