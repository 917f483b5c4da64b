use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    /// Base for canonical timetable addresses.
    pub public_url: Url,
    /// IANA zone the class times are given in.
    pub timezone: String,
    /// Optional TOML file with groups to load at startup.
    pub catalog_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("public_url", "http://localhost:8080/")?
            .set_default("timezone", "Europe/Moscow")?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.tz()?;
        Ok(settings)
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| ConfigError::Message(format!("invalid timezone {}: {err}", self.timezone)))
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_defaults() {
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.tz().unwrap(), chrono_tz::Europe::Moscow);
        assert!(settings.public_url.as_str().ends_with('/'));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        // SAFETY: serialized with the other env-reading tests.
        unsafe {
            std::env::set_var("APP_PORT", "9191");
            std::env::set_var("APP_TIMEZONE", "Europe/Berlin");
        }
        let settings = Settings::from_env();
        unsafe {
            std::env::remove_var("APP_PORT");
            std::env::remove_var("APP_TIMEZONE");
        }
        let settings = settings.unwrap();
        assert_eq!(settings.port, 9191);
        assert_eq!(settings.tz().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    #[serial]
    fn test_invalid_timezone_rejected() {
        unsafe {
            std::env::set_var("APP_TIMEZONE", "Mars/Olympus");
        }
        let result = Settings::from_env();
        unsafe {
            std::env::remove_var("APP_TIMEZONE");
        }
        assert!(result.is_err());
    }
}
