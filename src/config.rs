use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::switcher::SwitchError;

pub const APP_NAME: &str = "taposwitch";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub addr: String,      // single static plug (TAPO_IP)
    pub temp_addr: String, // plug driven by the temperature sensor
    pub hum_addr: String,  // plug driven by the humidity sensor
    pub email: String,
    pub password: String,
    pub timeout: u64, // seconds
    pub temp_thresh: f32,
    pub hum_thresh: f32,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: String::new(),
            temp_addr: String::new(),
            hum_addr: String::new(),
            email: String::new(),
            password: String::new(),
            timeout: 10,
            temp_thresh: 25.0,
            hum_thresh: 60.0,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Loads the config file given with `--config`, or the default one, and
    /// applies the environment on top of it.
    ///
    /// A default file that cannot be read is skipped so the environment alone
    /// can configure the plug; its error is returned alongside the config for
    /// the caller to log. An explicit `path` must load.
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<anyhow::Error>)> {
        Self::load_with(
            path,
            || confy::load(APP_NAME, None).context("failed to load default config"),
            |key| std::env::var(key).ok(),
        )
    }

    pub fn load_with<D, F>(
        path: Option<&Path>,
        load_default: D,
        lookup: F,
    ) -> Result<(Self, Option<anyhow::Error>)>
    where
        D: FnOnce() -> Result<Config>,
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, skipped) = match path {
            Some(path) => (Self::load_from(path)?, None),
            None => match load_default() {
                Ok(config) => (config, None),
                Err(e) => (Config::default(), Some(e)),
            },
        };

        config.apply_env(lookup)?;
        if config.timeout == 0 {
            anyhow::bail!("timeout must be >= 1 second");
        }

        Ok((config, skipped))
    }

    /// Reads one config file without looking at the environment.
    /// Missing keys take their default values.
    pub fn load_from(path: &Path) -> Result<Self> {
        confy::load_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))
    }

    /// Overrides fields with every variable `lookup` knows about.
    /// Variables it does not know about leave the field alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut String); 5] = [
            ("TAPO_IP", &mut self.addr),
            ("TEMP_TAPO_IP", &mut self.temp_addr),
            ("HUM_TAPO_IP", &mut self.hum_addr),
            ("TAPO_EMAIL", &mut self.email),
            ("TAPO_PASSWORD", &mut self.password),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(value) = lookup("TAPO_TIMEOUT") {
            let timeout: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("TAPO_TIMEOUT must be a number of seconds, got {value:?}"))?;
            if timeout == 0 {
                anyhow::bail!("TAPO_TIMEOUT must be >= 1");
            }
            self.timeout = timeout;
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Address of the plug behind `kind`.
    pub fn address_for(&self, kind: DeviceKind) -> &str {
        match kind {
            DeviceKind::Temperature => &self.temp_addr,
            DeviceKind::Humidity => &self.hum_addr,
        }
    }

    pub fn device(&self, addr: &str) -> DeviceConfig {
        DeviceConfig {
            address: addr.to_string(),
            account_email: self.email.clone(),
            account_password: self.password.clone(),
        }
    }
}

/// Which sensor-driven plug to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Temperature,
    Humidity,
}

impl std::str::FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temp" => Ok(DeviceKind::Temperature),
            "hum" => Ok(DeviceKind::Humidity),
            other => Err(format!(
                "invalid device type '{other}', expected 'temp' or 'hum'"
            )),
        }
    }
}

/// Everything needed to open a session with one plug.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub address: String,
    pub account_email: String,
    pub account_password: String,
}

impl DeviceConfig {
    /// Fails with the names of every empty field. Whitespace counts as a value.
    pub fn validate(&self) -> Result<(), SwitchError> {
        let missing: Vec<&'static str> = [
            ("address", &self.address),
            ("email", &self.account_email),
            ("password", &self.account_password),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SwitchError::ConfigurationIncomplete { missing })
        }
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("address", &self.address)
            .field("account_email", &self.account_email)
            .field("account_password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config {
            temp_addr: "10.0.0.1".to_string(),
            email: "file@example.com".to_string(),
            ..Config::default()
        };

        config
            .apply_env(lookup(&[
                ("TEMP_TAPO_IP", "192.168.0.214"),
                ("TAPO_PASSWORD", "secret"),
                ("TAPO_TIMEOUT", "3"),
            ]))
            .unwrap();

        assert_eq!(config.temp_addr, "192.168.0.214");
        assert_eq!(config.email, "file@example.com");
        assert_eq!(config.password, "secret");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn unset_env_keeps_defaults() {
        let mut config = Config::default();
        config.apply_env(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.hum_addr, "");
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(lookup(&[("TAPO_TIMEOUT", "soon")])).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(lookup(&[("TAPO_TIMEOUT", "0")])).is_err());
        assert_eq!(config.timeout, 10);
    }

    #[test]
    fn zero_timeout_in_file_is_rejected() {
        let file = Config {
            timeout: 0,
            ..Config::default()
        };
        assert!(Config::load_with(None, || Ok(file), lookup(&[])).is_err());
    }

    #[test]
    fn unreadable_default_file_falls_back_to_env() {
        let (config, skipped) = Config::load_with(
            None,
            || Err(anyhow::anyhow!("Failed to create directory")),
            lookup(&[
                ("TEMP_TAPO_IP", "192.0.2.1"),
                ("TAPO_EMAIL", "a@b"),
                ("TAPO_PASSWORD", "x"),
            ]),
        )
        .unwrap();

        assert!(skipped.is_some());
        let device = config.device(config.address_for(DeviceKind::Temperature));
        assert_eq!(device.address, "192.0.2.1");
        assert!(device.validate().is_ok());
    }

    #[test]
    fn explicit_config_path_must_load() {
        let dir = std::env::temp_dir().join(format!("taposwitch-blocked-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let result = Config::load_with(
            Some(blocker.join("config.toml").as_path()),
            || panic!("default file must not be read"),
            lookup(&[("TAPO_EMAIL", "a@b")]),
        );
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn whitespace_is_not_missing() {
        let config = Config {
            email: " ".to_string(),
            password: "secret".to_string(),
            ..Config::default()
        };
        assert!(config.device("192.168.0.214").validate().is_ok());
    }

    #[test]
    fn parses_device_kinds() {
        assert_eq!("temp".parse::<DeviceKind>(), Ok(DeviceKind::Temperature));
        assert_eq!("hum".parse::<DeviceKind>(), Ok(DeviceKind::Humidity));
        assert!("foo".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn validate_names_every_missing_field() {
        let device = Config::default().device("");
        match device.validate() {
            Err(SwitchError::ConfigurationIncomplete { missing }) => {
                assert_eq!(missing, vec!["address", "email", "password"]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let config = Config {
            email: "me@example.com".to_string(),
            password: "secret".to_string(),
            ..Config::default()
        };
        assert!(config.device("192.168.0.214").validate().is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let config = Config {
            password: "hunter2".to_string(),
            ..Config::default()
        };
        let printed = format!("{:?}", config.device("192.168.0.214"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = std::env::temp_dir().join(format!("taposwitch-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        std::fs::write(&path, "email = \"me@example.com\"\n").unwrap();

        let config = Config::load_from(&path);
        std::fs::remove_dir_all(&dir).unwrap();

        let config = config.unwrap();
        assert_eq!(config.email, "me@example.com");
        assert_eq!(config.timeout, 10);
        assert_eq!(config.temp_thresh, 25.0);
        assert_eq!(config.hum_thresh, 60.0);
    }
}
