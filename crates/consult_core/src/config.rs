use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::paths::{config_toml_path, cookie_path, credential_path};

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE_PATH: &str = "config.toml";

/// Settings for one service client. Fixed for the life of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Prefix every endpoint path is appended to, verbatim.
    pub base_url: String,
    /// Upper bound on a single HTTP call.
    pub timeout: Duration,
    /// Extra attempts for transient failures. `0` disables retrying.
    pub retry_attempts: u32,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_attempts: 0,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

/// Settings for the whole client: one entry per service plus the locations
/// of the persisted credential and session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub auth: ServiceConfig,
    pub chat: ServiceConfig,
    pub credential_path: PathBuf,
    pub cookie_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth: ServiceConfig::default(),
            chat: ServiceConfig::default(),
            credential_path: credential_path(),
            cookie_path: cookie_path(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base: Option<String>,
    timeout_secs: Option<u64>,
    retry_attempts: Option<u32>,
    credential_path: Option<PathBuf>,
    cookie_path: Option<PathBuf>,
    #[serde(default)]
    auth: FileServiceConfig,
    #[serde(default)]
    chat: FileServiceConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileServiceConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    retry_attempts: Option<u32>,
}

impl ClientConfig {
    /// Loads defaults, then the TOML file, then environment overrides.
    ///
    /// `path` selects the file explicitly; otherwise `~/.consult/config.toml`
    /// and then `./config.toml` are tried. Unreadable or malformed files are
    /// logged and skipped.
    pub fn load(path: Option<&Path>) -> Self {
        let file = Self::read_file_config(path);
        Self::from_sources(file, |key: &str| std::env::var(key).ok())
    }

    fn read_file_config(path: Option<&Path>) -> Option<FileConfig> {
        let candidate = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let user_config = config_toml_path();
                if user_config.exists() {
                    user_config
                } else if Path::new(CONFIG_FILE_PATH).exists() {
                    PathBuf::from(CONFIG_FILE_PATH)
                } else {
                    return None;
                }
            }
        };

        let content = match std::fs::read_to_string(&candidate) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read config file {:?}: {}", candidate, err);
                return None;
            }
        };
        match toml::from_str::<FileConfig>(&content) {
            Ok(file_config) => {
                debug!("Loaded config from {:?}", candidate);
                Some(file_config)
            }
            Err(err) => {
                warn!("Failed to parse config file {:?}: {}", candidate, err);
                None
            }
        }
    }

    fn from_sources(file: Option<FileConfig>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ClientConfig::default();

        if let Some(file) = file {
            let shared_base = file.api_base.clone();
            apply_file_section(&mut config.auth, &file.auth, &file, shared_base.as_deref());
            apply_file_section(&mut config.chat, &file.chat, &file, shared_base.as_deref());
            if let Some(path) = file.credential_path {
                config.credential_path = path;
            }
            if let Some(path) = file.cookie_path {
                config.cookie_path = path;
            }
        }

        if let Some(api_base) = env("CONSULT_API_BASE") {
            config.auth.base_url = api_base.clone();
            config.chat.base_url = api_base;
        }
        if let Some(auth_base) = env("CONSULT_AUTH_BASE") {
            config.auth.base_url = auth_base;
        }
        if let Some(chat_base) = env("CONSULT_CHAT_BASE") {
            config.chat.base_url = chat_base;
        }
        if let Some(secs) = parse_env_number::<u64>(&env, "CONSULT_TIMEOUT_SECS") {
            config.auth.timeout = Duration::from_secs(secs);
            config.chat.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_env_number::<u32>(&env, "CONSULT_RETRY_ATTEMPTS") {
            config.auth.retry_attempts = attempts;
            config.chat.retry_attempts = attempts;
        }
        if let Some(path) = env("CONSULT_CREDENTIAL_PATH") {
            config.credential_path = PathBuf::from(path);
        }
        if let Some(path) = env("CONSULT_COOKIE_PATH") {
            config.cookie_path = PathBuf::from(path);
        }
        config
    }
}

fn apply_file_section(
    target: &mut ServiceConfig,
    section: &FileServiceConfig,
    file: &FileConfig,
    shared_base: Option<&str>,
) {
    if let Some(base_url) = section.base_url.as_deref().or(shared_base) {
        target.base_url = base_url.to_string();
    }
    if let Some(secs) = section.timeout_secs.or(file.timeout_secs) {
        target.timeout = Duration::from_secs(secs);
    }
    if let Some(attempts) = section.retry_attempts.or(file.retry_attempts) {
        target.retry_attempts = attempts;
    }
}

fn parse_env_number<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {key}: {raw:?} is not a valid number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn parse(content: &str) -> FileConfig {
        toml::from_str(content).expect("valid toml")
    }

    #[test]
    fn defaults_without_sources() {
        let config = ClientConfig::from_sources(None, env_from(&[]));
        assert_eq!(config.auth.base_url, DEFAULT_API_BASE);
        assert_eq!(config.chat.base_url, DEFAULT_API_BASE);
        assert_eq!(config.chat.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.chat.retry_attempts, 0);
        assert_eq!(config.credential_path, credential_path());
        assert_eq!(config.cookie_path, cookie_path());
    }

    #[test]
    fn shared_api_base_applies_to_both_sections() {
        let file = parse(
            r#"
            api_base = "https://consult.example.com/api"
            timeout_secs = 5

            [chat]
            base_url = "https://chat.example.com"
            retry_attempts = 2
            "#,
        );
        let config = ClientConfig::from_sources(Some(file), env_from(&[]));

        assert_eq!(config.auth.base_url, "https://consult.example.com/api");
        assert_eq!(config.chat.base_url, "https://chat.example.com");
        assert_eq!(config.auth.timeout, Duration::from_secs(5));
        assert_eq!(config.chat.timeout, Duration::from_secs(5));
        assert_eq!(config.auth.retry_attempts, 0);
        assert_eq!(config.chat.retry_attempts, 2);
    }

    #[test]
    fn environment_overrides_file() {
        let file = parse(
            r#"
            api_base = "https://file.example.com"
            credential_path = "/tmp/from-file"
            cookie_path = "/tmp/cookies-from-file.json"
            "#,
        );
        let config = ClientConfig::from_sources(
            Some(file),
            env_from(&[
                ("CONSULT_API_BASE", "https://env.example.com"),
                ("CONSULT_AUTH_BASE", "https://auth.example.com"),
                ("CONSULT_TIMEOUT_SECS", "12"),
                ("CONSULT_RETRY_ATTEMPTS", "3"),
                ("CONSULT_CREDENTIAL_PATH", "/tmp/from-env"),
            ]),
        );

        assert_eq!(config.auth.base_url, "https://auth.example.com");
        assert_eq!(config.chat.base_url, "https://env.example.com");
        assert_eq!(config.auth.timeout, Duration::from_secs(12));
        assert_eq!(config.chat.retry_attempts, 3);
        assert_eq!(config.credential_path, PathBuf::from("/tmp/from-env"));
        assert_eq!(
            config.cookie_path,
            PathBuf::from("/tmp/cookies-from-file.json")
        );
    }

    #[test]
    fn malformed_env_numbers_are_ignored() {
        let config = ClientConfig::from_sources(
            None,
            env_from(&[
                ("CONSULT_TIMEOUT_SECS", "soon"),
                ("CONSULT_RETRY_ATTEMPTS", "-1"),
            ]),
        );
        assert_eq!(config.auth.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.auth.retry_attempts, 0);
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("consult.toml");
        std::fs::write(
            &path,
            "[auth]\nbase_url = \"https://auth.example.com\"\ntimeout_secs = 7\n",
        )
        .expect("write config");

        let file = ClientConfig::read_file_config(Some(&path)).expect("file config");
        let config = ClientConfig::from_sources(Some(file), env_from(&[]));
        assert_eq!(config.auth.base_url, "https://auth.example.com");
        assert_eq!(config.auth.timeout, Duration::from_secs(7));
        assert_eq!(config.chat.base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn malformed_file_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "api_base = [not toml").expect("write config");

        assert!(ClientConfig::read_file_config(Some(&path)).is_none());
    }

    #[test]
    fn service_config_builders() {
        let config = ServiceConfig::new("http://localhost:9999")
            .with_timeout(Duration::from_millis(250))
            .with_retry_attempts(4);
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.retry_attempts, 4);
    }
}
