use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use setu_core::domain::{is_valid_country_code, DEFAULT_COUNTRY_CODE};
use thiserror::Error;

const APP_DIR: &str = "setu";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_TWILIO_VERIFY_API_BASE: &str = "https://verify.twilio.com";
pub const DEFAULT_VERIFY_FRIENDLY_NAME: &str = "Suraksha Setu Verification";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_country_code: String,
    pub server: ServerConfig,
    pub sms: SmsConfig,
    pub twilio: Option<TwilioConfig>,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub backend: SmsBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsBackend {
    Log,
    Twilio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token_env: String,
    pub from: String,
    pub api_base: String,
    pub verify_api_base: String,
    pub verify_friendly_name: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            server: ServerConfig {
                bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            },
            sms: SmsConfig {
                backend: SmsBackend::Log,
            },
            twilio: None,
            verify: VerifyConfig { enabled: false },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid default_country_code value: {0}")]
    InvalidCountryCode(String),
    #[error("invalid server.bind value: {0}")]
    InvalidBind(String),
    #[error("invalid twilio.{field}: {reason}")]
    InvalidTwilioField { field: &'static str, reason: String },
    #[error("sms.backend = \"twilio\" requires a [twilio] section")]
    MissingTwilioSection,
    #[error("verify.enabled requires a [twilio] section")]
    VerifyWithoutTwilio,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    default_country_code: Option<String>,
    server: Option<ServerFile>,
    sms: Option<SmsFile>,
    twilio: Option<TwilioFile>,
    verify: Option<VerifyFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerFile {
    bind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SmsFile {
    backend: Option<SmsBackend>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TwilioFile {
    account_sid: Option<String>,
    auth_token_env: Option<String>,
    from: Option<String>,
    api_base: Option<String>,
    verify_api_base: Option<String>,
    verify_friendly_name: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerifyFile {
    enabled: Option<bool>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(code) = parsed.default_country_code {
        let code = code.trim().to_string();
        if !is_valid_country_code(&code) {
            return Err(ConfigError::InvalidCountryCode(code));
        }
        config.default_country_code = code;
    }

    if let Some(bind) = parsed.server.and_then(|server| server.bind) {
        config.server.bind = bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind.clone()))?;
    }

    if let Some(backend) = parsed.sms.and_then(|sms| sms.backend) {
        config.sms.backend = backend;
    }

    if let Some(twilio) = parsed.twilio {
        config.twilio = Some(merge_twilio(twilio)?);
    }

    if let Some(enabled) = parsed.verify.and_then(|verify| verify.enabled) {
        config.verify.enabled = enabled;
    }

    if config.sms.backend == SmsBackend::Twilio && config.twilio.is_none() {
        return Err(ConfigError::MissingTwilioSection);
    }
    if config.verify.enabled && config.twilio.is_none() {
        return Err(ConfigError::VerifyWithoutTwilio);
    }

    Ok(config)
}

fn merge_twilio(file: TwilioFile) -> Result<TwilioConfig> {
    let account_sid = required_field("account_sid", file.account_sid)?;
    let auth_token_env = required_field("auth_token_env", file.auth_token_env)?;
    let from = required_field("from", file.from)?;
    if !from.starts_with('+') {
        return Err(ConfigError::InvalidTwilioField {
            field: "from",
            reason: "must be an international number starting with +".to_string(),
        });
    }

    let api_base = https_field("api_base", file.api_base, DEFAULT_TWILIO_API_BASE)?;
    let verify_api_base = https_field(
        "verify_api_base",
        file.verify_api_base,
        DEFAULT_TWILIO_VERIFY_API_BASE,
    )?;
    let verify_friendly_name = file
        .verify_friendly_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_VERIFY_FRIENDLY_NAME.to_string());

    let timeout_seconds = file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 || timeout_seconds > MAX_TIMEOUT_SECONDS {
        return Err(ConfigError::InvalidTwilioField {
            field: "timeout_seconds",
            reason: format!("must be between 1 and {MAX_TIMEOUT_SECONDS}"),
        });
    }

    Ok(TwilioConfig {
        account_sid,
        auth_token_env,
        from,
        api_base,
        verify_api_base,
        verify_friendly_name,
        timeout_seconds,
    })
}

fn required_field(field: &'static str, value: Option<String>) -> Result<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::InvalidTwilioField {
            field,
            reason: "is required".to_string(),
        })
}

fn https_field(field: &'static str, value: Option<String>, default: &str) -> Result<String> {
    let value = value
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.to_string());
    if !value.starts_with("https://") {
        return Err(ConfigError::InvalidTwilioField {
            field,
            reason: "must use https".to_string(),
        });
    }
    Ok(value)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        load_at_path, merge_config, ConfigError, ConfigFile, SmsBackend, SmsFile, TwilioFile,
        VerifyFile, DEFAULT_TWILIO_API_BASE,
    };
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    fn twilio_file() -> TwilioFile {
        TwilioFile {
            account_sid: Some("AC123".to_string()),
            auth_token_env: Some("TWILIO_AUTH_TOKEN".to_string()),
            from: Some("+15005550006".to_string()),
            ..TwilioFile::default()
        }
    }

    #[test]
    fn defaults_use_log_backend() {
        let merged = merge_config(ConfigFile::default()).expect("merge");
        assert_eq!(merged.default_country_code, "+91");
        assert_eq!(merged.sms.backend, SmsBackend::Log);
        assert!(merged.twilio.is_none());
        assert!(!merged.verify.enabled);
    }

    #[test]
    fn merge_config_applies_twilio_values() {
        let parsed = ConfigFile {
            default_country_code: Some("+1".to_string()),
            sms: Some(SmsFile {
                backend: Some(SmsBackend::Twilio),
            }),
            twilio: Some(twilio_file()),
            verify: Some(VerifyFile {
                enabled: Some(true),
            }),
            ..ConfigFile::default()
        };
        let merged = merge_config(parsed).expect("merge");
        assert_eq!(merged.default_country_code, "+1");
        assert_eq!(merged.sms.backend, SmsBackend::Twilio);
        assert!(merged.verify.enabled);
        let twilio = merged.twilio.expect("twilio");
        assert_eq!(twilio.api_base, DEFAULT_TWILIO_API_BASE);
        assert_eq!(twilio.timeout_seconds, 30);
    }

    #[test]
    fn twilio_backend_requires_section() {
        let parsed = ConfigFile {
            sms: Some(SmsFile {
                backend: Some(SmsBackend::Twilio),
            }),
            ..ConfigFile::default()
        };
        assert!(matches!(
            merge_config(parsed),
            Err(ConfigError::MissingTwilioSection)
        ));
    }

    #[test]
    fn twilio_rejects_plain_http_and_bad_sender() {
        let mut file = twilio_file();
        file.api_base = Some("http://api.twilio.com".to_string());
        let parsed = ConfigFile {
            twilio: Some(file),
            ..ConfigFile::default()
        };
        let err = merge_config(parsed).unwrap_err();
        assert!(err.to_string().contains("twilio.api_base"));

        let mut file = twilio_file();
        file.from = Some("15005550006".to_string());
        let parsed = ConfigFile {
            twilio: Some(file),
            ..ConfigFile::default()
        };
        let err = merge_config(parsed).unwrap_err();
        assert!(err.to_string().contains("twilio.from"));
    }

    #[test]
    fn rejects_invalid_country_code() {
        let parsed = ConfigFile {
            default_country_code: Some("91".to_string()),
            ..ConfigFile::default()
        };
        assert!(matches!(
            merge_config(parsed),
            Err(ConfigError::InvalidCountryCode(_))
        ));
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_at_path_parses_toml() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "default_country_code = \"+44\"\n[server]\nbind = \"0.0.0.0:8080\"\n[sms]\nbackend = \"log\"\n",
        )
        .expect("write config");
        restrict_permissions(&path);

        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.default_country_code, "+44");
        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.sms.backend, SmsBackend::Log);
    }

    #[test]
    fn load_at_path_rejects_unknown_keys() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "country = \"+91\"\n").expect("write config");
        restrict_permissions(&path);

        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
