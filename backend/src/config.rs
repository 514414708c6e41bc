use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "plant_disease_model.pt";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("CORS_ALLOW_CREDENTIALS cannot be combined with a wildcard origin")]
    CredentialsWithWildcard,
    #[error("CORS origin {0:?} must be \"*\" or start with http:// or https://")]
    InvalidOrigin(String),
}

/// Cross-origin policy. An empty allow-list admits no cross-origin requests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
    pub max_image_dimension: u32,
    pub max_decode_alloc_bytes: u64,
    pub request_timeout: Duration,
    pub max_concurrent_inferences: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_dimension: 8192,
            max_decode_alloc_bytes: 512 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
            max_concurrent_inferences: default_parallelism(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub model_path: PathBuf,
    pub frontend_dir: Option<PathBuf>,
    pub limits: UploadLimits,
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = UploadLimits::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let limits = UploadLimits {
            max_upload_bytes: positive(&var, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_image_dimension: positive(&var, "MAX_IMAGE_DIMENSION", defaults.max_image_dimension)?,
            max_decode_alloc_bytes: positive(
                &var,
                "MAX_DECODE_ALLOC_BYTES",
                defaults.max_decode_alloc_bytes,
            )?,
            request_timeout: Duration::from_secs(positive(
                &var,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            max_concurrent_inferences: positive(
                &var,
                "MAX_CONCURRENT_INFERENCES",
                defaults.max_concurrent_inferences,
            )?,
        };

        let allowed_origins: Vec<String> = var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let cors = CorsConfig {
            allowed_origins,
            allow_credentials: parse(&var, "CORS_ALLOW_CREDENTIALS", false)?,
        };
        if cors.allow_credentials && cors.allows_any_origin() {
            return Err(ConfigError::CredentialsWithWildcard);
        }
        if let Some(bad) = cors.allowed_origins.iter().find(|o| {
            o.as_str() != "*" && !o.starts_with("http://") && !o.starts_with("https://")
        }) {
            return Err(ConfigError::InvalidOrigin(bad.clone()));
        }

        let workers = match var("WORKERS") {
            Some(_) => Some(positive(&var, "WORKERS", 1usize)?),
            None => None,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse(&var, "PORT", 8000u16)?,
            workers,
            model_path: var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            frontend_dir: var("FRONTEND_DIR").map(PathBuf::from),
            limits,
            cors,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn positive<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let value = parse(var, key, default)?;
    if value <= T::default() {
        return Err(ConfigError::Zero(key));
    }
    Ok(value)
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_are_restrictive() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(config.cors.allowed_origins.is_empty());
        assert!(!config.cors.allow_credentials);
        assert_eq!(config.limits.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.request_timeout, Duration::from_secs(30));
        assert!(config.limits.max_concurrent_inferences >= 1);
        assert_eq!(config.workers, None);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = config_from(&[
            ("CORS_ALLOWED_ORIGINS", " http://localhost:5173/, https://leaf.example ,"),
            ("CORS_ALLOW_CREDENTIALS", "true"),
        ])
        .unwrap();
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:5173", "https://leaf.example"]
        );
        assert!(config.cors.allow_credentials);
        assert!(!config.cors.allows_any_origin());
    }

    #[test]
    fn wildcard_with_credentials_is_rejected() {
        let err = config_from(&[
            ("CORS_ALLOWED_ORIGINS", "*"),
            ("CORS_ALLOW_CREDENTIALS", "true"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::CredentialsWithWildcard);
    }

    #[test]
    fn schemeless_origin_is_rejected() {
        assert_eq!(
            config_from(&[("CORS_ALLOWED_ORIGINS", "localhost:3000")]).unwrap_err(),
            ConfigError::InvalidOrigin("localhost:3000".into())
        );
    }

    #[test]
    fn invalid_numbers_are_reported_with_key() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "PORT",
                value: "eighty".into()
            }
        );
        assert_eq!(
            config_from(&[("MAX_UPLOAD_BYTES", "0")]).unwrap_err(),
            ConfigError::Zero("MAX_UPLOAD_BYTES")
        );
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9090"),
            ("WORKERS", "2"),
            ("MODEL_PATH", "/models/leaf.pt"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("MAX_CONCURRENT_INFERENCES", "3"),
            ("FRONTEND_DIR", "frontend/dist"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.model_path, PathBuf::from("/models/leaf.pt"));
        assert_eq!(config.limits.request_timeout, Duration::from_secs(5));
        assert_eq!(config.limits.max_concurrent_inferences, 3);
        assert_eq!(config.frontend_dir, Some(PathBuf::from("frontend/dist")));
    }
}
