use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use billscan_ocr::{MockRecognizer, OcrBackend, TesseractCli};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Env var naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "BILLSCAN_CONFIG";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Invalid config file {}: {source}", .path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("Invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("OCR backend `leptess` requires building with the `tesseract` feature")]
    LeptessUnavailable,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    /// The `tesseract` executable.
    #[default]
    Cli,
    /// libtesseract linked in-process.
    Leptess,
    /// Fixed text; no engine needed.
    Mock,
}

impl FromStr for OcrBackendKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(OcrBackendKind::Cli),
            "leptess" => Ok(OcrBackendKind::Leptess),
            "mock" => Ok(OcrBackendKind::Mock),
            other => Err(format!("Unknown OCR backend: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,
    pub tesseract_cmd: PathBuf,
    pub lang: String,
    pub data_path: Option<PathBuf>,
    /// Text returned by the `mock` backend.
    pub mock_text: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Cli,
            tesseract_cmd: PathBuf::from("tesseract"),
            lang: "eng".to_string(),
            data_path: None,
            mock_text: String::new(),
        }
    }
}

impl OcrConfig {
    /// Instantiate the configured backend. Called once at startup.
    pub fn build_backend(&self) -> Result<Arc<dyn OcrBackend>, ConfigError> {
        match self.backend {
            OcrBackendKind::Cli => {
                let mut cli = TesseractCli::new(&self.tesseract_cmd, &self.lang);
                if let Some(dir) = &self.data_path {
                    cli = cli.with_data_path(dir);
                }
                Ok(Arc::new(cli))
            }
            OcrBackendKind::Mock => Ok(Arc::new(MockRecognizer::new(self.mock_text.clone()))),
            #[cfg(feature = "tesseract")]
            OcrBackendKind::Leptess => {
                let data_path = self.data_path.as_ref().map(|p| p.to_string_lossy().into_owned());
                Ok(Arc::new(billscan_ocr::TesseractRecognizer::new(data_path, &self.lang)))
            }
            #[cfg(not(feature = "tesseract"))]
            OcrBackendKind::Leptess => Err(ConfigError::LeptessUnavailable),
        }
    }
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
    pub ocr: OcrConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_format: LogFormat::Pretty,
            ocr: OcrConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then the file named by `BILLSCAN_CONFIG`, then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::load`] but reading variables through `env`.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match env(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = env("BILLSCAN_HOST") {
            self.host = host;
        }
        if let Some(port) = parse_env(env, "BILLSCAN_PORT")? {
            self.port = port;
        }
        if let Some(limit) = parse_env(env, "BILLSCAN_MAX_UPLOAD_BYTES")? {
            self.max_upload_bytes = limit;
        }
        if let Some(format) = parse_env(env, "BILLSCAN_LOG_FORMAT")? {
            self.log_format = format;
        }
        if let Some(backend) = parse_env(env, "BILLSCAN_OCR_BACKEND")? {
            self.ocr.backend = backend;
        }
        if let Some(cmd) = env("BILLSCAN_TESSERACT_CMD") {
            self.ocr.tesseract_cmd = PathBuf::from(cmd);
        }
        if let Some(lang) = env("BILLSCAN_OCR_LANG") {
            self.ocr.lang = lang;
        }
        if let Some(dir) = env("TESSDATA_PREFIX") {
            self.ocr.data_path = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be greater than zero".into()));
        }
        if self.ocr.lang.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr.lang must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = env(key) else {
        return Ok(None);
    };
    let parsed: Result<T, _> = value.trim().parse();
    match parsed {
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(ConfigError::Env { key, value }),
    }
}
