use crate::core::ConfigProvider;
use crate::domain::model::{DEFAULT_CALLER_ID, DEFAULT_MASTER_URI, DEFAULT_PROBE_TIMEOUT_SECS};
use crate::utils::error::{ChooserError, Result};
use crate::utils::validation::{
    validate_master_uri, validate_non_empty_string, validate_path, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PREFS_PATH: &str = "./.master_chooser/prefs.toml";
const MAX_PROBE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChooserConfig {
    #[serde(default)]
    pub master: MasterConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    #[serde(default = "default_master_uri")]
    pub default_uri: String,
    #[serde(default = "default_caller_id")]
    pub caller_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_prefs_path")]
    pub prefs_path: String,
}

fn default_master_uri() -> String {
    DEFAULT_MASTER_URI.to_string()
}

fn default_caller_id() -> String {
    DEFAULT_CALLER_ID.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

fn default_prefs_path() -> String {
    DEFAULT_PREFS_PATH.to_string()
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            default_uri: default_master_uri(),
            caller_id: default_caller_id(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefs_path: default_prefs_path(),
        }
    }
}

impl ChooserConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ChooserError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ChooserError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ROS_MASTER_URI})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ChooserError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_master_uri("master.default_uri", &self.master.default_uri)?;
        validate_non_empty_string("master.caller_id", &self.master.caller_id)?;
        validate_range(
            "probe.timeout_seconds",
            self.probe.timeout_seconds,
            1,
            MAX_PROBE_TIMEOUT_SECS,
        )?;
        validate_path("storage.prefs_path", &self.storage.prefs_path)?;
        Ok(())
    }
}

impl ConfigProvider for ChooserConfig {
    fn default_master_uri(&self) -> &str {
        &self.master.default_uri
    }

    fn caller_id(&self) -> &str {
        &self.master.caller_id
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_seconds)
    }

    fn prefs_path(&self) -> &str {
        &self.storage.prefs_path
    }
}

impl Validate for ChooserConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
