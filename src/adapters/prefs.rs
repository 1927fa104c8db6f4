use crate::core::AddressStore;
use crate::utils::error::{ChooserError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(rename = "URI_KEY", skip_serializing_if = "Option::is_none")]
    last_master_uri: Option<String>,
}

/// 以單一 TOML 檔保存上次使用的 master 位址
#[derive(Debug, Clone)]
pub struct FilePrefsStore {
    path: PathBuf,
}

impl FilePrefsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_error(&self, message: String) -> ChooserError {
        ChooserError::PrefsFormatError {
            path: self.path.display().to_string(),
            message,
        }
    }
}

impl AddressStore for FilePrefsStore {
    async fn load_last_address(&self) -> Result<Option<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let prefs: Preferences =
            toml::from_str(&content).map_err(|e| self.format_error(e.to_string()))?;
        Ok(prefs.last_master_uri)
    }

    async fn store_last_address(&self, address: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let prefs = Preferences {
            last_master_uri: Some(address.to_string()),
        };
        let content = toml::to_string(&prefs).map_err(|e| self.format_error(e.to_string()))?;
        tokio::fs::write(&self.path, content).await?;

        tracing::debug!("Stored master address in {}", self.path.display());
        Ok(())
    }
}

/// 行程內的儲存，給嵌入使用與測試
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressStore {
    address: Arc<Mutex<Option<String>>>,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddressStore for MemoryAddressStore {
    async fn load_last_address(&self) -> Result<Option<String>> {
        Ok(self.address.lock().await.clone())
    }

    async fn store_last_address(&self, address: &str) -> Result<()> {
        *self.address.lock().await = Some(address.to_string());
        Ok(())
    }
}
