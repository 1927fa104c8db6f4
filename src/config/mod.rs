pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use toml_config::ChooserConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "master-chooser")]
#[command(about = "Pick and verify a master address")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Override probe timeout in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Override where the last used address is stored")]
    pub prefs_path: Option<String>,

    #[arg(long, help = "Override the caller id sent with the identification query")]
    pub caller_id: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: ChooserCommand,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum ChooserCommand {
    /// Check a single address without storing it
    Verify { address: String },

    /// Verify the shown address and remember it on success
    Connect {
        #[arg(long)]
        address: Option<String>,

        /// Contents returned by the external barcode scanner
        #[arg(long)]
        scan_result: Option<String>,

        #[arg(long, default_value = "QR_CODE")]
        scan_format: String,
    },

    /// Ask the caller to start a new master instead
    NewMaster {
        #[arg(long)]
        private: bool,
    },

    /// Print the address the chooser would show
    Show,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔 (若有) 後套用命令列覆蓋
    pub fn resolve(&self) -> Result<ChooserConfig> {
        let mut config = match &self.config {
            Some(path) => ChooserConfig::from_file(path)?,
            None => ChooserConfig::default(),
        };

        if let Some(timeout) = self.timeout_secs {
            config.probe.timeout_seconds = timeout;
        }
        if let Some(prefs_path) = &self.prefs_path {
            config.storage.prefs_path = prefs_path.clone();
        }
        if let Some(caller_id) = &self.caller_id {
            config.master.caller_id = caller_id.clone();
        }

        Ok(config)
    }
}
