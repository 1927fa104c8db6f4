pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{ChooserCommand, CliConfig};

pub use adapters::{
    notifier::{ConsoleNotifier, TracingNotifier},
    prefs::{FilePrefsStore, MemoryAddressStore},
    xmlrpc::XmlRpcMasterClient,
};
pub use config::toml_config::ChooserConfig;
pub use core::{chooser::MasterChooser, verifier::EndpointVerifier, worker::ProbeWorker};
pub use domain::model::{ChooserOutcome, EndpointAddress, ScanResult, VerificationResult};
pub use utils::error::{ChooserError, Result};
