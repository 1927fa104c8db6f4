use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChooserError {
    #[error("Invalid master address '{value}': {reason}")]
    InvalidAddressError { value: String, reason: String },

    #[error("Master at {address} did not answer within {timeout:?}")]
    TimeoutError { address: String, timeout: Duration },

    #[error("Master request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Master answered with status {code}: {message}")]
    RemoteStatusError { code: i32, message: String },

    #[error("Malformed master response: {message}")]
    MalformedResponseError { message: String },

    #[error("Unsupported scan result format: {format}")]
    ScanFormatError { format: String },

    #[error("A master probe is already in flight")]
    ProbeInFlightError,

    #[error("Probe worker stopped before delivering a result")]
    WorkerLostError,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Preferences file {path} is unreadable: {message}")]
    PrefsFormatError { path: String, message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Remote,
    Configuration,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ChooserError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChooserError::InvalidAddressError { .. } | ChooserError::ScanFormatError { .. } => {
                ErrorCategory::Input
            }
            ChooserError::TimeoutError { .. } | ChooserError::TransportError(_) => {
                ErrorCategory::Network
            }
            ChooserError::RemoteStatusError { .. } | ChooserError::MalformedResponseError { .. } => {
                ErrorCategory::Remote
            }
            ChooserError::ConfigValidationError { .. }
            | ChooserError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ChooserError::IoError(_)
            | ChooserError::SerializationError(_)
            | ChooserError::PrefsFormatError { .. } => ErrorCategory::Storage,
            ChooserError::ProbeInFlightError | ChooserError::WorkerLostError => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Network | ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
            ErrorCategory::Internal => match self {
                ChooserError::ProbeInFlightError => ErrorSeverity::Low,
                _ => ErrorSeverity::Critical,
            },
        }
    }

    /// 網路類錯誤可以直接重試，輸入錯誤需要使用者修改
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Remote
        ) || matches!(self, ChooserError::ProbeInFlightError)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ChooserError::InvalidAddressError { .. } => {
                "Enter the master as scheme://host:port, e.g. http://localhost:11311/"
            }
            ChooserError::TimeoutError { .. } | ChooserError::TransportError(_) => {
                "Check that the master is running and reachable from this network, then retry"
            }
            ChooserError::RemoteStatusError { .. } | ChooserError::MalformedResponseError { .. } => {
                "Make sure the address points at a master and not at some other service"
            }
            ChooserError::ScanFormatError { .. } => "Scan a QR code or plain-text barcode",
            ChooserError::ProbeInFlightError => "Wait for the current probe to finish",
            ChooserError::WorkerLostError => "Retry; if it keeps failing, run with --verbose",
            ChooserError::IoError(_) | ChooserError::SerializationError(_) => {
                "Check permissions of the preferences file and its directory"
            }
            ChooserError::PrefsFormatError { .. } => {
                "Delete or fix the preferences file; it will be recreated on the next successful connect"
            }
            ChooserError::ConfigValidationError { .. }
            | ChooserError::InvalidConfigValueError { .. } => "Fix the configuration file or CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ChooserError::InvalidAddressError { .. } => "Invalid URI.".to_string(),
            ChooserError::TimeoutError { .. }
            | ChooserError::TransportError(_)
            | ChooserError::RemoteStatusError { .. }
            | ChooserError::MalformedResponseError { .. }
            | ChooserError::WorkerLostError => "Master unreachable!".to_string(),
            ChooserError::ProbeInFlightError => "Still trying to reach master...".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChooserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        let err = ChooserError::TimeoutError {
            address: "http://10.0.0.5:11311".to_string(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.is_retryable());
        assert_eq!(err.user_friendly_message(), "Master unreachable!");
    }

    #[test]
    fn test_input_errors_need_user_edit() {
        let err = ChooserError::InvalidAddressError {
            value: "not a uri".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(!err.is_retryable());
        assert_eq!(err.user_friendly_message(), "Invalid URI.");
    }

    #[test]
    fn test_config_error_message_passthrough() {
        let err = ChooserError::ConfigValidationError {
            field: "master.default_uri".to_string(),
            message: "TOML parsing error".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("master.default_uri"));
    }
}
