use crate::utils::error::{ChooserError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub const DEFAULT_MASTER_URI: &str = "http://localhost:11311/";
pub const DEFAULT_CALLER_ID: &str = "/android/master_chooser_activity";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

pub const SCAN_FORMAT_TEXT: &str = "TEXT_TYPE";
pub const SCAN_FORMAT_QR_CODE: &str = "QR_CODE";

/// 使用者輸入的 master 位址，全程以文字保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 解析成 scheme + host + port，失敗時不做任何網路動作
    pub fn to_url(&self) -> Result<Url> {
        if self.0.trim().is_empty() {
            return Err(self.invalid("Address cannot be empty".to_string()));
        }

        let url = Url::parse(&self.0).map_err(|e| self.invalid(format!("{}", e)))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(self.invalid(format!("Unsupported URL scheme: {}", scheme))),
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(self.invalid("Address has no host".to_string())),
        }

        if url.port_or_known_default().is_none() {
            return Err(self.invalid("Address has no port".to_string()));
        }

        Ok(url)
    }

    fn invalid(&self, reason: String) -> ChooserError {
        ChooserError::InvalidAddressError {
            value: self.0.clone(),
            reason,
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EndpointAddress {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for EndpointAddress {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Valid,
    InvalidSyntax,
    Unreachable,
}

impl VerificationResult {
    /// 顯示給使用者的短訊息
    pub fn notice(&self) -> &'static str {
        match self {
            VerificationResult::Valid => "Connected!",
            VerificationResult::InvalidSyntax => "Invalid URI.",
            VerificationResult::Unreachable => "Master unreachable!",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid)
    }
}

impl From<&ChooserError> for VerificationResult {
    fn from(err: &ChooserError) -> Self {
        match err {
            ChooserError::InvalidAddressError { .. } => VerificationResult::InvalidSyntax,
            // 其餘 (逾時、連線失敗、內部錯誤) 對使用者來說都是連不上
            _ => VerificationResult::Unreachable,
        }
    }
}

/// `getUri` 的回覆: [code, statusMessage, uri]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterIdentity {
    pub status_code: i32,
    pub status_message: String,
    pub master_uri: String,
}

/// 外部 QR 掃描程式回傳的結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub format: String,
    pub contents: String,
}

impl ScanResult {
    pub fn new(format: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            contents: contents.into(),
        }
    }

    pub fn accepted_contents(&self) -> Result<&str> {
        match self.format.as_str() {
            SCAN_FORMAT_TEXT | SCAN_FORMAT_QR_CODE => Ok(&self.contents),
            other => Err(ChooserError::ScanFormatError {
                format: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChooserOutcome {
    Connected { master_uri: String },
    NewMaster { private: bool },
    Cancelled,
}
