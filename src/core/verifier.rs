use crate::core::{ConfigProvider, MasterTransport};
use crate::domain::model::{EndpointAddress, MasterIdentity, VerificationResult};
use crate::utils::error::{ChooserError, Result};
use std::time::Duration;

pub struct EndpointVerifier<T: MasterTransport> {
    transport: T,
    caller_id: String,
    timeout: Duration,
}

impl<T: MasterTransport> EndpointVerifier<T> {
    pub fn new(transport: T, caller_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            caller_id: caller_id.into(),
            timeout,
        }
    }

    pub fn from_config<C: ConfigProvider>(transport: T, config: &C) -> Self {
        Self::new(transport, config.caller_id(), config.probe_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 解析並探測一次，所有錯誤都在這裡轉成結果值
    pub async fn verify(&self, address: &str) -> VerificationResult {
        match self.probe(address).await {
            Ok(identity) => {
                tracing::info!(
                    "✅ Master {} answered ({})",
                    address,
                    identity.master_uri
                );
                VerificationResult::Valid
            }
            Err(e) => {
                let result = VerificationResult::from(&e);
                tracing::warn!(
                    "❌ Master {} check failed: {} (Category: {:?}) -> {:?}",
                    address,
                    e,
                    e.category(),
                    result
                );
                result
            }
        }
    }

    /// 同 `verify`，但保留詳細錯誤
    pub async fn probe(&self, address: &str) -> Result<MasterIdentity> {
        let url = EndpointAddress::new(address).to_url()?;

        tracing::debug!("Probing master at {} (timeout {:?})", url, self.timeout);
        match tokio::time::timeout(self.timeout, self.transport.identify(&url, &self.caller_id))
            .await
        {
            Ok(reply) => reply,
            Err(_) => Err(ChooserError::TimeoutError {
                address: address.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}
