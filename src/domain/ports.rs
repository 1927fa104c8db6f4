use crate::domain::model::MasterIdentity;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// 上次使用的位址，以不透明字串保存
pub trait AddressStore: Send + Sync {
    fn load_last_address(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn store_last_address(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn default_master_uri(&self) -> &str;
    fn caller_id(&self) -> &str;
    fn probe_timeout(&self) -> Duration;
    fn prefs_path(&self) -> &str;
}

/// 對 master 發出的 "identify yourself" 呼叫
#[async_trait]
pub trait MasterTransport: Send + Sync {
    async fn identify(&self, master: &Url, caller_id: &str) -> Result<MasterIdentity>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
