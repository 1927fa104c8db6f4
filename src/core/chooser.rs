use crate::core::worker::ProbeWorker;
use crate::core::{AddressStore, MasterTransport, Notifier};
use crate::domain::model::{ChooserOutcome, ScanResult, VerificationResult};
use crate::utils::error::Result;

pub const TRYING_NOTICE: &str = "Trying to reach master...";

/// 不含任何畫面的 master 選擇流程狀態
pub struct MasterChooser<S: AddressStore, T: MasterTransport + 'static, N: Notifier> {
    store: S,
    worker: ProbeWorker<T>,
    notifier: N,
    address_text: String,
    input_enabled: bool,
    connect_enabled: bool,
    advanced_visible: bool,
    last_result: Option<VerificationResult>,
}

impl<S: AddressStore, T: MasterTransport + 'static, N: Notifier> MasterChooser<S, T, N> {
    /// 顯示上次使用的位址，沒有的話用預設值
    pub async fn open(
        store: S,
        worker: ProbeWorker<T>,
        notifier: N,
        default_uri: &str,
    ) -> Result<Self> {
        let address_text = match store.load_last_address().await? {
            Some(address) => {
                tracing::debug!("Restored last master address: {}", address);
                address
            }
            None => default_uri.to_string(),
        };

        let mut chooser = Self {
            store,
            worker,
            notifier,
            address_text: String::new(),
            input_enabled: true,
            connect_enabled: false,
            advanced_visible: false,
            last_result: None,
        };
        chooser.set_address_text(address_text);
        Ok(chooser)
    }

    pub fn address_text(&self) -> &str {
        &self.address_text
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn is_connect_enabled(&self) -> bool {
        self.connect_enabled
    }

    pub fn is_advanced_visible(&self) -> bool {
        self.advanced_visible
    }

    pub fn last_result(&self) -> Option<VerificationResult> {
        self.last_result
    }

    pub fn set_address_text(&mut self, text: impl Into<String>) {
        self.address_text = text.into();
        self.connect_enabled = !self.address_text.is_empty();
    }

    pub fn set_advanced(&mut self, checked: bool) {
        self.advanced_visible = checked;
    }

    pub fn apply_scan(&mut self, scan: &ScanResult) -> Result<()> {
        let contents = scan.accepted_contents()?.to_string();
        tracing::info!("📷 Scanned master address: {}", contents);
        self.set_address_text(contents);
        Ok(())
    }

    /// 驗證目前的位址；成功時儲存並回傳結果，失敗時恢復輸入讓使用者重試
    pub async fn connect(&mut self) -> Result<Option<ChooserOutcome>> {
        if !self.connect_enabled || !self.input_enabled {
            tracing::debug!("Connect ignored: control disabled");
            return Ok(None);
        }

        self.input_enabled = false;
        self.connect_enabled = false;
        let address = self.address_text.clone();

        self.notifier.notify(TRYING_NOTICE);
        let result = match self.worker.dispatch(address.clone()) {
            Ok(handle) => handle.wait().await,
            Err(e) => {
                self.restore_input();
                return Err(e);
            }
        };
        self.last_result = Some(result);
        self.notifier.notify(result.notice());

        if result != VerificationResult::Valid {
            self.restore_input();
            return Ok(None);
        }

        if let Err(e) = self.store.store_last_address(&address).await {
            tracing::error!("❌ Failed to store master address: {}", e);
            self.restore_input();
            return Err(e);
        }

        Ok(Some(ChooserOutcome::Connected {
            master_uri: address,
        }))
    }

    pub fn new_master(&self, private: bool) -> ChooserOutcome {
        ChooserOutcome::NewMaster { private }
    }

    pub fn cancel(&self) -> ChooserOutcome {
        ChooserOutcome::Cancelled
    }

    fn restore_input(&mut self) {
        self.input_enabled = true;
        self.connect_enabled = !self.address_text.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::prefs::MemoryAddressStore;
    use crate::core::verifier::EndpointVerifier;
    use crate::domain::model::{MasterIdentity, DEFAULT_MASTER_URI, SCAN_FORMAT_QR_CODE};
    use crate::utils::error::ChooserError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use url::Url;

    /// 只有指定的 host 會回覆
    struct FixedTransport {
        alive_host: &'static str,
    }

    #[async_trait]
    impl MasterTransport for FixedTransport {
        async fn identify(&self, master: &Url, _caller_id: &str) -> Result<MasterIdentity> {
            if master.host_str() == Some(self.alive_host) {
                Ok(MasterIdentity {
                    status_code: 1,
                    status_message: "".to_string(),
                    master_uri: master.to_string(),
                })
            } else {
                Err(ChooserError::MalformedResponseError {
                    message: "no master here".to_string(),
                })
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    async fn chooser(
        store: MemoryAddressStore,
        notifier: RecordingNotifier,
    ) -> MasterChooser<MemoryAddressStore, FixedTransport, RecordingNotifier> {
        let verifier = EndpointVerifier::new(
            FixedTransport {
                alive_host: "10.0.0.5",
            },
            "/test",
            Duration::from_secs(1),
        );
        MasterChooser::open(store, ProbeWorker::new(verifier), notifier, DEFAULT_MASTER_URI)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_uses_default_then_stored_address() {
        let store = MemoryAddressStore::new();
        let c = chooser(store.clone(), RecordingNotifier::default()).await;
        assert_eq!(c.address_text(), DEFAULT_MASTER_URI);
        assert!(c.is_connect_enabled());

        store.store_last_address("http://10.0.0.5:11311").await.unwrap();
        let c = chooser(store, RecordingNotifier::default()).await;
        assert_eq!(c.address_text(), "http://10.0.0.5:11311");
    }

    #[tokio::test]
    async fn test_empty_text_disables_connect() {
        let mut c = chooser(MemoryAddressStore::new(), RecordingNotifier::default()).await;
        c.set_address_text("");
        assert!(!c.is_connect_enabled());
        assert_eq!(c.connect().await.unwrap(), None);
        c.set_address_text("h");
        assert!(c.is_connect_enabled());
    }

    #[tokio::test]
    async fn test_connect_valid_commits_address() {
        let store = MemoryAddressStore::new();
        let notifier = RecordingNotifier::default();
        let mut c = chooser(store.clone(), notifier.clone()).await;

        c.set_address_text("http://10.0.0.5:11311");
        let outcome = c.connect().await.unwrap();

        assert_eq!(
            outcome,
            Some(ChooserOutcome::Connected {
                master_uri: "http://10.0.0.5:11311".to_string()
            })
        );
        assert_eq!(
            store.load_last_address().await.unwrap().as_deref(),
            Some("http://10.0.0.5:11311")
        );
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec![TRYING_NOTICE.to_string(), "Connected!".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_connect_reenables_input() {
        let store = MemoryAddressStore::new();
        let notifier = RecordingNotifier::default();
        let mut c = chooser(store.clone(), notifier.clone()).await;

        c.set_address_text("not a uri");
        assert_eq!(c.connect().await.unwrap(), None);
        assert!(c.is_input_enabled());
        assert!(c.is_connect_enabled());

        c.set_address_text("http://192.0.2.1:11311");
        assert_eq!(c.connect().await.unwrap(), None);
        assert!(c.is_input_enabled());
        assert_eq!(c.last_result(), Some(VerificationResult::Unreachable));

        assert_eq!(store.load_last_address().await.unwrap(), None);
        let messages = notifier.messages.lock().unwrap().clone();
        assert_eq!(messages[1], "Invalid URI.");
        assert_eq!(messages[3], "Master unreachable!");
    }

    #[tokio::test]
    async fn test_scan_and_outcomes() {
        let mut c = chooser(MemoryAddressStore::new(), RecordingNotifier::default()).await;

        c.apply_scan(&ScanResult::new(SCAN_FORMAT_QR_CODE, "http://10.0.0.5:11311"))
            .unwrap();
        assert_eq!(c.address_text(), "http://10.0.0.5:11311");

        assert!(c.apply_scan(&ScanResult::new("EAN_13", "123")).is_err());
        assert_eq!(c.address_text(), "http://10.0.0.5:11311");

        c.set_advanced(true);
        assert!(c.is_advanced_visible());
        assert_eq!(c.new_master(true), ChooserOutcome::NewMaster { private: true });
        assert_eq!(c.cancel(), ChooserOutcome::Cancelled);
    }
}
