use crate::core::verifier::EndpointVerifier;
use crate::core::MasterTransport;
use crate::domain::model::VerificationResult;
use crate::utils::error::{ChooserError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// 在背景 task 執行探測，同一時間只允許一個
pub struct ProbeWorker<T: MasterTransport + 'static> {
    verifier: Arc<EndpointVerifier<T>>,
    in_flight: Arc<AtomicBool>,
}

/// 任務結束 (包含 panic) 時釋放旗標
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ProbeHandle {
    receiver: oneshot::Receiver<VerificationResult>,
}

impl ProbeHandle {
    pub async fn wait(self) -> VerificationResult {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => {
                let err = ChooserError::WorkerLostError;
                tracing::error!("❌ {} (Category: {:?})", err, err.category());
                VerificationResult::from(&err)
            }
        }
    }
}

impl<T: MasterTransport + 'static> ProbeWorker<T> {
    pub fn new(verifier: EndpointVerifier<T>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn verifier(&self) -> &EndpointVerifier<T> {
        &self.verifier
    }

    pub fn dispatch(&self, address: impl Into<String>) -> Result<ProbeHandle> {
        let (sender, receiver) = oneshot::channel();
        self.spawn(address.into(), move |result| {
            // 呼叫端可能已經放棄等待
            let _ = sender.send(result);
        })?;
        Ok(ProbeHandle { receiver })
    }

    pub fn dispatch_with<F>(&self, address: impl Into<String>, on_result: F) -> Result<()>
    where
        F: FnOnce(VerificationResult) + Send + 'static,
    {
        self.spawn(address.into(), on_result)
    }

    fn spawn<F>(&self, address: String, deliver: F) -> Result<()>
    where
        F: FnOnce(VerificationResult) + Send + 'static,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Rejecting probe of {}: another probe is running", address);
            return Err(ChooserError::ProbeInFlightError);
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let verifier = Arc::clone(&self.verifier);

        tokio::spawn(async move {
            let result = verifier.verify(&address).await;
            // 先釋放再通知，收到結果的一方可以立刻重試
            drop(guard);
            deliver(result);
        });

        Ok(())
    }
}
