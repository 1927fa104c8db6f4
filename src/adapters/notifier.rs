use crate::core::Notifier;

/// 只寫到日誌
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::info!("💬 {}", message);
    }
}

/// CLI 使用：訊息直接印到 stderr，保留 stdout 給 JSON 結果
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        tracing::debug!("notice: {}", message);
        eprintln!("{}", message);
    }
}
