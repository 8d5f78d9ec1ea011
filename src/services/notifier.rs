use crate::models::events::Notice;

/// 弹窗/日志输出的接口。真正的弹窗组件在宿主程序里，
/// 不接组件时用 LogNotifier 只落日志。
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        if notice.log_only || notice.title.is_empty() {
            log::info!("{}", notice.message);
        } else {
            log::info!("[{}] {}", notice.title, notice.message);
        }
    }
}
