use serde::{Deserialize, Serialize};

/// 同步流程对外广播的事件，对应原模板里的各个委托回调。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    SignedIn,
    SignInFailed,
    SignedOut,
    DataSaved,
    DataSaveFailed,
    DataLoaded,
    DataLoadFailed,
    NoDataFound,
}

/// 弹窗边界消费的三元组 (title, message, log_only)。
/// UI 组件在本 crate 之外，这里只负责把内容递出去。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub log_only: bool,
}

impl Notice {
    pub fn log(message: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            message: message.into(),
            log_only: true,
        }
    }

    pub fn popup(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            log_only: false,
        }
    }
}
