use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("AES错误: {0}")]
    AesError(String),

    #[error("认证错误: {0}")]
    AuthError(String),

    #[error("用户未登录")]
    NotAuthenticated,

    #[error("打开存档槽失败: {0}")]
    SessionOpenError(String),

    #[error("云端读取失败: {0}")]
    RemoteReadError(String),

    #[error("云端写入失败: {0}")]
    RemoteWriteError(String),

    #[error("同步操作进行中，拒绝新的{0}请求")]
    Busy(&'static str),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("解码错误: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP请求错误: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Serde JSON错误: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("其他错误: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
