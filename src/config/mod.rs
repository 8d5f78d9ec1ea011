use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

// 云端冲突解决策略：多端写入同一个存档槽时由哪个版本胜出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    MostRecentlySaved,
    LongestPlaytime,
}

impl ConflictStrategy {
    fn parse(s: &str) -> AppResult<Self> {
        match s {
            "most_recently_saved" => Ok(ConflictStrategy::MostRecentlySaved),
            "longest_playtime" => Ok(ConflictStrategy::LongestPlaytime),
            other => Err(AppError::ConfigError(format!(
                "未知的冲突解决策略: {other}"
            ))),
        }
    }
}

// 本地存档文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFormat {
    Json,
    Binary,
}

impl StorageFormat {
    fn parse(s: &str) -> AppResult<Self> {
        match s {
            "json" => Ok(StorageFormat::Json),
            "binary" => Ok(StorageFormat::Binary),
            other => Err(AppError::ConfigError(format!("未知的存档格式: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub vendor_base_url: String,
    pub vendor_app_id: String,
    pub vendor_app_key: String,
    // 设备凭据，交互式登录时提交
    pub device_id: String,
    pub device_secret: String,
    // 可选的缓存会话令牌，NoPrompt 模式只依赖它
    pub cached_session_token: Option<String>,
    pub save_slot_name: String,
    pub conflict_strategy: ConflictStrategy,
    pub storage_format: StorageFormat,
    pub local_save_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vendor_base_url: "https://playsave.example.com/1.1".to_string(),
            vendor_app_id: "rAK3FfdieFob2Nn8Am".to_string(),
            vendor_app_key: "Qr9AEqtuoSVS3zeD6iVbM4ZC0AtkJcQ89tywVyi0".to_string(),
            device_id: "dev-local".to_string(),
            device_secret: String::new(),
            cached_session_token: None,
            save_slot_name: "SaveGameFileName".to_string(),
            conflict_strategy: ConflictStrategy::MostRecentlySaved,
            storage_format: StorageFormat::Json,
            local_save_path: PathBuf::from("GameData.json"),
            connect_timeout_secs: 3,
            request_timeout_secs: 12,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let conflict_strategy = match env::var("CONFLICT_STRATEGY") {
            Ok(v) => ConflictStrategy::parse(&v)?,
            Err(_) => defaults.conflict_strategy,
        };
        let storage_format = match env::var("STORAGE_FORMAT") {
            Ok(v) => StorageFormat::parse(&v)?,
            Err(_) => defaults.storage_format,
        };

        // 二进制格式默认换用 .dat 后缀，和 JSON 存档区分开
        let default_path = match storage_format {
            StorageFormat::Json => "GameData.json",
            StorageFormat::Binary => "GameData.dat",
        };

        Ok(Self {
            vendor_base_url: env::var("VENDOR_BASE_URL")
                .unwrap_or_else(|_| defaults.vendor_base_url.clone()),
            vendor_app_id: env::var("VENDOR_APP_ID")
                .unwrap_or_else(|_| defaults.vendor_app_id.clone()),
            vendor_app_key: env::var("VENDOR_APP_KEY")
                .unwrap_or_else(|_| defaults.vendor_app_key.clone()),
            device_id: env::var("DEVICE_ID").unwrap_or_else(|_| defaults.device_id.clone()),
            device_secret: env::var("DEVICE_SECRET").unwrap_or_default(),
            cached_session_token: env::var("SESSION_TOKEN").ok(),
            save_slot_name: env::var("SAVE_SLOT_NAME")
                .unwrap_or_else(|_| defaults.save_slot_name.clone()),
            conflict_strategy,
            storage_format,
            local_save_path: env::var("LOCAL_SAVE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(default_path)),
            connect_timeout_secs: defaults.connect_timeout_secs,
            request_timeout_secs: defaults.request_timeout_secs,
        })
    }
}

// AES加密配置
pub const AES_KEY_BASE64: &str = "6Jaa0qVAJZuXkZCLiOa/Ax5tIZVu+taKUN1V1nqwkks=";
pub const AES_IV_BASE64: &str = "Kk/wisgNYwcAV8WVGMgyUw==";
