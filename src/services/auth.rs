use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::AppConfig;
use crate::utils::error::{AppError, AppResult};

// 登录交互模式，对应原模板的 SignInInteractivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMode {
    PromptOnce,
    PromptAlways,
    NoPrompt,
}

// 一次登录走交互路径还是缓存令牌路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginPath {
    Interactive,
    Cached,
}

// 模式到路径的判定。PromptOnce 在本进程已经有过交互式尝试后退回缓存路径，
// NoPrompt 任何情况下都不交互。
fn choose_path(mode: SignInMode, interactive_attempted: bool) -> LoginPath {
    match mode {
        SignInMode::PromptAlways => LoginPath::Interactive,
        SignInMode::NoPrompt => LoginPath::Cached,
        SignInMode::PromptOnce if !interactive_attempted => LoginPath::Interactive,
        SignInMode::PromptOnce => LoginPath::Cached,
    }
}

/// 登录后的玩家会话。令牌本身归云端所有，这里只拿来放进请求头。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub object_id: String,
    pub nickname: String,
    pub session_token: String,
}

/// 认证网关。同步控制器通过它判断登录态并发起登录，
/// 测试里用内存假实现替换 HTTP 实现。
#[allow(async_fn_in_trait)]
pub trait AuthGateway {
    fn session(&self) -> Option<PlayerSession>;

    fn signed_in(&self) -> bool {
        self.session().is_some()
    }

    async fn sign_in(&self, mode: SignInMode) -> AppResult<PlayerSession>;

    fn sign_out(&self);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    object_id: String,
    #[serde(default)]
    nickname: String,
    session_token: String,
}

pub struct HttpAuthGateway {
    client: Client,
    config: Arc<AppConfig>,
    session: RwLock<Option<PlayerSession>>,
    // PromptOnce 模式下本进程是否已经交互式登录过
    interactive_attempted: AtomicBool,
}

impl HttpAuthGateway {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("构建 HTTP 客户端失败，回退默认设置: {e}");
                Client::new()
            });
        Self {
            client,
            config,
            session: RwLock::new(None),
            interactive_attempted: AtomicBool::new(false),
        }
    }

    fn vendor_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append("User-Agent", "PlaySave-Rust-SDK/0.1".parse().unwrap());
        if let Ok(v) = self.config.vendor_app_id.parse() {
            headers.append("X-LC-Id", v);
        }
        if let Ok(v) = self.config.vendor_app_key.parse() {
            headers.append("X-LC-Key", v);
        }
        headers.append("Content-Type", "application/json".parse().unwrap());
        headers
    }

    // 交互式登录：提交设备凭据换取会话
    async fn interactive_login(&self) -> AppResult<PlayerSession> {
        let body = serde_json::json!({
            "deviceId": self.config.device_id,
            "deviceSecret": self.config.device_secret,
        });
        let response = self
            .client
            .post(format!("{}/login", self.config.vendor_base_url))
            .headers(self.vendor_headers())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::AuthError(format!(
                "登录请求被拒绝，状态码 {}",
                response.status()
            )));
        }

        let login: LoginResponse = response.json().await?;
        Ok(PlayerSession {
            object_id: login.object_id,
            nickname: login.nickname,
            session_token: login.session_token,
        })
    }

    // 静默路径：只用缓存令牌，不发起交互
    async fn cached_login(&self) -> AppResult<PlayerSession> {
        let token = self
            .config
            .cached_session_token
            .clone()
            .ok_or_else(|| AppError::AuthError("没有缓存的会话令牌".to_string()))?;

        let response = self
            .client
            .get(format!("{}/users/me", self.config.vendor_base_url))
            .headers(self.vendor_headers())
            .header("X-LC-Session", &token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::AuthError(format!(
                "缓存令牌校验失败，状态码 {}",
                response.status()
            )));
        }

        let login: LoginResponse = response.json().await?;
        Ok(PlayerSession {
            object_id: login.object_id,
            nickname: login.nickname,
            session_token: token,
        })
    }
}

impl AuthGateway for HttpAuthGateway {
    fn session(&self) -> Option<PlayerSession> {
        self.session.read().expect("会话锁中毒").clone()
    }

    async fn sign_in(&self, mode: SignInMode) -> AppResult<PlayerSession> {
        let attempted = self.interactive_attempted.load(Ordering::SeqCst);
        let path = choose_path(mode, attempted);
        // 任何一次交互式尝试都计入，失败的也算
        if path == LoginPath::Interactive {
            self.interactive_attempted.store(true, Ordering::SeqCst);
        }

        let result = match path {
            LoginPath::Interactive => self.interactive_login().await,
            LoginPath::Cached => self.cached_login().await,
        };

        match result {
            Ok(session) => {
                log::info!("登录成功: {} ({})", session.nickname, session.object_id);
                *self.session.write().expect("会话锁中毒") = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                log::warn!("登录失败: {e}");
                Err(e)
            }
        }
    }

    fn sign_out(&self) {
        *self.session.write().expect("会话锁中毒") = None;
    }
}
