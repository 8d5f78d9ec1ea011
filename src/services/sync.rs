use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::{AppConfig, StorageFormat};
use crate::models::events::{Notice, SyncEvent};
use crate::models::game_data::GameData;
use crate::models::save_meta::SaveMetadata;
use crate::services::auth::{AuthGateway, PlayerSession, SignInMode};
use crate::services::cloud::SaveSlotRemote;
use crate::services::notifier::{LogNotifier, Notifier};
use crate::services::storage::LocalStore;
use crate::utils::codec;
use crate::utils::crypto;
use crate::utils::error::{AppError, AppResult};

// 云端负载固定用 JSON，本地文件格式另由配置决定
const REMOTE_FORMAT: StorageFormat = StorageFormat::Json;

/// 同步流程状态机。每条失败边都会在发完事件后回到 Idle。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Authenticating,
    SessionOpening,
    Reading,
    Writing,
}

struct StateCell(Mutex<SyncState>);

// 占用状态机直到本次操作结束，Drop 时无条件回 Idle
struct StateGuard<'a> {
    cell: &'a StateCell,
}

impl StateCell {
    fn new() -> Self {
        Self(Mutex::new(SyncState::Idle))
    }

    fn current(&self) -> SyncState {
        *self.0.lock().expect("状态锁中毒")
    }

    // 只有 Idle 状态能开始新操作；进行中时立刻拒绝，不排队
    fn begin(&self, op: &'static str, next: SyncState) -> AppResult<StateGuard<'_>> {
        let mut state = self.0.lock().expect("状态锁中毒");
        if *state != SyncState::Idle {
            log::warn!("状态机处于 {state:?}，拒绝{op}请求");
            return Err(AppError::Busy(op));
        }
        *state = next;
        Ok(StateGuard { cell: self })
    }

    fn transition(&self, next: SyncState) {
        *self.0.lock().expect("状态锁中毒") = next;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.cell.transition(SyncState::Idle);
    }
}

/// 同步控制器：登录 → 打开存档槽 → 读/写路径 → 事件广播。
///
/// 网关和云端都是注入进来的，没有全局单例；事件通过无界通道
/// 扇出给订阅者，按发射顺序送达，掉线的订阅者在下次发射时清理。
pub struct SyncController<A: AuthGateway, R: SaveSlotRemote> {
    auth: A,
    remote: R,
    store: Arc<LocalStore>,
    config: Arc<AppConfig>,
    notifier: Box<dyn Notifier>,
    state: StateCell,
    subscribers: Mutex<Vec<UnboundedSender<SyncEvent>>>,
}

impl<A: AuthGateway, R: SaveSlotRemote> SyncController<A, R> {
    pub fn new(auth: A, remote: R, store: Arc<LocalStore>, config: Arc<AppConfig>) -> Self {
        Self {
            auth,
            remote,
            store,
            config,
            notifier: Box::new(LogNotifier),
            state: StateCell::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn state(&self) -> SyncState {
        self.state.current()
    }

    /// 订阅同步事件。接收端被丢弃后会在之后的发射中被清理掉。
    pub fn subscribe(&self) -> UnboundedReceiver<SyncEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().expect("订阅锁中毒").push(tx);
        rx
    }

    fn emit(&self, event: SyncEvent) {
        log::debug!("发射事件 {event:?}");
        self.subscribers
            .lock()
            .expect("订阅锁中毒")
            .retain(|tx| tx.send(event).is_ok());
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(&notice);
    }

    /// 登录。每次调用恰好产生 SignedIn / SignInFailed 之一。
    pub async fn sign_in(&self, mode: SignInMode) -> AppResult<PlayerSession> {
        let _guard = self.state.begin("登录", SyncState::Authenticating)?;

        match self.auth.sign_in(mode).await {
            Ok(session) => {
                self.notify(Notice::popup(
                    "Success",
                    format!("Signed in as {}", session.nickname),
                ));
                self.emit(SyncEvent::SignedIn);
                Ok(session)
            }
            Err(e) => {
                self.notify(Notice::popup("Failed", format!("Failed to sign in: {e}")));
                self.emit(SyncEvent::SignInFailed);
                Err(e)
            }
        }
    }

    pub fn sign_out(&self) {
        self.auth.sign_out();
        self.notify(Notice::popup("Success", "Signed Out"));
        self.emit(SyncEvent::SignedOut);
    }

    // 未登录时两个失败事件都发，对齐原模板 OpenSave 的行为
    fn require_session(&self) -> AppResult<PlayerSession> {
        match self.auth.session() {
            Some(session) => Ok(session),
            None => {
                self.notify(Notice::log("User is not authenticated"));
                self.emit(SyncEvent::DataSaveFailed);
                self.emit(SyncEvent::DataLoadFailed);
                Err(AppError::NotAuthenticated)
            }
        }
    }

    /// 写路径：打开存档槽 → 序列化本地记录 → 提交负载和新元数据。
    pub async fn save(&self) -> AppResult<SaveMetadata> {
        let _guard = self.state.begin("保存", SyncState::SessionOpening)?;
        let session = self.require_session()?;

        self.notify(Notice::log("Attempting to save..."));
        let existing = match self.remote.open_slot(&session).await {
            Ok(existing) => existing,
            Err(e) => {
                self.notify(Notice::popup("Failed", "Failed to open save data"));
                self.emit(SyncEvent::DataSaveFailed);
                return Err(e);
            }
        };

        self.state.transition(SyncState::Writing);
        let snapshot = self.store.snapshot();
        let payload = match codec::encode(&snapshot, REMOTE_FORMAT) {
            Ok(payload) => payload,
            Err(e) => {
                self.emit(SyncEvent::DataSaveFailed);
                return Err(e);
            }
        };
        let checksum = crypto::calculate_md5(&payload);
        let meta = SaveMetadata::for_write(
            &self.config.save_slot_name,
            snapshot.played_seconds(),
            &checksum,
        );

        match self
            .remote
            .write(&session, existing.as_ref(), &payload, meta)
            .await
        {
            Ok(committed) => {
                self.notify(Notice::popup("Success", "Successfully saved to the cloud."));
                self.emit(SyncEvent::DataSaved);
                Ok(committed)
            }
            Err(e) => {
                self.notify(Notice::popup("Failed", "Failed to save to cloud"));
                self.emit(SyncEvent::DataSaveFailed);
                Err(e)
            }
        }
    }

    /// 读路径：打开存档槽 → 拉取负载 → 解码成功后才覆盖本地。
    /// 槽位为空或负载为空时本地保持原样。
    pub async fn load(&self) -> AppResult<Option<GameData>> {
        let _guard = self.state.begin("加载", SyncState::SessionOpening)?;
        let session = self.require_session()?;

        self.notify(Notice::log("Attempting to load..."));
        let record = match self.remote.open_slot(&session).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.notify(Notice::log("No data found on the cloud."));
                self.emit(SyncEvent::NoDataFound);
                return Ok(None);
            }
            Err(e) => {
                self.notify(Notice::popup("Failed", "Failed to open save data"));
                self.emit(SyncEvent::DataLoadFailed);
                return Err(e);
            }
        };

        self.state.transition(SyncState::Reading);
        let payload = match self.remote.read(&session, &record).await {
            Ok(payload) => payload,
            Err(e) => {
                self.notify(Notice::popup("Failed", "Failed to load data"));
                self.emit(SyncEvent::DataLoadFailed);
                return Err(e);
            }
        };

        if payload.is_empty() {
            self.notify(Notice::log("No data found on the cloud."));
            self.emit(SyncEvent::NoDataFound);
            return Ok(None);
        }

        // 校验和只告警不拦截，云端旧记录可能没有校验和
        if !record.meta.checksum.is_empty() {
            let actual = crypto::calculate_md5(&payload);
            if actual != record.meta.checksum {
                log::warn!(
                    "存档校验和不匹配: 期望 {}, 实际 {actual}",
                    record.meta.checksum
                );
            }
        }

        // 先解码再动本地仓库，坏负载不会留下半套数据
        let data = match codec::decode(&payload, REMOTE_FORMAT) {
            Ok(data) => data,
            Err(e) => {
                self.notify(Notice::popup("Failed", "Cloud save is corrupted"));
                self.emit(SyncEvent::DataLoadFailed);
                return Err(e);
            }
        };

        if let Err(e) = self.store.overwrite(data.clone()) {
            self.emit(SyncEvent::DataLoadFailed);
            return Err(e);
        }

        self.notify(Notice::log("Data downloaded from cloud and saved to disk."));
        self.emit(SyncEvent::DataLoaded);
        Ok(Some(data))
    }
}
