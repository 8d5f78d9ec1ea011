pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{AppConfig, ConflictStrategy, StorageFormat};
pub use models::events::{Notice, SyncEvent};
pub use models::game_data::GameData;
pub use models::save_meta::{SaveMetadata, SlotRecord};
pub use services::auth::{AuthGateway, HttpAuthGateway, PlayerSession, SignInMode};
pub use services::cloud::{HttpSaveRemote, SaveSlotRemote};
pub use services::notifier::{LogNotifier, Notifier};
pub use services::storage::LocalStore;
pub use services::sync::{SyncController, SyncState};
pub use utils::error::{AppError, AppResult};
