pub mod auth;
pub mod cloud;
pub mod notifier;
pub mod storage;
pub mod sync;
