use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::StorageFormat;
use crate::models::game_data::GameData;
use crate::utils::codec;
use crate::utils::error::AppResult;

/// 本地存档仓库。内存里持有一份 GameData，每次写入键值立即落盘，
/// 行为对齐原模板的 SaveGameManager/FileHandler。
pub struct LocalStore {
    path: PathBuf,
    format: StorageFormat,
    storage: RwLock<GameData>,
}

impl LocalStore {
    /// 打开本地存档。文件不存在时从空记录开始，这不算错误。
    pub fn open(path: impl Into<PathBuf>, format: StorageFormat) -> AppResult<Self> {
        let path = path.into();
        let storage = if path.exists() {
            let bytes = fs::read(&path)?;
            codec::decode(&bytes, format)?
        } else {
            log::info!("本地存档 {} 不存在，使用空记录", path.display());
            GameData::new()
        };
        Ok(Self {
            path,
            format,
            storage: RwLock::new(storage),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }

    /// 当前内存记录的一份拷贝，保存路径整体序列化它。
    pub fn snapshot(&self) -> GameData {
        self.storage.read().expect("存档锁中毒").clone()
    }

    /// 用云端下来的记录整体覆盖内存并落盘（加载路径）。
    pub fn overwrite(&self, data: GameData) -> AppResult<()> {
        {
            let mut guard = self.storage.write().expect("存档锁中毒");
            *guard = data;
        }
        self.persist()
    }

    pub fn persist(&self) -> AppResult<()> {
        let bytes = {
            let guard = self.storage.read().expect("存档锁中毒");
            codec::encode(&guard, self.format)?
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    pub fn set_bool(&self, key: &str, value: bool) -> AppResult<()> {
        self.storage.write().expect("存档锁中毒").set_bool(key, value);
        self.persist()
    }

    pub fn set_int(&self, key: &str, value: i64) -> AppResult<()> {
        self.storage.write().expect("存档锁中毒").set_int(key, value);
        self.persist()
    }

    pub fn set_float(&self, key: &str, value: f64) -> AppResult<()> {
        self.storage.write().expect("存档锁中毒").set_float(key, value);
        self.persist()
    }

    pub fn set_string(&self, key: &str, value: &str) -> AppResult<()> {
        self.storage.write().expect("存档锁中毒").set_string(key, value);
        self.persist()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.storage.read().expect("存档锁中毒").get_bool(key, default)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.storage.read().expect("存档锁中毒").get_int(key, default)
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.storage.read().expect("存档锁中毒").get_float(key, default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.storage.read().expect("存档锁中毒").get_string(key, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_save_path(name: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "playsave_store_{}_{}_{n}_{name}",
            std::process::id(),
            name.len()
        ))
    }

    #[test]
    fn missing_file_starts_empty() {
        let store = LocalStore::open(temp_save_path("missing.json"), StorageFormat::Json).unwrap();
        assert!(store.snapshot().is_empty());
        assert!(!store.file_exists());
    }

    #[test]
    fn set_persists_and_survives_reopen() {
        let path = temp_save_path("reopen.json");
        {
            let store = LocalStore::open(&path, StorageFormat::Json).unwrap();
            store.set_int("coins", 77).unwrap();
            store.set_string("player", "小红").unwrap();
        }
        let store = LocalStore::open(&path, StorageFormat::Json).unwrap();
        assert_eq!(store.get_int("coins", 0), 77);
        assert_eq!(store.get_string("player", ""), "小红");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn binary_format_round_trips_through_disk() {
        let path = temp_save_path("reopen.dat");
        {
            let store = LocalStore::open(&path, StorageFormat::Binary).unwrap();
            store.set_bool("tutorial_done", true).unwrap();
        }
        // 磁盘上是密文
        let raw = fs::read(&path).unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());

        let store = LocalStore::open(&path, StorageFormat::Binary).unwrap();
        assert!(store.get_bool("tutorial_done", false));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn overwrite_replaces_disk_content() {
        let path = temp_save_path("overwrite.json");
        let store = LocalStore::open(&path, StorageFormat::Json).unwrap();
        store.set_int("coins", 1).unwrap();

        let mut cloud = GameData::new();
        cloud.set_int("coins", 999);
        store.overwrite(cloud).unwrap();

        let reopened = LocalStore::open(&path, StorageFormat::Json).unwrap();
        assert_eq!(reopened.get_int("coins", 0), 999);
        fs::remove_file(&path).ok();
    }
}
