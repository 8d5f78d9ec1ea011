use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// 累计游玩时长的保留键，写入云端元数据时从这里取
pub const PLAY_TIME_KEY: &str = "playTime";

/// 游戏数据记录：四张按类型分开的键值表。
///
/// 整条记录在加载时被云端数据整体覆盖，保存时整体序列化，
/// 没有嵌套结构，也没有版本号。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub bool_data: HashMap<String, bool>,
    #[serde(default)]
    pub int_data: HashMap<String, i64>,
    #[serde(default)]
    pub float_data: HashMap<String, f64>,
    #[serde(default)]
    pub string_data: HashMap<String, String>,
}

impl GameData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.bool_data.insert(key.to_string(), value);
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.int_data.insert(key.to_string(), value);
    }

    pub fn set_float(&mut self, key: &str, value: f64) {
        self.float_data.insert(key.to_string(), value);
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.string_data.insert(key.to_string(), value.to_string());
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.bool_data.get(key).copied().unwrap_or(default)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.int_data.get(key).copied().unwrap_or(default)
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.float_data.get(key).copied().unwrap_or(default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.string_data
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    // 云端元数据里的累计游玩秒数
    pub fn played_seconds(&self) -> f64 {
        self.get_float(PLAY_TIME_KEY, 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.bool_data.is_empty()
            && self.int_data.is_empty()
            && self.float_data.is_empty()
            && self.string_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_with_defaults() {
        let mut data = GameData::new();
        data.set_bool("sound", true);
        data.set_int("coins", 120);
        data.set_float(PLAY_TIME_KEY, 360.5);
        data.set_string("player", "测试玩家");

        assert!(data.get_bool("sound", false));
        assert_eq!(data.get_int("coins", 0), 120);
        assert_eq!(data.get_string("player", ""), "测试玩家");
        assert_eq!(data.played_seconds(), 360.5);

        // 缺失键返回调用方给出的默认值
        assert_eq!(data.get_int("gems", 7), 7);
        assert_eq!(data.get_string("title", "none"), "none");
    }

    #[test]
    fn deserialize_with_missing_maps() {
        // 每张表都有 serde(default)，旧存档缺字段也能读
        let data: GameData = serde_json::from_str(r#"{"int_data":{"level":3}}"#).unwrap();
        assert_eq!(data.get_int("level", 0), 3);
        assert!(data.bool_data.is_empty());
    }

    #[test]
    fn overwrite_replaces_whole_record() {
        let mut data = GameData::new();
        data.set_int("coins", 1);
        let fresh = GameData::new();
        data = fresh;
        assert!(data.is_empty());
    }
}
