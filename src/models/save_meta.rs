use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 云端存档槽的元数据。描述串在每次写入时重新生成并带上当前时间。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub slot_name: String,
    pub description: String,
    pub modified_at: DateTime<Utc>,
    pub played_seconds: f64,
    pub checksum: String,
}

impl SaveMetadata {
    // 写路径上生成新一版元数据
    pub fn for_write(slot_name: &str, played_seconds: f64, checksum: &str) -> Self {
        let now = Utc::now();
        Self {
            object_id: None,
            slot_name: slot_name.to_string(),
            description: format!("Saved at: {now}"),
            modified_at: now,
            played_seconds,
            checksum: checksum.to_string(),
        }
    }
}

/// 云端返回的原始存档记录：元数据加 base64 负载。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRecord {
    #[serde(flatten)]
    pub meta: SaveMetadata,
    // base64 编码的存档字节，可能为空串（槽位存在但从未提交数据）
    #[serde(default)]
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_metadata_embeds_timestamp() {
        let meta = SaveMetadata::for_write("SaveGameFileName", 12.0, "abc123");
        assert!(meta.description.starts_with("Saved at: "));
        assert!(meta
            .description
            .contains(&meta.modified_at.format("%Y").to_string()));
        assert_eq!(meta.checksum, "abc123");
    }

    #[test]
    fn slot_record_data_defaults_to_empty() {
        let json = r#"{
            "objectId": "obj1",
            "slot_name": "SaveGameFileName",
            "description": "Saved at: x",
            "modified_at": "2026-01-01T00:00:00Z",
            "played_seconds": 3.5,
            "checksum": ""
        }"#;
        let record: SlotRecord = serde_json::from_str(json).unwrap();
        assert!(record.data.is_empty());
        assert_eq!(record.meta.object_id.as_deref(), Some("obj1"));
    }
}
