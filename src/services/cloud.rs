use base64::{engine::general_purpose, Engine as _};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, ConflictStrategy};
use crate::models::save_meta::{SaveMetadata, SlotRecord};
use crate::services::auth::PlayerSession;
use crate::utils::error::{AppError, AppResult};

/// 云端存档槽的访问接口：打开（带冲突解决）、读负载、写负载。
/// HTTP 实现之外，测试用内存假实现。
#[allow(async_fn_in_trait)]
pub trait SaveSlotRemote {
    /// 查询固定槽名下的所有版本并按策略选出胜者。
    /// 槽位从未被写过时返回 None。
    async fn open_slot(&self, session: &PlayerSession) -> AppResult<Option<SlotRecord>>;

    /// 取回存档字节。槽位存在但没有负载时返回空向量。
    async fn read(&self, session: &PlayerSession, record: &SlotRecord) -> AppResult<Vec<u8>>;

    /// 创建或更新槽记录，负载以 base64 提交，元数据整体刷新。
    async fn write(
        &self,
        session: &PlayerSession,
        existing: Option<&SlotRecord>,
        payload: &[u8],
        meta: SaveMetadata,
    ) -> AppResult<SaveMetadata>;
}

// 多版本间按配置的策略挑胜者，对应 OpenWithAutomaticConflictResolution
pub fn resolve_conflict(
    mut records: Vec<SlotRecord>,
    strategy: ConflictStrategy,
) -> Option<SlotRecord> {
    if records.is_empty() {
        return None;
    }
    records.sort_by(|a, b| match strategy {
        ConflictStrategy::MostRecentlySaved => a.meta.modified_at.cmp(&b.meta.modified_at),
        ConflictStrategy::LongestPlaytime => a
            .meta
            .played_seconds
            .total_cmp(&b.meta.played_seconds),
    });
    records.pop()
}

#[derive(Debug, Deserialize)]
struct SlotQueryResponse {
    #[serde(default)]
    results: Vec<SlotRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    // 创建返回新记录的 objectId；更新通常只回修改时间
    #[serde(default)]
    object_id: Option<String>,
}

// 更新响应不带 objectId 时沿用已有记录的 id
fn committed_object_id(
    response_id: Option<String>,
    existing: Option<&SlotRecord>,
) -> Option<String> {
    response_id.or_else(|| existing.and_then(|r| r.meta.object_id.clone()))
}

pub struct HttpSaveRemote {
    client: Client,
    config: Arc<AppConfig>,
}

impl HttpSaveRemote {
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
        Self { client, config }
    }

    fn vendor_headers(&self, session: &PlayerSession) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append("User-Agent", "PlaySave-Rust-SDK/0.1".parse().unwrap());
        if let Ok(v) = self.config.vendor_app_id.parse() {
            headers.append("X-LC-Id", v);
        }
        if let Ok(v) = self.config.vendor_app_key.parse() {
            headers.append("X-LC-Key", v);
        }
        if let Ok(v) = session.session_token.parse() {
            headers.append("X-LC-Session", v);
        }
        headers.append("Content-Type", "application/json".parse().unwrap());
        headers
    }

    fn collection_url(&self) -> String {
        format!("{}/classes/GameSaveSlot", self.config.vendor_base_url)
    }
}

impl SaveSlotRemote for HttpSaveRemote {
    async fn open_slot(&self, session: &PlayerSession) -> AppResult<Option<SlotRecord>> {
        let filter = serde_json::json!({ "slot_name": self.config.save_slot_name });
        let response = self
            .client
            .get(self.collection_url())
            .headers(self.vendor_headers(session))
            .query(&[("where", filter.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::SessionOpenError(format!(
                "查询存档槽失败，状态码 {}",
                response.status()
            )));
        }

        let body: SlotQueryResponse = response.json().await?;
        log::debug!(
            "存档槽 {} 共 {} 个版本",
            self.config.save_slot_name,
            body.results.len()
        );
        Ok(resolve_conflict(body.results, self.config.conflict_strategy))
    }

    async fn read(&self, _session: &PlayerSession, record: &SlotRecord) -> AppResult<Vec<u8>> {
        // 负载随记录一起返回，这里只做 base64 解码
        if record.data.is_empty() {
            return Ok(Vec::new());
        }
        general_purpose::STANDARD
            .decode(&record.data)
            .map_err(|e| AppError::RemoteReadError(format!("负载解码失败: {e}")))
    }

    async fn write(
        &self,
        session: &PlayerSession,
        existing: Option<&SlotRecord>,
        payload: &[u8],
        meta: SaveMetadata,
    ) -> AppResult<SaveMetadata> {
        let record = SlotRecord {
            meta: meta.clone(),
            data: general_purpose::STANDARD.encode(payload),
        };

        let response = match existing.and_then(|r| r.meta.object_id.as_deref()) {
            Some(object_id) => {
                self.client
                    .put(format!("{}/{object_id}", self.collection_url()))
                    .headers(self.vendor_headers(session))
                    .json(&record)
                    .send()
                    .await?
            }
            None => {
                self.client
                    .post(self.collection_url())
                    .headers(self.vendor_headers(session))
                    .json(&record)
                    .send()
                    .await?
            }
        };

        if !response.status().is_success() {
            return Err(AppError::RemoteWriteError(format!(
                "提交存档失败，状态码 {}",
                response.status()
            )));
        }

        let commit: CommitResponse = response.json().await?;
        let mut committed = meta;
        committed.object_id = committed_object_id(commit.object_id, existing);
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(modified_secs: i64, played: f64, tag: &str) -> SlotRecord {
        SlotRecord {
            meta: SaveMetadata {
                object_id: Some(tag.to_string()),
                slot_name: "SaveGameFileName".to_string(),
                description: format!("Saved at: {tag}"),
                modified_at: Utc.timestamp_opt(modified_secs, 0).unwrap(),
                played_seconds: played,
                checksum: String::new(),
            },
            data: String::new(),
        }
    }

    #[test]
    fn most_recent_wins() {
        let winner = resolve_conflict(
            vec![record(100, 900.0, "old"), record(200, 10.0, "new")],
            ConflictStrategy::MostRecentlySaved,
        )
        .unwrap();
        assert_eq!(winner.meta.object_id.as_deref(), Some("new"));
    }

    #[test]
    fn longest_playtime_wins() {
        let winner = resolve_conflict(
            vec![record(100, 900.0, "veteran"), record(200, 10.0, "fresh")],
            ConflictStrategy::LongestPlaytime,
        )
        .unwrap();
        assert_eq!(winner.meta.object_id.as_deref(), Some("veteran"));
    }

    #[test]
    fn empty_slot_resolves_to_none() {
        assert!(resolve_conflict(vec![], ConflictStrategy::MostRecentlySaved).is_none());
    }

    // 更新已有槽位时响应往往不回 objectId，id 必须从旧记录沿用下来
    #[test]
    fn update_response_without_object_id_keeps_existing_id() {
        let existing = record(100, 1.0, "obj-existing");
        assert_eq!(
            committed_object_id(None, Some(&existing)),
            Some("obj-existing".to_string())
        );
    }

    #[test]
    fn create_response_object_id_wins() {
        let existing = record(100, 1.0, "obj-existing");
        assert_eq!(
            committed_object_id(Some("obj-new".to_string()), Some(&existing)),
            Some("obj-new".to_string())
        );
        assert_eq!(
            committed_object_id(Some("obj-new".to_string()), None),
            Some("obj-new".to_string())
        );
    }

    #[test]
    fn commit_response_parses_update_style_body() {
        let commit: CommitResponse =
            serde_json::from_str(r#"{"updatedAt":"2026-01-01T00:00:00Z"}"#).unwrap();
        assert!(commit.object_id.is_none());
    }
}
