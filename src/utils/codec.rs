use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::config::StorageFormat;
use crate::models::game_data::GameData;
use crate::utils::crypto;
use crate::utils::error::AppResult;

/// 本地编解码器：GameData 和字节流互转。
///
/// Json 格式就是带缩进的 serde_json 输出；Binary 格式在此基础上
/// 先 gzip 压缩再 AES-256-CBC 加密，对应原模板里的加密二进制存档。
pub fn encode(data: &GameData, format: StorageFormat) -> AppResult<Vec<u8>> {
    let json = serde_json::to_vec_pretty(data)?;
    match format {
        StorageFormat::Json => Ok(json),
        StorageFormat::Binary => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&json)?;
            let compressed = encoder.finish()?;
            crypto::encrypt(&compressed)
        }
    }
}

pub fn decode(bytes: &[u8], format: StorageFormat) -> AppResult<GameData> {
    match format {
        StorageFormat::Json => Ok(serde_json::from_slice(bytes)?),
        StorageFormat::Binary => {
            let compressed = crypto::decrypt(bytes)?;
            let mut decoder = GzDecoder::new(compressed.as_slice());
            let mut json = Vec::new();
            decoder.read_to_end(&mut json)?;
            Ok(serde_json::from_slice(&json)?)
        }
    }
}
