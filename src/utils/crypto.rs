use aes::Aes256;
use base64::{engine::general_purpose, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};
use md5::{Digest, Md5};
use once_cell::sync::Lazy;

use crate::config::{AES_IV_BASE64, AES_KEY_BASE64};
use crate::utils::error::{AppError, AppResult};

// 密钥和IV在启动时只解码一次。配置里的 key/iv 有问题直接 panic，
// 这属于严重配置错误。
static AES_KEY: Lazy<[u8; 32]> = Lazy::new(|| {
    let key_vec = general_purpose::STANDARD
        .decode(AES_KEY_BASE64)
        .expect("无法解码配置中的AES密钥 (AES_KEY_BASE64)");
    key_vec
        .try_into()
        .expect("配置中的AES密钥长度必须是32字节")
});

static AES_IV: Lazy<[u8; 16]> = Lazy::new(|| {
    let iv_vec = general_purpose::STANDARD
        .decode(AES_IV_BASE64)
        .expect("无法解码配置中的AES IV (AES_IV_BASE64)");
    iv_vec
        .try_into()
        .expect("配置中的AES IV长度必须是16字节")
});

pub fn encrypt(data: &[u8]) -> AppResult<Vec<u8>> {
    let cipher = Encryptor::<Aes256>::new_from_slices(&*AES_KEY, &*AES_IV)
        .map_err(|e| AppError::AesError(format!("AES加密器初始化失败: {e}")))?;

    let result = cipher.encrypt_padded_vec_mut::<Pkcs7>(data);
    Ok(result)
}

pub fn decrypt(data: &[u8]) -> AppResult<Vec<u8>> {
    let cipher = Decryptor::<Aes256>::new_from_slices(&*AES_KEY, &*AES_IV)
        .map_err(|e| AppError::AesError(format!("AES解密器初始化失败: {e}")))?;

    // 填充错误或数据损坏时这里会返回Err
    cipher.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(|e| {
        log::error!("AES解密失败: {e}");
        AppError::AesError(format!("解密或去填充失败: {e}"))
    })
}

pub fn calculate_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{result:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let plain = "存档数据 round trip".as_bytes();
        let cipher_bytes = encrypt(plain).unwrap();
        assert_ne!(cipher_bytes, plain);
        let back = decrypt(&cipher_bytes).unwrap();
        assert_eq!(back, plain);
    }

    #[test]
    fn decrypt_rejects_corrupted_payload() {
        let mut cipher_bytes = encrypt(b"data").unwrap();
        let last = cipher_bytes.len() - 1;
        cipher_bytes[last] ^= 0xFF;
        assert!(matches!(
            decrypt(&cipher_bytes),
            Err(AppError::AesError(_))
        ));
    }

    #[test]
    fn md5_known_value() {
        assert_eq!(calculate_md5(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}
