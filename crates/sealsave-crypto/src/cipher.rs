use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sealsave_core::{KeyMaterial, SaveError};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("cipher init failed: {0}")]
    InvalidKeyLength(String),
    #[error("ciphertext is not valid base64: {0}")]
    InvalidBase64(String),
    /// Padding check failed: wrong key/IV or corrupted ciphertext.
    #[error("decryption failed: bad padding or corrupted ciphertext")]
    DecryptionFailed,
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

impl From<CipherError> for SaveError {
    fn from(err: CipherError) -> Self {
        SaveError::Decryption(err.to_string())
    }
}

/// Encrypt text and return the ciphertext as standard base64.
pub fn encrypt_string(plain_text: &str, material: &KeyMaterial) -> Result<String, CipherError> {
    let cipher_bytes = encrypt_bytes(plain_text.as_bytes(), material)?;
    Ok(STANDARD.encode(cipher_bytes))
}

/// Decrypt base64 ciphertext produced by [`encrypt_string`].
pub fn decrypt_string(cipher_text: &str, material: &KeyMaterial) -> Result<String, CipherError> {
    let cipher_bytes = STANDARD
        .decode(cipher_text.trim())
        .map_err(|e| CipherError::InvalidBase64(e.to_string()))?;
    let plain = decrypt_bytes(&cipher_bytes, material)?;
    String::from_utf8(plain).map_err(|_| CipherError::InvalidUtf8)
}

/// Encrypt raw bytes; output length is the next multiple of the block size.
pub fn encrypt_bytes(plain: &[u8], material: &KeyMaterial) -> Result<Vec<u8>, CipherError> {
    let encryptor = Aes256CbcEnc::new_from_slices(material.key(), material.iv())
        .map_err(|e| CipherError::InvalidKeyLength(e.to_string()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plain))
}

pub fn decrypt_bytes(cipher_bytes: &[u8], material: &KeyMaterial) -> Result<Vec<u8>, CipherError> {
    let decryptor = Aes256CbcDec::new_from_slices(material.key(), material.iv())
        .map_err(|e| CipherError::InvalidKeyLength(e.to_string()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(cipher_bytes)
        .map_err(|_| CipherError::DecryptionFailed)
}
