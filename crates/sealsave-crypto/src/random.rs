use rand::{rngs::OsRng, RngCore};
use sealsave_core::{KeyMaterial, IV_LEN, KEY_LEN};

/// Fill a fresh buffer of `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Concatenate two buffers into a new one (`first || second`).
pub fn combine_bytes(first: &[u8], second: &[u8]) -> Vec<u8> {
    let mut combined = Vec::with_capacity(first.len() + second.len());
    combined.extend_from_slice(first);
    combined.extend_from_slice(second);
    combined
}

/// Generate a new random key/IV pair.
pub fn generate_key_material() -> KeyMaterial {
    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&random_bytes(KEY_LEN));
    iv.copy_from_slice(&random_bytes(IV_LEN));
    KeyMaterial::new(key, iv)
}
