use {
    crate::{constants::SHA256_OUTPUT_LEN, SignatureError},
    hmac::{Hmac, Mac},
    sha2::Sha256,
};

type HmacSha256 = Hmac<Sha256>;

/// Wrapper function to form a HMAC-SHA256 operation.
///
/// A new MAC context is created for every call; contexts are never shared between requests.
pub(crate) fn hmac_sha256(key: &[u8], value: &[u8]) -> Result<[u8; SHA256_OUTPUT_LEN], SignatureError> {
    // HMAC itself accepts an empty key, but a signature made with one proves nothing.
    if key.is_empty() {
        return Err(SignatureError::Signing("Unable to initialize HMAC-SHA256: empty key".to_string()));
    }

    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(value);

    let mut result = [0; SHA256_OUTPUT_LEN];
    result.copy_from_slice(mac.finalize().into_bytes().as_slice());
    Ok(result)
}
