use {
    crate::{canonical::percent_encode_rfc3986, constants::SHA256_OUTPUT_LEN, crypto::hmac_sha256, SignatureError},
    base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine},
    std::fmt::{Debug, Display, Formatter, Result as FmtResult},
    subtle::ConstantTimeEq,
};

/// An HMAC-SHA256 request signature.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Signature {
    /// The raw digest.
    digest: [u8; SHA256_OUTPUT_LEN],
}

impl Signature {
    /// Compute the signature of a string to sign with the given secret key.
    ///
    /// # Errors
    /// Returns [SignatureError::Signing] if the HMAC cannot be initialized, e.g. for an empty key.
    pub fn compute(string_to_sign: &[u8], secret_key: &[u8]) -> Result<Self, SignatureError> {
        Ok(Self {
            digest: hmac_sha256(secret_key, string_to_sign)?,
        })
    }

    /// The signature as standard, padded base64.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.digest)
    }

    /// The base64 signature, percent-encoded for use as a query parameter value. The base64
    /// characters `+`, `/`, and `=` become `%2B`, `%2F`, and `%3D`.
    pub fn to_url_encoded(&self) -> String {
        percent_encode_rfc3986(&self.to_base64())
    }

    /// Compare against a base64 signature in constant time.
    pub fn matches_base64(&self, provided: &str) -> bool {
        self.to_base64().as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.digest
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("Signature").field(&self.to_base64()).finish()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_base64())
    }
}
