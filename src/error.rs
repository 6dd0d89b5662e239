use {
    crate::constants::*,
    derive_builder::UninitializedFieldError,
    hmac::digest::InvalidLength,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
        str::Utf8Error,
    },
};

/// Error returned when an attempt at signing or validating a query request fails.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// A credential, the host, or the request path is missing or invalid.
    Config(/* message */ String),

    /// The parameters could not be turned into a unique set of names and values: a name appears
    /// twice, a raw query segment has no `=` separator, a name is empty, or a reserved name was
    /// supplied.
    Normalization(/* message */ String),

    /// Input is not valid UTF-8, or a percent-escape sequence is malformed.
    Encoding(/* message */ String),

    /// The HMAC primitive could not be initialized.
    Signing(/* message */ String),

    /// The signed URL is missing a component required for validation. Sample messages:
    /// `Request is missing Authentication Token`
    /// `AWS query-string parameters must include 'Signature'.`
    IncompleteSignature(/* message */ String),

    /// The access key in the signed URL is not the one we hold a secret for.
    InvalidClientTokenId(/* message */ String),

    /// Signature did not match the calculated signature value, or the timestamp is outside the
    /// allowed window.
    /// Example messages:
    /// `The request signature we calculated does not match the signature you provided. Check your AWS Secret Access Key and signing method. Consult the service documentation for details.`
    /// `Signature expired: 2024-01-01T00:00:00Z is now earlier than 2024-01-01T00:45:00Z (2024-01-01T01:00:00Z - 15 min.)`
    SignatureDoesNotMatch(Option</* message */ String>),
}

impl SignatureError {
    /// The short error code for this error, e.g. `"NormalizationError"`.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => ERR_CODE_CONFIG,
            Self::Normalization(_) => ERR_CODE_NORMALIZATION,
            Self::Encoding(_) => ERR_CODE_ENCODING,
            Self::Signing(_) => ERR_CODE_SIGNING,
            Self::IncompleteSignature(_) => ERR_CODE_INCOMPLETE_SIGNATURE,
            Self::InvalidClientTokenId(_) => ERR_CODE_INVALID_CLIENT_TOKEN_ID,
            Self::SignatureDoesNotMatch(_) => ERR_CODE_SIGNATURE_DOES_NOT_MATCH,
        }
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Config(msg) => f.write_str(msg),
            Self::Normalization(msg) => f.write_str(msg),
            Self::Encoding(msg) => f.write_str(msg),
            Self::Signing(msg) => f.write_str(msg),
            Self::IncompleteSignature(msg) => f.write_str(msg),
            Self::InvalidClientTokenId(msg) => f.write_str(msg),
            Self::SignatureDoesNotMatch(msg) => {
                if let Some(msg) = msg {
                    f.write_str(msg)
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Error for SignatureError {}

impl From<UninitializedFieldError> for SignatureError {
    fn from(e: UninitializedFieldError) -> SignatureError {
        SignatureError::Config(format!("Missing required configuration value: {}", e.field_name()))
    }
}

impl From<InvalidLength> for SignatureError {
    fn from(e: InvalidLength) -> SignatureError {
        SignatureError::Signing(format!("Unable to initialize HMAC-SHA256: {}", e))
    }
}

impl From<Utf8Error> for SignatureError {
    fn from(e: Utf8Error) -> SignatureError {
        SignatureError::Encoding(format!("Input is not valid UTF-8: {}", e))
    }
}
