//! Common constants used throughout the crate.
//!
//! This was consolidated here so the entire crate is on the same page about parameter names,
//! error codes, and formats. If a value is spelled incorrectly, at least it can be fixed in one
//! spot.
//!
//! Tests that are testing the content of an error code or message should not use these constants;
//! they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically.

/// Query parameter carrying the access key id.
pub(crate) const ACCESS_KEY_ID_PARAM: &str = "AWSAccessKeyId";

/// Default allowed timestamp mismatch in minutes.
pub(crate) const ALLOWED_MISMATCH_MINUTES: i64 = 15;

/// Request path used by the product advertising endpoints unless overridden.
pub const DEFAULT_REQUEST_PATH: &str = "/onca/xml";

/// Error code: ConfigError
pub(crate) const ERR_CODE_CONFIG: &str = "ConfigError";

/// Error code: EncodingError
pub(crate) const ERR_CODE_ENCODING: &str = "EncodingError";

/// Error code: IncompleteSignature
pub(crate) const ERR_CODE_INCOMPLETE_SIGNATURE: &str = "IncompleteSignature";

/// Error code: InvalidClientTokenId
pub(crate) const ERR_CODE_INVALID_CLIENT_TOKEN_ID: &str = "InvalidClientTokenId";

/// Error code: NormalizationError
pub(crate) const ERR_CODE_NORMALIZATION: &str = "NormalizationError";

/// Error code: SignatureDoesNotMatch
pub(crate) const ERR_CODE_SIGNATURE_DOES_NOT_MATCH: &str = "SignatureDoesNotMatch";

/// Error code: SigningError
pub(crate) const ERR_CODE_SIGNING: &str = "SigningError";

/// Error message: `"Illegal hex character in escape % pattern: %"`
pub(crate) const MSG_ILLEGAL_HEX_CHAR: &str = "Illegal hex character in escape % pattern: %";

/// Error message: `"Incomplete trailing escape % sequence"`
pub(crate) const MSG_INCOMPLETE_TRAILING_ESCAPE: &str = "Incomplete trailing escape % sequence";

/// Error message: `"AWS query-string parameters must include 'AWSAccessKeyId'."`
pub(crate) const MSG_QUERY_STRING_MUST_INCLUDE_ACCESS_KEY_ID: &str =
    "AWS query-string parameters must include 'AWSAccessKeyId'.";

/// Error message: `"AWS query-string parameters must include 'Signature'."`
pub(crate) const MSG_QUERY_STRING_MUST_INCLUDE_SIGNATURE: &str = "AWS query-string parameters must include 'Signature'.";

/// Error message: `"AWS query-string parameters must include 'Timestamp'."`
pub(crate) const MSG_QUERY_STRING_MUST_INCLUDE_TIMESTAMP: &str = "AWS query-string parameters must include 'Timestamp'.";

/// Error message: `"Request is missing Authentication Token"`
pub(crate) const MSG_REQUEST_MISSING_AUTH_TOKEN: &str = "Request is missing Authentication Token";

/// Error message: `"The request signature we calculated does not match the signature you provided. ..."`
pub(crate) const MSG_REQUEST_SIGNATURE_MISMATCH: &str = "The request signature we calculated does not match the signature you provided. Check your AWS Secret Access Key and signing method. Consult the service documentation for details.";

/// Error message: `"The security token included in the request is invalid."`
pub(crate) const MSG_SECURITY_TOKEN_INVALID: &str = "The security token included in the request is invalid.";

/// The only request method used for signed query URLs.
pub(crate) const REQUEST_METHOD_GET: &str = "GET";

/// Length of a SHA-256 digest in bytes.
pub(crate) const SHA256_OUTPUT_LEN: usize = 32;

/// Query parameter carrying the signature itself.
pub(crate) const SIGNATURE_PARAM: &str = "Signature";

/// Format of the `Timestamp` parameter: ISO 8601 extended format in UTC, seconds precision.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Query parameter carrying the request timestamp.
pub(crate) const TIMESTAMP_PARAM: &str = "Timestamp";
