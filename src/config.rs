use {
    crate::{canonical::is_rfc3986_unreserved, constants::DEFAULT_REQUEST_PATH, SignatureError},
    derive_builder::Builder,
    std::fmt::{Debug, Display, Formatter, Result as FmtResult},
};

/// URL scheme for signed request URLs.
///
/// The scheme is not part of the string to sign; it only affects the assembled URL.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Scheme {
    /// `http://`
    #[default]
    Http,

    /// `https://`
    Https,
}

impl Scheme {
    /// The scheme as it appears in a URL, without the `://` suffix.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Credentials and endpoint used to sign requests.
///
/// SigningConfig structs are immutable and hold no per-request state, so a single value can be shared by reference
/// across any number of signing calls, including from multiple threads. Use [SigningConfig::new] or
/// [SigningConfigBuilder] to construct one; both reject empty credentials.
#[derive(Builder, Clone, Eq, PartialEq)]
#[builder(build_fn(validate = "Self::validate", error = "SignatureError"))]
pub struct SigningConfig {
    /// The access key id sent in the `AWSAccessKeyId` parameter.
    #[builder(setter(into))]
    access_key_id: String,

    /// The secret key used to compute the HMAC. Never sent on the wire.
    #[builder(setter(into))]
    secret_key: String,

    /// The endpoint host, e.g. `ecs.amazonaws.jp`.
    #[builder(setter(into))]
    host: String,

    /// The request path used when a signing call does not supply one.
    #[builder(setter(into), default = "DEFAULT_REQUEST_PATH.to_string()")]
    path: String,

    /// The URL scheme.
    #[builder(default)]
    scheme: Scheme,
}

impl SigningConfig {
    /// Create a config for the given credentials and host, using the default path (`/onca/xml`) and the `http`
    /// scheme.
    ///
    /// # Errors
    /// Returns [SignatureError::Config] if any of the values are empty or the host is malformed.
    pub fn new<A, S, H>(access_key_id: A, secret_key: S, host: H) -> Result<Self, SignatureError>
    where
        A: Into<String>,
        S: Into<String>,
        H: Into<String>,
    {
        Self::builder().access_key_id(access_key_id).secret_key(secret_key).host(host).build()
    }

    /// Create a [SigningConfigBuilder] to construct a [SigningConfig].
    #[inline]
    pub fn builder() -> SigningConfigBuilder {
        SigningConfigBuilder::default()
    }

    /// Retrieve the access key id.
    #[inline]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Expose the secret key for signing.
    #[inline]
    pub(crate) fn secret_key(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    /// Retrieve the endpoint host as supplied.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Retrieve the default request path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Retrieve the URL scheme.
    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }
}

impl Debug for SigningConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SigningConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("path", &self.path)
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl SigningConfigBuilder {
    // Unset fields are left for build() to report as uninitialized.
    fn validate(&self) -> Result<(), SignatureError> {
        if let Some(access_key_id) = &self.access_key_id {
            if access_key_id.is_empty() {
                return Err(SignatureError::Config("Access key id must not be empty".to_string()));
            }
        }

        if let Some(secret_key) = &self.secret_key {
            if secret_key.is_empty() {
                return Err(SignatureError::Config("Secret key must not be empty".to_string()));
            }
        }

        if let Some(host) = &self.host {
            validate_host(host)?;
        }

        if let Some(path) = &self.path {
            validate_path(path)?;
        }

        Ok(())
    }
}

/// Check that a host is non-empty and carries no path, query, fragment, or whitespace.
pub(crate) fn validate_host(host: &str) -> Result<(), SignatureError> {
    if host.is_empty() {
        return Err(SignatureError::Config("Host must not be empty".to_string()));
    }

    if host.contains(|c: char| c == '/' || c == '?' || c == '#' || c.is_whitespace()) {
        return Err(SignatureError::Config(format!("Host must be a bare host name: {}", host)));
    }

    Ok(())
}

/// Check that a request path is absolute and needs no escaping.
pub(crate) fn validate_path(path: &str) -> Result<(), SignatureError> {
    if !path.starts_with('/') {
        return Err(SignatureError::Config(format!("Path is not absolute: {}", path)));
    }

    if !path.bytes().all(|c| c == b'/' || is_rfc3986_unreserved(c)) {
        return Err(SignatureError::Config(format!("Path contains characters that require escaping: {}", path)));
    }

    Ok(())
}
