//! Canonicalization functionality for signature generation and validation.
//!
//! This includes RFC 3986 percent-encoding and decoding, and the ability to create the canonical
//! query string and string to sign for a query API request.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.

use {
    crate::{
        chronoutil::{format_timestamp, Clock},
        config::SigningConfig,
        constants::*,
        ParameterSet, SignatureError,
    },
    log::trace,
    percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC},
    qualifier_attr::qualifiers,
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// Everything except the RFC 3986 unreserved characters (`A-Z a-z 0-9 - . _ ~`) is escaped.
const RFC3986_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// A canonicalized query API request.
///
/// This is mainly used internally for generating the string to sign, but is exposed for testing
/// and debugging purposes.
///
/// **The stability of this struct is not guaranteed.** The fields and methods are subject to
/// change in minor/patch versions.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone)]
struct CanonicalRequest {
    /// The HTTP method for the request. Signed query URLs are always fetched with `GET`.
    request_method: &'static str,

    /// The lower-cased endpoint host.
    host: String,

    /// The request path, e.g. `/onca/xml`.
    path: String,

    /// The parameters, including the injected `Timestamp` and `AWSAccessKeyId`, not yet encoded.
    parameters: ParameterSet,

    /// The canonical query string, computed once from `parameters`.
    canonical_query_string: String,
}

impl CanonicalRequest {
    /// Create a CanonicalRequest from normalized parameters.
    ///
    /// If `parameters` has no `Timestamp`, one is taken from `clock`. If it has no
    /// `AWSAccessKeyId`, the one from `config` is added; a different one already present is an
    /// error. `path` overrides the path from `config`.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn from_parameters<C>(
        config: &SigningConfig,
        mut parameters: ParameterSet,
        path: Option<&str>,
        clock: &C,
    ) -> Result<Self, SignatureError>
    where
        C: Clock + ?Sized,
    {
        if parameters.insert_if_absent(TIMESTAMP_PARAM, || format_timestamp(&clock.now())) {
            trace!("Injected {} parameter", TIMESTAMP_PARAM);
        }

        if !parameters.insert_if_absent(ACCESS_KEY_ID_PARAM, || config.access_key_id().to_string()) {
            let supplied = parameters.get(ACCESS_KEY_ID_PARAM).unwrap_or_default();
            if supplied != config.access_key_id() {
                return Err(SignatureError::Normalization(format!(
                    "Parameter {} '{}' does not match the configured access key id",
                    ACCESS_KEY_ID_PARAM, supplied
                )));
            }
        }

        Ok(Self::from_parts(config.host(), path.unwrap_or(config.path()), parameters))
    }

    /// Create a CanonicalRequest from parameters that already carry `Timestamp` and
    /// `AWSAccessKeyId`. Any `Signature` parameter is ignored.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn from_parts(host: &str, path: &str, parameters: ParameterSet) -> Self {
        let canonical_query_string = canonicalize_query_to_string(&parameters);
        trace!("Canonical query string: {}", canonical_query_string);

        Self {
            request_method: REQUEST_METHOD_GET,
            host: host.to_ascii_lowercase(),
            path: path.to_string(),
            parameters,
            canonical_query_string,
        }
    }

    /// Retrieve the HTTP request method.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn request_method(&self) -> &str {
        self.request_method
    }

    /// Retrieve the lower-cased host.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn host(&self) -> &str {
        &self.host
    }

    /// Retrieve the request path.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn path(&self) -> &str {
        &self.path
    }

    /// Retrieve the (unencoded) parameters, including injected ones.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Retrieve the value of the `Timestamp` parameter.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn timestamp(&self) -> Option<&str> {
        self.parameters.get(TIMESTAMP_PARAM)
    }

    /// Get the canonical query string: encoded `name=value` pairs sorted by encoded name.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn canonical_query_string(&self) -> &str {
        &self.canonical_query_string
    }

    /// Get the string to sign: method, host, path, and canonical query string joined by newlines.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn string_to_sign(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(
            self.request_method.len() + self.host.len() + self.path.len() + self.canonical_query_string.len() + 3,
        );
        result.extend(self.request_method().as_bytes());
        result.push(b'\n');
        result.extend(self.host().as_bytes());
        result.push(b'\n');
        result.extend(self.path().as_bytes());
        result.push(b'\n');
        result.extend(self.canonical_query_string().as_bytes());

        trace!("String to sign:\n{}", String::from_utf8_lossy(&result));

        result
    }
}

impl Debug for CanonicalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CanonicalRequest")
            .field("request_method", &self.request_method)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("canonical_query_string", &self.canonical_query_string)
            .finish()
    }
}

/// Convert a [ParameterSet] to the canonical query string.
///
/// Names and values are percent-encoded, the pairs are sorted by the encoded name, and joined with
/// `&`. The `Signature` parameter is never included.
pub fn canonicalize_query_to_string(parameters: &ParameterSet) -> String {
    let mut results: Vec<(String, String)> = parameters
        .iter()
        // Don't include the signature itself.
        .filter(|(name, _)| *name != SIGNATURE_PARAM)
        .map(|(name, value)| (percent_encode_rfc3986(name), percent_encode_rfc3986(value)))
        .collect();

    // Names are unique, so sorting by name alone is total.
    results.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut query = String::with_capacity(results.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (i, (name, value)) in results.iter().enumerate() {
        if i > 0 {
            query.push('&');
        }
        query.push_str(name);
        query.push('=');
        query.push_str(value);
    }

    query
}

/// Indicates whether the specified byte is RFC3986 unreserved -- i.e., can be represented without being
/// percent-encoded, e.g. '?' -> '%3F'.
#[inline(always)]
pub fn is_rfc3986_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'.' || c == b'_' || c == b'~'
}

/// Percent-encode the UTF-8 bytes of a string, leaving only RFC 3986 unreserved characters as-is.
///
/// Hex digits are upper-case and a space becomes `%20`, never `+`.
pub fn percent_encode_rfc3986(s: &str) -> String {
    utf8_percent_encode(s, RFC3986_ENCODE_SET).to_string()
}

/// Decode a percent-encoded string.
///
/// Unlike a lenient URL decoder, this rejects incomplete or non-hex escapes and escapes that decode
/// to invalid UTF-8. A `+` is left as-is.
pub fn percent_decode(s: &str) -> Result<String, SignatureError> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return Err(SignatureError::Encoding(MSG_INCOMPLETE_TRAILING_ESCAPE.to_string()));
            }

            let hex_digits = &bytes[i + 1..i + 3];
            if !hex_digits.iter().all(u8::is_ascii_hexdigit) {
                return Err(SignatureError::Encoding(format!(
                    "{}{}{}",
                    MSG_ILLEGAL_HEX_CHAR, hex_digits[0] as char, hex_digits[1] as char
                )));
            }

            i += 3;
        } else {
            i += 1;
        }
    }

    Ok(percent_decode_str(s).decode_utf8()?.into_owned())
}

#[cfg(test)]
mod tests {
    use {
        super::{
            canonicalize_query_to_string, is_rfc3986_unreserved, percent_decode, percent_encode_rfc3986,
            CanonicalRequest,
        },
        crate::{FixedClock, ParameterSet, SignatureError, SigningConfig},
        chrono::{TimeZone, Utc},
    };

    macro_rules! expect_err {
        ($test:expr, $expected:ident) => {
            match $test {
                Ok(ref v) => panic!("Expected Err({}); got Ok({:?})", stringify!($expected), v),
                Err(ref e) => match e {
                    SignatureError::$expected(_) => e.to_string(),
                    _ => panic!("Expected {}; got {:#?}: {}", stringify!($expected), &e, &e),
                },
            }
        };
    }

    fn test_config() -> SigningConfig {
        SigningConfig::new("AKIAEXAMPLE", "secretkey", "ECS.amazonaws.JP").unwrap()
    }

    fn test_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test_log::test]
    fn encode_unreserved_untouched() {
        let unreserved = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
        assert_eq!(percent_encode_rfc3986(unreserved), unreserved);
        for c in unreserved.bytes() {
            assert!(is_rfc3986_unreserved(c));
        }
    }

    #[test_log::test]
    fn encode_reserved() {
        assert_eq!(percent_encode_rfc3986("a b"), "a%20b");
        assert_eq!(percent_encode_rfc3986("a+b"), "a%2Bb");
        assert_eq!(percent_encode_rfc3986("*"), "%2A");
        assert_eq!(percent_encode_rfc3986("k=v&x/y"), "k%3Dv%26x%2Fy");
        assert_eq!(percent_encode_rfc3986("2024-01-01T00:00:00Z"), "2024-01-01T00%3A00%3A00Z");
        assert_eq!(percent_encode_rfc3986("\u{e9}"), "%C3%A9");
        assert_eq!(percent_encode_rfc3986("\u{65e5}\u{672c}"), "%E6%97%A5%E6%9C%AC");
        assert_eq!(percent_encode_rfc3986("\u{1f600}"), "%F0%9F%98%80");
    }

    #[test_log::test]
    fn encode_decode_round_trip() {
        for value in ["hello world", "a&b=c", "/onca/xml", "1+1", "caf\u{e9}", "\u{65e5}\u{672c}\u{8a9e}", "%41", ""] {
            let encoded = percent_encode_rfc3986(value);
            assert!(encoded.bytes().all(|c| c == b'%' || is_rfc3986_unreserved(c)), "{}", encoded);
            assert_eq!(percent_decode(&encoded).unwrap(), value);
        }
    }

    #[test_log::test]
    fn decode_invalid() {
        let e = expect_err!(percent_decode("abc%4"), Encoding);
        assert_eq!(e, "Incomplete trailing escape % sequence");

        let e = expect_err!(percent_decode("abc%"), Encoding);
        assert_eq!(e, "Incomplete trailing escape % sequence");

        let e = expect_err!(percent_decode("abc%0Jdef"), Encoding);
        assert_eq!(e, "Illegal hex character in escape % pattern: %0J");

        let e = expect_err!(percent_decode("%C3"), Encoding);
        assert!(e.starts_with("Input is not valid UTF-8"));

        assert_eq!(percent_decode("a+b%2b").unwrap(), "a+b+");
    }

    #[test_log::test]
    fn canonicalize_query_sorts_by_encoded_name() {
        let params = ParameterSet::from_pairs([
            ("Version", "2009-03-31"),
            ("b", "B"),
            ("AssociateTag", "test-tag"),
            ("AWSAccessKeyId", "AKIAEXAMPLE"),
            ("a b", "space"),
            ("a", "A"),
        ])
        .unwrap();

        // Upper-case sorts before lower-case; "%20" sorts before letters.
        assert_eq!(
            canonicalize_query_to_string(&params),
            "AWSAccessKeyId=AKIAEXAMPLE&AssociateTag=test-tag&Version=2009-03-31&a=A&a%20b=space&b=B"
        );
    }

    #[test_log::test]
    fn canonicalize_query_excludes_signature() {
        let params = ParameterSet::from_pairs([("Signature", "abcdef"), ("b", "B"), ("a", "A")]).unwrap();
        assert_eq!(canonicalize_query_to_string(&params), "a=A&b=B");
    }

    #[test_log::test]
    fn canonicalize_query_order_independent() {
        let pairs = [("Service", "AWSECommerceService"), ("Operation", "ItemLookup"), ("ItemId", "1"), ("Z", "z z")];
        let forward = ParameterSet::from_pairs(pairs).unwrap();
        let reverse = ParameterSet::from_pairs(pairs.iter().rev().copied()).unwrap();
        let rotated = ParameterSet::from_pairs(pairs.iter().cycle().skip(2).take(4).copied()).unwrap();

        let expected = canonicalize_query_to_string(&forward);
        assert_eq!(canonicalize_query_to_string(&reverse), expected);
        assert_eq!(canonicalize_query_to_string(&rotated), expected);
    }

    #[test_log::test]
    fn canonical_request_injects_timestamp_and_access_key() {
        let config = test_config();
        let params = ParameterSet::from_pairs([("Operation", "ItemLookup")]).unwrap();
        let cr = CanonicalRequest::from_parameters(&config, params, None, &test_clock()).unwrap();

        assert_eq!(cr.timestamp(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(cr.parameters().get("AWSAccessKeyId"), Some("AKIAEXAMPLE"));
        assert_eq!(cr.parameters().len(), 3);
        assert_eq!(cr.request_method(), "GET");
        assert_eq!(cr.host(), "ecs.amazonaws.jp");
        assert_eq!(cr.path(), "/onca/xml");
        assert_eq!(
            String::from_utf8(cr.string_to_sign()).unwrap(),
            "GET\necs.amazonaws.jp\n/onca/xml\n\
             AWSAccessKeyId=AKIAEXAMPLE&Operation=ItemLookup&Timestamp=2024-01-01T00%3A00%3A00Z"
        );
        let _ = format!("{:?}", cr);
    }

    #[test_log::test]
    fn canonical_request_keeps_supplied_values() {
        let config = test_config();
        let pairs = [("Timestamp", "2009-01-01T12:00:00Z"), ("AWSAccessKeyId", "AKIAEXAMPLE")];
        let params = ParameterSet::from_pairs(pairs).unwrap();
        let cr = CanonicalRequest::from_parameters(&config, params, Some("/other"), &test_clock()).unwrap();
        assert_eq!(cr.timestamp(), Some("2009-01-01T12:00:00Z"));
        assert_eq!(cr.path(), "/other");
        assert_eq!(cr.canonical_query_string(), "AWSAccessKeyId=AKIAEXAMPLE&Timestamp=2009-01-01T12%3A00%3A00Z");
    }

    #[test_log::test]
    fn canonical_request_conflicting_access_key() {
        let config = test_config();
        let params = ParameterSet::from_pairs([("AWSAccessKeyId", "AKIAOTHER")]).unwrap();
        let e = expect_err!(CanonicalRequest::from_parameters(&config, params, None, &test_clock()), Normalization);
        assert_eq!(e, "Parameter AWSAccessKeyId 'AKIAOTHER' does not match the configured access key id");
    }
}
