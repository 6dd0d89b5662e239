//! Validation of signed query request URLs.
//!
//! This is the server side of [RequestSigner][crate::RequestSigner]: given a URL as it arrived and
//! the secret for the access key it names, recompute the signature and compare.
use {
    crate::{
        canonical::{percent_decode, CanonicalRequest},
        chronoutil::{duration_to_string, format_timestamp, parse_timestamp},
        config::SigningConfig,
        constants::*,
        params::ParameterSet,
        signature::Signature,
        SignatureError,
    },
    chrono::{DateTime, Duration, Utc},
    log::{debug, trace},
};

/// Validate a signed URL against `config`, allowing the default 15 minute mismatch between the
/// `Timestamp` parameter and `server_timestamp`.
///
/// On success, the decoded request parameters are returned without the `Signature` parameter.
pub fn validate_signed_url(
    config: &SigningConfig,
    url: &str,
    server_timestamp: DateTime<Utc>,
) -> Result<ParameterSet, SignatureError> {
    validate_signed_url_with_window(config, url, server_timestamp, Duration::minutes(ALLOWED_MISMATCH_MINUTES))
}

/// Validate a signed URL against `config` with a caller-chosen timestamp window.
///
/// The checks happen in this order:
/// 1. The URL has the form `scheme://host/path?query`.
/// 2. Each query segment has an `=`; names and values are percent-decoded; names are unique.
/// 3. `Signature` is present.
/// 4. `AWSAccessKeyId` is present and equals the configured access key id.
/// 5. `Timestamp` is present, parses, and is within `allowed_mismatch` of `server_timestamp`.
/// 6. The signature recomputed over the configured host and the URL's path matches.
///
/// The host in the URL is not consulted; a request is always validated against the host it was
/// expected to be sent to.
pub fn validate_signed_url_with_window(
    config: &SigningConfig,
    url: &str,
    server_timestamp: DateTime<Utc>,
    allowed_mismatch: Duration,
) -> Result<ParameterSet, SignatureError> {
    let (path, query) = split_url(url)?;
    let mut parameters = decode_query(query)?;

    let Some(provided_signature) = parameters.remove(SIGNATURE_PARAM) else {
        debug!("validate_signed_url: no {} parameter", SIGNATURE_PARAM);
        return Err(SignatureError::IncompleteSignature(MSG_QUERY_STRING_MUST_INCLUDE_SIGNATURE.to_string()));
    };

    match parameters.get(ACCESS_KEY_ID_PARAM) {
        None => {
            debug!("validate_signed_url: no {} parameter", ACCESS_KEY_ID_PARAM);
            return Err(SignatureError::IncompleteSignature(MSG_QUERY_STRING_MUST_INCLUDE_ACCESS_KEY_ID.to_string()));
        }
        Some(access_key_id) if access_key_id != config.access_key_id() => {
            debug!("validate_signed_url: unknown access key id {}", access_key_id);
            return Err(SignatureError::InvalidClientTokenId(MSG_SECURITY_TOKEN_INVALID.to_string()));
        }
        Some(_) => (),
    }

    let Some(timestamp) = parameters.get(TIMESTAMP_PARAM) else {
        debug!("validate_signed_url: no {} parameter", TIMESTAMP_PARAM);
        return Err(SignatureError::IncompleteSignature(MSG_QUERY_STRING_MUST_INCLUDE_TIMESTAMP.to_string()));
    };
    check_timestamp(parse_timestamp(timestamp)?, server_timestamp, allowed_mismatch)?;

    let canonical = CanonicalRequest::from_parts(config.host(), path, parameters);
    let expected = Signature::compute(&canonical.string_to_sign(), config.secret_key())?;

    if !expected.matches_base64(&provided_signature) {
        trace!("Signature mismatch: expected '{}', got '{}'", expected, provided_signature);
        return Err(SignatureError::SignatureDoesNotMatch(Some(MSG_REQUEST_SIGNATURE_MISMATCH.to_string())));
    }

    Ok(canonical.parameters().clone())
}

/// Split a URL into its path and its query string.
fn split_url(url: &str) -> Result<(&str, &str), SignatureError> {
    let malformed =
        || SignatureError::Encoding(format!("Request URL must have the form scheme://host/path?query: {}", url));

    let (_, rest) = url.split_once("://").ok_or_else(malformed)?;
    let rest = rest.split_once('#').map_or(rest, |(before, _)| before);

    let Some((authority_and_path, query)) = rest.split_once('?') else {
        debug!("validate_signed_url: no query string in {}", url);
        return Err(SignatureError::IncompleteSignature(MSG_REQUEST_MISSING_AUTH_TOKEN.to_string()));
    };

    match authority_and_path.find('/') {
        Some(0) | None => Err(malformed()),
        Some(i) => Ok((&authority_and_path[i..], query)),
    }
}

/// Decode the name and value of every query segment.
fn decode_query(query: &str) -> Result<ParameterSet, SignatureError> {
    let pairs = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((name, value)) => Ok((percent_decode(name)?, percent_decode(value)?)),
            None => Err(SignatureError::Normalization(format!(
                "Query string segment is missing '=' separator: {}",
                segment
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    ParameterSet::from_pairs(pairs)
}

/// Make sure the request timestamp is within `allowed_mismatch` of the server timestamp.
fn check_timestamp(
    req_ts: DateTime<Utc>,
    server_timestamp: DateTime<Utc>,
    allowed_mismatch: Duration,
) -> Result<(), SignatureError> {
    let min_ts = server_timestamp.checked_sub_signed(allowed_mismatch).unwrap_or(server_timestamp);
    let max_ts = server_timestamp.checked_add_signed(allowed_mismatch).unwrap_or(server_timestamp);

    if req_ts < min_ts {
        trace!("check_timestamp: request timestamp {} is before minimum timestamp {}", req_ts, min_ts);
        return Err(SignatureError::SignatureDoesNotMatch(Some(format!(
            "Signature expired: {} is now earlier than {} ({} - {}.)",
            format_timestamp(&req_ts),
            format_timestamp(&min_ts),
            format_timestamp(&server_timestamp),
            duration_to_string(allowed_mismatch)
        ))));
    }

    if req_ts > max_ts {
        trace!("check_timestamp: request timestamp {} is after maximum timestamp {}", req_ts, max_ts);
        return Err(SignatureError::SignatureDoesNotMatch(Some(format!(
            "Signature not yet current: {} is still later than {} ({} + {}.)",
            format_timestamp(&req_ts),
            format_timestamp(&max_ts),
            format_timestamp(&server_timestamp),
            duration_to_string(allowed_mismatch)
        ))));
    }

    Ok(())
}
