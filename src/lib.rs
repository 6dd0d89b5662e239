//! The `scratchstack_aws_query_signature` crate signs AWS query API requests: the HMAC-SHA256
//! "signature version 2" scheme used by the Product Advertising API, where the signature travels in
//! the URL itself as a `Signature` query parameter. It also provides the matching _validation_
//! routine for services that hold the caller's secret key and want to check such a URL.
//!
//! Signing is a pure computation: no network I/O happens here. Fetching the URL and interpreting
//! the response are left to the caller.
//!
//! # Workflow
//! 1. Build a [SigningConfig] with the access key id, the secret key, and the endpoint host.
//! 2. Create a [RequestSigner] for the config. By default, it takes the `Timestamp` parameter from
//!    the system clock when the caller does not supply one.
//! 3. Call [RequestSigner::sign] with the request parameters as a map, a list of pairs, or a raw
//!    query string. The result is the complete URL to fetch.
//!
//! On the receiving side, [validate_signed_url] recomputes the signature and checks the timestamp.
//!
//! ## Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use scratchstack_aws_query_signature::{validate_signed_url, FixedClock, RequestSigner, SigningConfig};
//!
//! let config = SigningConfig::new("AKIAEXAMPLE", "secretkey", "ecs.amazonaws.jp").unwrap();
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let signer = RequestSigner::with_clock(&config, FixedClock(now));
//!
//! let url = signer.sign([
//!     ("Service", "AWSECommerceService"),
//!     ("Version", "2009-03-31"),
//!     ("Operation", "ItemLookup"),
//!     ("ItemId", "4048691899"),
//!     ("ResponseGroup", "Small"),
//!     ("AssociateTag", "test-tag"),
//! ]).unwrap();
//!
//! assert_eq!(
//!     url,
//!     "http://ecs.amazonaws.jp/onca/xml?AWSAccessKeyId=AKIAEXAMPLE&AssociateTag=test-tag&ItemId=4048691899&\
//!      Operation=ItemLookup&ResponseGroup=Small&Service=AWSECommerceService&Timestamp=2024-01-01T00%3A00%3A00Z&\
//!      Version=2009-03-31&Signature=dF%2Fqdi2bHPrZZCPJWGnnGxi0Y5%2FShtN1k5FvM08qoxc%3D"
//! );
//!
//! let params = validate_signed_url(&config, &url, now).unwrap();
//! assert_eq!(params.get("ItemId"), Some("4048691899"));
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod canonical;
mod chronoutil;
mod config;
mod constants;
mod crypto;
mod error;
mod params;
mod signature;
mod signer;
mod validate;

pub use crate::{
    chronoutil::{format_timestamp, parse_timestamp, Clock, FixedClock, SystemClock},
    config::{Scheme, SigningConfig, SigningConfigBuilder},
    constants::DEFAULT_REQUEST_PATH,
    error::SignatureError,
    params::{ParameterInput, ParameterSet},
    signature::Signature,
    signer::{RequestSigner, SignedRequest},
    validate::{validate_signed_url, validate_signed_url_with_window},
};
