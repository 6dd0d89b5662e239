use {
    crate::{
        canonical::CanonicalRequest,
        chronoutil::{Clock, SystemClock},
        config::{validate_path, SigningConfig},
        constants::SIGNATURE_PARAM,
        params::ParameterInput,
        signature::Signature,
        SignatureError,
    },
    log::debug,
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// Signs query requests for a single [SigningConfig].
///
/// A RequestSigner borrows its config and owns only a [Clock]; signing is a pure function of the
/// config, the parameters, and the clock reading, so one signer may be used for any number of
/// requests.
#[derive(Clone, Debug)]
pub struct RequestSigner<'a, C = SystemClock> {
    config: &'a SigningConfig,
    clock: C,
}

impl<'a> RequestSigner<'a, SystemClock> {
    /// Create a signer that takes missing timestamps from the system clock.
    pub fn new(config: &'a SigningConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
        }
    }
}

impl<'a, C: Clock> RequestSigner<'a, C> {
    /// Create a signer that takes missing timestamps from `clock`.
    pub fn with_clock(config: &'a SigningConfig, clock: C) -> Self {
        Self {
            config,
            clock,
        }
    }

    /// The config used for signing.
    #[inline]
    pub fn config(&self) -> &SigningConfig {
        self.config
    }

    /// Sign the parameters against the configured path and return the complete request URL.
    pub fn sign<'p, P>(&self, params: P) -> Result<String, SignatureError>
    where
        P: Into<ParameterInput<'p>>,
    {
        Ok(self.sign_request(params, None)?.into_url())
    }

    /// Sign the parameters against `path` instead of the configured path and return the complete
    /// request URL.
    pub fn sign_with_path<'p, P>(&self, params: P, path: &str) -> Result<String, SignatureError>
    where
        P: Into<ParameterInput<'p>>,
    {
        Ok(self.sign_request(params, Some(path))?.into_url())
    }

    /// Sign the parameters and return the URL along with the intermediate values.
    ///
    /// # Errors
    /// * [SignatureError::Config] if `path` is not a valid absolute path.
    /// * [SignatureError::Normalization] if the parameters contain duplicate or empty names, a
    ///   malformed query segment, a `Signature` parameter, or an `AWSAccessKeyId` other than the
    ///   configured one.
    /// * [SignatureError::Signing] if the HMAC cannot be computed.
    pub fn sign_request<'p, P>(&self, params: P, path: Option<&str>) -> Result<SignedRequest, SignatureError>
    where
        P: Into<ParameterInput<'p>>,
    {
        if let Some(path) = path {
            validate_path(path)?;
        }

        let params = params.into().normalize()?;
        let canonical = CanonicalRequest::from_parameters(self.config, params, path, &self.clock)?;
        let signature = Signature::compute(&canonical.string_to_sign(), self.config.secret_key())?;

        let url = format!(
            "{}://{}{}?{}&{}={}",
            self.config.scheme(),
            self.config.host(),
            canonical.path(),
            canonical.canonical_query_string(),
            SIGNATURE_PARAM,
            signature.to_url_encoded()
        );
        debug!("Signed request for {}{}", self.config.host(), canonical.path());

        Ok(SignedRequest {
            url,
            canonical_query_string: canonical.canonical_query_string().to_string(),
            timestamp: canonical.timestamp().unwrap_or_default().to_string(),
            signature,
        })
    }
}

/// The result of signing a request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedRequest {
    url: String,
    canonical_query_string: String,
    timestamp: String,
    signature: Signature,
}

impl SignedRequest {
    /// The complete signed URL.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The canonical query string that was signed, without the `Signature` parameter.
    #[inline]
    pub fn canonical_query_string(&self) -> &str {
        &self.canonical_query_string
    }

    /// The `Timestamp` parameter value, whether supplied or injected.
    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The computed signature.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Consume this and return the URL.
    #[inline]
    pub fn into_url(self) -> String {
        self.url
    }
}

impl Display for SignedRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::RequestSigner,
        crate::{FixedClock, ParameterInput, ParameterSet, Scheme, SignatureError, SigningConfig},
        chrono::{TimeZone, Utc},
        std::collections::{BTreeMap, HashMap},
    };

    const ITEM_LOOKUP_CQS: &str = "AWSAccessKeyId=AKIAEXAMPLE&AssociateTag=test-tag&ItemId=4048691899&\
        Operation=ItemLookup&ResponseGroup=Small&Service=AWSECommerceService&Timestamp=2024-01-01T00%3A00%3A00Z&\
        Version=2009-03-31";
    const ITEM_LOOKUP_SIG: &str = "dF%2Fqdi2bHPrZZCPJWGnnGxi0Y5%2FShtN1k5FvM08qoxc%3D";

    macro_rules! expect_err {
        ($test:expr, $expected:ident) => {
            match $test {
                Ok(ref v) => panic!("Expected Err({}); got Ok({:?})", stringify!($expected), v),
                Err(SignatureError::$expected(msg)) => msg,
                Err(e) => panic!("Expected {}; got {:#?}", stringify!($expected), e),
            }
        };
    }

    fn config() -> SigningConfig {
        SigningConfig::new("AKIAEXAMPLE", "secretkey", "ecs.amazonaws.jp").unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn item_lookup() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Service", "AWSECommerceService"),
            ("Version", "2009-03-31"),
            ("Operation", "ItemLookup"),
            ("ItemId", "4048691899"),
            ("ResponseGroup", "Small"),
            ("AssociateTag", "test-tag"),
        ]
    }

    #[test_log::test]
    fn sign_item_lookup() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let url = signer.sign(item_lookup().as_slice()).unwrap();
        assert_eq!(url, format!("http://ecs.amazonaws.jp/onca/xml?{}&Signature={}", ITEM_LOOKUP_CQS, ITEM_LOOKUP_SIG));
    }

    #[test_log::test]
    fn sign_request_exposes_parts() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let signed = signer.sign_request(item_lookup().as_slice(), None).unwrap();
        assert_eq!(signed.canonical_query_string(), ITEM_LOOKUP_CQS);
        assert_eq!(signed.timestamp(), "2024-01-01T00:00:00Z");
        assert_eq!(signed.signature().to_base64(), "dF/qdi2bHPrZZCPJWGnnGxi0Y5/ShtN1k5FvM08qoxc=");
        assert_eq!(signed.to_string(), signed.url());

        // Parameter names in the URL appear in canonical order with Signature last.
        let query = signed.url().split_once('?').unwrap().1;
        let names: Vec<&str> = query.split('&').map(|seg| seg.split_once('=').unwrap().0).collect();
        assert_eq!(
            names,
            vec![
                "AWSAccessKeyId",
                "AssociateTag",
                "ItemId",
                "Operation",
                "ResponseGroup",
                "Service",
                "Timestamp",
                "Version",
                "Signature"
            ]
        );
    }

    #[test_log::test]
    fn input_modes_give_same_url() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let expected = signer.sign(item_lookup().as_slice()).unwrap();

        let mut reversed = item_lookup();
        reversed.reverse();
        assert_eq!(signer.sign(reversed.as_slice()).unwrap(), expected);

        let hash: HashMap<String, String> =
            item_lookup().into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        assert_eq!(signer.sign(hash).unwrap(), expected);

        let btree: BTreeMap<String, String> =
            item_lookup().into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        assert_eq!(signer.sign(btree).unwrap(), expected);

        let qs = "ResponseGroup=Small&AssociateTag=test-tag&Service=AWSECommerceService&Operation=ItemLookup&\
            ItemId=4048691899&Version=2009-03-31";
        assert_eq!(signer.sign(qs).unwrap(), expected);
        assert_eq!(signer.sign(ParameterInput::QueryString(qs.into())).unwrap(), expected);
    }

    #[test_log::test]
    fn sign_is_deterministic() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let a = signer.sign_request(item_lookup().as_slice(), None).unwrap();
        let b = signer.sign_request(item_lookup().as_slice(), None).unwrap();
        assert_eq!(a, b);
    }

    #[test_log::test]
    fn sign_is_sensitive_to_values() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let a = signer.sign_request([("ItemId", "4048691899")], None).unwrap();
        let b = signer.sign_request([("ItemId", "4048691890")], None).unwrap();
        assert_ne!(a.signature(), b.signature());

        let other = SigningConfig::new("AKIAEXAMPLE", "secretkez", "ecs.amazonaws.jp").unwrap();
        let c = RequestSigner::with_clock(&other, clock()).sign_request([("ItemId", "4048691899")], None).unwrap();
        assert_ne!(a.signature(), c.signature());
        assert_eq!(a.canonical_query_string(), c.canonical_query_string());
    }

    #[test_log::test]
    fn sign_encodes_values() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let params = [("Operation", "ItemSearch"), ("Keywords", "hello world & café")];
        let signed = signer.sign_request(params, None).unwrap();
        assert_eq!(
            signed.canonical_query_string(),
            "AWSAccessKeyId=AKIAEXAMPLE&Keywords=hello%20world%20%26%20caf%C3%A9&Operation=ItemSearch&\
             Timestamp=2024-01-01T00%3A00%3A00Z"
        );
        assert_eq!(signed.signature().to_url_encoded(), "zX%2FVH91yh%2BGvwA1fzYWiO6i4a3RH368Dk4u2iRegGfA%3D");
    }

    #[test_log::test]
    fn supplied_timestamp_is_kept() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let signed = signer.sign_request([("ItemId", "1"), ("Timestamp", "2009-01-01T12:00:00Z")], None).unwrap();
        assert_eq!(signed.timestamp(), "2009-01-01T12:00:00Z");
        assert_eq!(signed.url().matches("Timestamp=").count(), 1);
        assert!(signed.url().contains("Timestamp=2009-01-01T12%3A00%3A00Z"));
    }

    #[test_log::test]
    fn injected_timestamp_appears_once() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let url = signer.sign("ItemId=1").unwrap();
        assert_eq!(url.matches("Timestamp=").count(), 1);
        assert_eq!(url.matches("AWSAccessKeyId=").count(), 1);
    }

    #[test_log::test]
    fn system_clock_timestamp_shape() {
        let config = config();
        let signed = RequestSigner::new(&config).sign_request("ItemId=1", None).unwrap();
        let ts = signed.timestamp();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }

    #[test_log::test]
    fn path_override_and_scheme() {
        let config = SigningConfig::builder()
            .access_key_id("AKIAEXAMPLE")
            .secret_key("secretkey")
            .host("ECS.amazonaws.jp")
            .scheme(Scheme::Https)
            .build()
            .unwrap();
        let signer = RequestSigner::with_clock(&config, clock());
        let default_path = signer.sign_request("ItemId=1", None).unwrap();
        let other_path = signer.sign_request("ItemId=1", Some("/onca/soap")).unwrap();
        assert!(default_path.url().starts_with("https://ECS.amazonaws.jp/onca/xml?"));
        assert!(other_path.url().starts_with("https://ECS.amazonaws.jp/onca/soap?"));
        assert_ne!(default_path.signature(), other_path.signature());
        assert_eq!(signer.sign_with_path("ItemId=1", "/onca/soap").unwrap(), other_path.into_url());

        // The host is lower-cased in the string to sign only.
        let lower = SigningConfig::new("AKIAEXAMPLE", "secretkey", "ecs.amazonaws.jp").unwrap();
        let lower_signed = RequestSigner::with_clock(&lower, clock()).sign_request("ItemId=1", None).unwrap();
        assert_eq!(lower_signed.signature(), default_path.signature());

        let msg = expect_err!(signer.sign_with_path("ItemId=1", "onca"), Config);
        assert_eq!(msg, "Path is not absolute: onca");
    }

    #[test_log::test]
    fn normalization_failures() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());

        let msg = expect_err!(signer.sign("ItemId=1&ItemId=2"), Normalization);
        assert_eq!(msg, "Duplicate parameter name: ItemId");

        expect_err!(signer.sign("ItemId"), Normalization);
        expect_err!(signer.sign("ItemId=1&Signature=abc"), Normalization);
        expect_err!(signer.sign([("", "value")]), Normalization);

        let msg = expect_err!(signer.sign("AWSAccessKeyId=AKIAOTHER&ItemId=1"), Normalization);
        assert_eq!(msg, "Parameter AWSAccessKeyId 'AKIAOTHER' does not match the configured access key id");

        // Matching id is fine.
        assert!(signer.sign("AWSAccessKeyId=AKIAEXAMPLE&ItemId=1").is_ok());
    }

    #[test_log::test]
    fn empty_parameters() {
        let config = config();
        let signer = RequestSigner::with_clock(&config, clock());
        let url = signer.sign(ParameterSet::new()).unwrap();
        assert!(url.starts_with(
            "http://ecs.amazonaws.jp/onca/xml?AWSAccessKeyId=AKIAEXAMPLE&Timestamp=2024-01-01T00%3A00%3A00Z&Signature="
        ));
        assert_eq!(signer.sign("").unwrap(), url);
    }
}
