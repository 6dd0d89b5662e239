//! Parameter normalization: turning caller input into a [ParameterSet].
use {
    crate::{constants::SIGNATURE_PARAM, SignatureError},
    log::trace,
    std::{
        borrow::Cow,
        collections::{hash_map, BTreeMap, HashMap},
        str::{from_utf8, FromStr},
    },
};

/// A set of query parameters with unique names.
///
/// Iteration order is unspecified; the canonical order is established only when the set is
/// canonicalized.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParameterSet {
    params: HashMap<String, String>,
}

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Fails with [SignatureError::Normalization] if the name is empty or already
    /// present; an existing value is never replaced.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Result<(), SignatureError>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(SignatureError::Normalization("Parameter name must not be empty".to_string()));
        }

        match self.params.entry(name) {
            hash_map::Entry::Occupied(e) => {
                Err(SignatureError::Normalization(format!("Duplicate parameter name: {}", e.key())))
            }
            hash_map::Entry::Vacant(e) => {
                e.insert(value.into());
                Ok(())
            }
        }
    }

    /// Build a parameter set from `(name, value)` pairs, rejecting duplicate names.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self, SignatureError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut result = Self::new();
        for (name, value) in pairs {
            result.insert(name, value)?;
        }
        Ok(result)
    }

    /// Parse a raw query string of `&`-joined `name=value` pairs.
    ///
    /// Values are taken verbatim: no percent-decoding is performed. Empty segments (`a=1&&b=2`)
    /// are skipped. A segment without `=` is rejected, as is a duplicate name.
    pub fn from_query_string(query_string: &str) -> Result<Self, SignatureError> {
        let mut result = Self::new();

        for segment in query_string.split('&') {
            if segment.is_empty() {
                continue;
            }

            let Some((name, value)) = segment.split_once('=') else {
                return Err(SignatureError::Normalization(format!(
                    "Query string segment is missing '=' separator: {}",
                    segment
                )));
            };

            result.insert(name, value)?;
        }

        trace!("Normalized query string into {} parameters", result.len());
        Ok(result)
    }

    /// Parse a raw query string supplied as bytes. The bytes must be valid UTF-8.
    pub fn from_query_bytes(query_string: &[u8]) -> Result<Self, SignatureError> {
        Self::from_query_string(from_utf8(query_string)?)
    }

    /// Retrieve the value of a parameter.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Indicates whether the named parameter is present.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Number of parameters in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Indicates whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert `name` with the value produced by `value` unless it is already present. Returns
    /// `true` if the value was inserted.
    pub(crate) fn insert_if_absent<F>(&mut self, name: &str, value: F) -> bool
    where
        F: FnOnce() -> String,
    {
        if self.params.contains_key(name) {
            false
        } else {
            self.params.insert(name.to_string(), value());
            true
        }
    }

    /// Remove a parameter, returning its value.
    pub(crate) fn remove(&mut self, name: &str) -> Option<String> {
        self.params.remove(name)
    }
}

impl FromStr for ParameterSet {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, SignatureError> {
        Self::from_query_string(s)
    }
}

impl From<HashMap<String, String>> for ParameterSet {
    fn from(params: HashMap<String, String>) -> Self {
        Self {
            params,
        }
    }
}

impl From<BTreeMap<String, String>> for ParameterSet {
    fn from(params: BTreeMap<String, String>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}

/// Caller input to the signer.
///
/// The variant selects how the input is normalized: mapping inputs already have unique names,
/// pair lists are checked for duplicates, and query strings are split and checked.
#[derive(Clone, Debug)]
pub enum ParameterInput<'a> {
    /// A mapping of names to values.
    Map(ParameterSet),

    /// A list of `(name, value)` pairs that may contain duplicate names.
    Pairs(Vec<(String, String)>),

    /// A raw query string of `&`-joined `name=value` pairs with unencoded values.
    QueryString(Cow<'a, str>),
}

impl ParameterInput<'_> {
    /// Normalize the input into a [ParameterSet].
    ///
    /// A caller-supplied `Signature` parameter is rejected: the signature is always computed by
    /// the signer and appended after the canonical query string.
    pub fn normalize(self) -> Result<ParameterSet, SignatureError> {
        let params = match self {
            Self::Map(params) => params,
            Self::Pairs(pairs) => ParameterSet::from_pairs(pairs)?,
            Self::QueryString(qs) => ParameterSet::from_query_string(&qs)?,
        };

        // Maps bypass the checks in insert().
        if params.contains("") {
            return Err(SignatureError::Normalization("Parameter name must not be empty".to_string()));
        }

        if params.contains(SIGNATURE_PARAM) {
            return Err(SignatureError::Normalization(format!(
                "Parameter name '{}' is reserved for the computed signature",
                SIGNATURE_PARAM
            )));
        }

        Ok(params)
    }
}

impl From<ParameterSet> for ParameterInput<'_> {
    fn from(params: ParameterSet) -> Self {
        Self::Map(params)
    }
}

impl From<HashMap<String, String>> for ParameterInput<'_> {
    fn from(params: HashMap<String, String>) -> Self {
        Self::Map(params.into())
    }
}

impl From<BTreeMap<String, String>> for ParameterInput<'_> {
    fn from(params: BTreeMap<String, String>) -> Self {
        Self::Map(params.into())
    }
}

impl From<Vec<(String, String)>> for ParameterInput<'_> {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<&[(&str, &str)]> for ParameterInput<'_> {
    fn from(pairs: &[(&str, &str)]) -> Self {
        Self::Pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ParameterInput<'_> {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::Pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

impl<'a> From<&'a str> for ParameterInput<'a> {
    fn from(query_string: &'a str) -> Self {
        Self::QueryString(Cow::Borrowed(query_string))
    }
}

impl From<String> for ParameterInput<'_> {
    fn from(query_string: String) -> Self {
        Self::QueryString(Cow::Owned(query_string))
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
