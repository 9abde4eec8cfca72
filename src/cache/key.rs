//! Cache Key Module
//!
//! Derives a deterministic key from a request path and its parameters.

use std::fmt;

use url::form_urlencoded;

// == Cache Key ==
/// Key identifying one forwarded request.
///
/// Parameters are sorted by name (then value) and both path and parameters
/// are percent-encoded, so the key is independent of parameter insertion
/// order and no two distinct requests share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `path` and `params`.
    pub fn new<'a, I>(path: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut pairs: Vec<(&String, &String)> = params.into_iter().collect();
        pairs.sort();

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        let path: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();

        Self(format!("{path}?{query}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
