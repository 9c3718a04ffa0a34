//! URL parsing facade
//!
//! Matching only ever looks at four parts of a URL: scheme, hostname,
//! pathname and query. Parsing itself is delegated to the `url` crate
//! (WHATWG rules, so hostnames come back lowercased and punycode-encoded).

use ::url::Url;

// =============================================================================
// Parsed URL
// =============================================================================

/// A successfully parsed absolute URL.
#[derive(Debug, Clone)]
pub struct ParsedUrl {
    inner: Url,
}

impl ParsedUrl {
    /// Parse an absolute URL. Relative or malformed input yields `None`.
    pub fn parse(input: &str) -> Option<Self> {
        Url::parse(input).ok().map(|inner| Self { inner })
    }

    /// Scheme without the trailing `:`.
    #[inline]
    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    /// Hostname without port; empty for URLs without a host.
    #[inline]
    pub fn hostname(&self) -> &str {
        self.inner.host_str().unwrap_or_default()
    }

    #[inline]
    pub fn pathname(&self) -> &str {
        self.inner.path()
    }

    /// Query including its leading `?`, or empty when there is no
    /// (or an empty) query.
    pub fn search(&self) -> String {
        match self.inner.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        }
    }

    /// Pathname followed by the query.
    pub fn path_and_query(&self) -> String {
        let mut out = String::from(self.pathname());
        out.push_str(&self.search());
        out
    }

    /// Hostname, pathname and query concatenated: the string glob patterns
    /// are tested against.
    pub fn host_path_query(&self) -> String {
        let mut out = String::from(self.hostname());
        out.push_str(self.pathname());
        out.push_str(&self.search());
        out
    }
}

// =============================================================================
// Match Target
// =============================================================================

/// A URL prepared once for testing against many patterns.
#[derive(Debug, Clone)]
pub struct UrlTarget {
    raw: String,
    parsed: Option<ParsedUrl>,
    subject: String,
}

impl UrlTarget {
    pub fn new(url: &str) -> Self {
        let parsed = ParsedUrl::parse(url);
        let subject = parsed
            .as_ref()
            .map(ParsedUrl::host_path_query)
            .unwrap_or_default();
        Self {
            raw: url.to_string(),
            parsed,
            subject,
        }
    }

    /// The URL exactly as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> Option<&ParsedUrl> {
        self.parsed.as_ref()
    }

    /// `hostname + pathname + query`; empty when the URL did not parse.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
