//! Rule pattern compilation and URL matching
//!
//! A rule pattern is one of:
//!
//! - `<all_urls>` or `*://*/*`: matches everything
//! - `/body/flags`: a regex searched in the full URL
//! - `[scheme://]glob`: `*` is a wildcard, everything else is literal; the
//!   glob must match `hostname + pathname + query` exactly
//!
//! Every failure (bad regex, unparseable URL) resolves to "no match" or to
//! the permissive literal fallback; nothing here returns an error to the
//! matcher.

use regex::Regex;

use crate::regexp::{RegexError, RegexLiteral};
use crate::url::{ParsedUrl, UrlTarget};

pub const ALL_URLS: &str = "<all_urls>";
pub const ANY_URL: &str = "*://*/*";

/// Stands in for `*` while a unicode pattern host goes through IDNA.
const WILDCARD_PLACEHOLDER: &str = "sgwildcard";

const SCHEME_SEPARATOR: &str = "://";

/// Test a single pattern against a URL.
pub fn matches_pattern(pattern: &str, url: &str) -> bool {
    CompiledPattern::compile(pattern).matches(&UrlTarget::new(url))
}

// =============================================================================
// Compiled Pattern
// =============================================================================

/// A rule pattern compiled once, ready to be tested against many URLs.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    All,
    Regex(Result<Regex, RegexError>),
    Glob(GlobPattern),
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Self {
        if pattern == ALL_URLS || pattern == ANY_URL {
            return Self::All;
        }

        if let Some(literal) = RegexLiteral::parse(pattern) {
            return Self::Regex(literal.compile());
        }

        Self::Glob(GlobPattern::compile(pattern))
    }

    pub fn matches(&self, target: &UrlTarget) -> bool {
        match self {
            Self::All => true,
            Self::Regex(Ok(re)) => re.is_match(target.raw()),
            Self::Regex(Err(_)) => false,
            Self::Glob(glob) => glob.matches(target),
        }
    }

    /// Compile error of a regex-literal pattern, if any.
    pub fn error(&self) -> Option<&RegexError> {
        match self {
            Self::Regex(Err(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }
}

// =============================================================================
// Glob Pattern
// =============================================================================

/// `[scheme://]host/path*` pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    /// Scheme required by the pattern; `None` when it has no `scheme://`
    /// prefix, `Some("*")` for any scheme.
    scheme: Option<String>,
    /// Anchored regex for `hostname + pathname + query`
    anchored: Option<Regex>,
    /// Unanchored regex over the raw pattern, used when the URL does not parse
    fallback: Option<Regex>,
}

impl GlobPattern {
    pub fn compile(pattern: &str) -> Self {
        let normalized = normalize_unicode_host(pattern);
        let normalized = normalized.as_deref().unwrap_or(pattern);

        let (scheme, rest) = match normalized.split_once(SCHEME_SEPARATOR) {
            Some((scheme, rest)) => (Some(scheme.to_string()), rest),
            None => (None, normalized),
        };

        let anchored = Regex::new(&format!("^{}$", glob_to_regex(rest))).ok();
        let fallback = Regex::new(&glob_to_regex(pattern)).ok();

        Self {
            scheme,
            anchored,
            fallback,
        }
    }

    pub fn matches(&self, target: &UrlTarget) -> bool {
        let Some(parsed) = target.parsed() else {
            return self
                .fallback
                .as_ref()
                .is_some_and(|re| re.is_match(target.raw()));
        };

        if let Some(scheme) = self.scheme.as_deref() {
            if scheme != "*" && scheme != parsed.scheme() {
                return false;
            }
        }

        self.anchored
            .as_ref()
            .is_some_and(|re| re.is_match(target.subject()))
    }
}

/// Escape literal text and turn every `*` into `.*`.
fn glob_to_regex(glob: &str) -> String {
    glob.split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

/// Rewrite a pattern whose host contains non-ASCII characters so the host is
/// in the same ASCII (punycode) form as parsed URLs.
///
/// Returns `None` for ASCII patterns and when the host cannot be normalized.
fn normalize_unicode_host(pattern: &str) -> Option<String> {
    if pattern.is_ascii() {
        return None;
    }

    let (scheme, rest) = match pattern.split_once(SCHEME_SEPARATOR) {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, pattern),
    };

    let path_start = rest.find('/').unwrap_or(rest.len());
    let (host, path) = rest.split_at(path_start);

    // Always probe with a special scheme: non-special schemes keep opaque hosts.
    let probe = format!("https://{}/", host.replace('*', WILDCARD_PLACEHOLDER));
    let parsed = ParsedUrl::parse(&probe)?;
    let ascii_host = parsed.hostname().replace(WILDCARD_PLACEHOLDER, "*");

    Some(match scheme {
        Some(scheme) => format!("{scheme}{SCHEME_SEPARATOR}{ascii_host}{path}"),
        None => format!("{ascii_host}{path}"),
    })
}
