//! `/body/flags` regex literals
//!
//! Rule patterns and condition regexes are written in ECMAScript literal
//! syntax. The flags are mapped onto `regex::RegexBuilder` options; flags
//! that only affect stateful iteration (`g`, `d`) are accepted and ignored.

use regex::{Regex, RegexBuilder};

bitflags::bitflags! {
    /// Flags accepted after the closing `/` of a regex literal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegexFlags: u8 {
        /// `i`
        const IGNORE_CASE = 1 << 0;
        /// `m`
        const MULTI_LINE = 1 << 1;
        /// `s`
        const DOT_ALL = 1 << 2;
        /// `u`
        const UNICODE = 1 << 3;
        /// `v`
        const UNICODE_SETS = 1 << 4;
        /// `g`
        const GLOBAL = 1 << 5;
        /// `y` - match must start at the beginning of the subject
        const STICKY = 1 << 6;
        /// `d`
        const HAS_INDICES = 1 << 7;
    }
}

impl RegexFlags {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::IGNORE_CASE),
            'm' => Some(Self::MULTI_LINE),
            's' => Some(Self::DOT_ALL),
            'u' => Some(Self::UNICODE),
            'v' => Some(Self::UNICODE_SETS),
            'g' => Some(Self::GLOBAL),
            'y' => Some(Self::STICKY),
            'd' => Some(Self::HAS_INDICES),
            _ => None,
        }
    }

    /// Parse a flag string. Unknown or repeated flags are rejected.
    pub fn parse(flags: &str) -> Result<Self, RegexError> {
        let mut parsed = Self::empty();
        for c in flags.chars() {
            let flag = Self::from_char(c).ok_or(RegexError::InvalidFlag(c))?;
            if parsed.contains(flag) {
                return Err(RegexError::DuplicateFlag(c));
            }
            parsed |= flag;
        }
        if parsed.contains(Self::UNICODE | Self::UNICODE_SETS) {
            return Err(RegexError::ConflictingFlags);
        }
        Ok(parsed)
    }
}

/// Error compiling a regex literal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegexError {
    #[error("invalid regex flag {0:?}")]
    InvalidFlag(char),
    #[error("duplicate regex flag {0:?}")]
    DuplicateFlag(char),
    #[error("regex flags 'u' and 'v' cannot be combined")]
    ConflictingFlags,
    #[error(transparent)]
    Syntax(#[from] regex::Error),
}

/// A regex literal split into body and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexLiteral<'a> {
    pub body: &'a str,
    pub flags: &'a str,
}

impl<'a> RegexLiteral<'a> {
    pub fn new(body: &'a str, flags: &'a str) -> Self {
        Self { body, flags }
    }

    /// Split `/body/flags` at the first and last `/`.
    ///
    /// Returns `None` unless the text starts with `/` and has a second `/`.
    pub fn parse(text: &'a str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let last = rest.rfind('/')?;
        Some(Self {
            body: &rest[..last],
            flags: &rest[last + 1..],
        })
    }

    pub fn compile(&self) -> Result<Regex, RegexError> {
        let flags = RegexFlags::parse(self.flags)?;

        let source = if flags.contains(RegexFlags::STICKY) {
            format!(r"\A(?:{})", self.body)
        } else {
            self.body.to_string()
        };

        let re = RegexBuilder::new(&source)
            .case_insensitive(flags.contains(RegexFlags::IGNORE_CASE))
            .multi_line(flags.contains(RegexFlags::MULTI_LINE))
            .dot_matches_new_line(flags.contains(RegexFlags::DOT_ALL))
            .build()?;
        Ok(re)
    }
}
