//! Fragment (`#...`) tracker removal
//!
//! Fragments have no fixed grammar, so patterns run over the raw string
//! instead of a parsed structure.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;

/// Parameters removed from fragments unless configured otherwise
pub const DEFAULT_FRAGMENT_PARAMS: &[&str] = &["fbclid", "_hsenc", "mkt_tok"];

static LEADING_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[#&]+").expect("leading separator pattern"));
static TRAILING_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#&]+$").expect("trailing separator pattern"));

/// Matches one `#name=...` or `&name=...` token
#[derive(Debug, Clone)]
pub struct FragmentPattern {
    param: String,
    regex: Regex,
}

impl FragmentPattern {
    pub fn new(param: &str) -> Result<Self> {
        let regex = Regex::new(&format!("[#&]{}=[^&]*", regex::escape(param)))?;
        Ok(Self {
            param: param.to_string(),
            regex,
        })
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    fn remove_from(&self, fragment: &str) -> Option<String> {
        if self.regex.is_match(fragment) {
            Some(self.regex.replace_all(fragment, "").into_owned())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedFragment {
    pub fragment: String,
    /// Whether at least one tracker pattern matched
    pub matched: bool,
}

#[derive(Debug, Clone)]
pub struct FragmentCleaner {
    patterns: Vec<FragmentPattern>,
}

impl FragmentCleaner {
    pub fn new(patterns: Vec<FragmentPattern>) -> Self {
        Self { patterns }
    }

    pub fn from_params<I, S>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = params
            .into_iter()
            .map(|p| FragmentPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(patterns))
    }

    pub fn patterns(&self) -> &[FragmentPattern] {
        &self.patterns
    }

    /// Clean a fragment as exposed by `location.hash` (leading `#` included).
    pub fn clean_fragment(&self, fragment: &str) -> String {
        self.strip(fragment).fragment
    }

    pub fn strip(&self, fragment: &str) -> StrippedFragment {
        if fragment.is_empty() {
            return StrippedFragment {
                fragment: String::new(),
                matched: false,
            };
        }

        // Patterns anchor on a separator, so a bare `name=...` needs one too
        let mut cleaned = if fragment.starts_with('#') {
            fragment.to_string()
        } else {
            format!("#{fragment}")
        };
        let mut matched = false;
        for pattern in &self.patterns {
            if let Some(next) = pattern.remove_from(&cleaned) {
                matched = true;
                cleaned = next;
            }
        }

        StrippedFragment {
            fragment: normalize(&cleaned),
            matched,
        }
    }
}

impl Default for FragmentCleaner {
    fn default() -> Self {
        let patterns = DEFAULT_FRAGMENT_PARAMS
            .iter()
            .map(|p| FragmentPattern::new(p).expect("built-in fragment pattern"))
            .collect();
        Self::new(patterns)
    }
}

fn normalize(fragment: &str) -> String {
    let trimmed = TRAILING_SEPARATORS.replace(fragment, "");
    let body = LEADING_SEPARATORS.replace(&trimmed, "");
    if body.is_empty() {
        String::new()
    } else {
        format!("#{body}")
    }
}
