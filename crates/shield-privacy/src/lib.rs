//! PrivacyShield Tracking Protection
//!
//! Strips tracking identifiers from page addresses:
//! - Query parameters, via an ordered rule table with per-domain scoping
//! - Fragment tokens (`#fbclid=...`), via raw pattern removal
//!
//! Guards:
//! - Guarded domains keep a parameter no matter which rule would remove it
//! - Excluded hosts skip the query pipeline entirely

mod error;
mod fragment;
mod rewriter;
mod rules;

pub use error::PrivacyError;
pub use fragment::{FragmentCleaner, FragmentPattern, StrippedFragment, DEFAULT_FRAGMENT_PARAMS};
pub use rewriter::{Stripped, UrlRewriter};
pub use rules::{ExclusionList, GuardTable, Query, QueryParam, Rule, RuleContext, RuleSet};

pub type Result<T> = std::result::Result<T, PrivacyError>;
