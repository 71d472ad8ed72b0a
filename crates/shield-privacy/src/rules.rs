//! Tracking parameter rules
//!
//! A [`RuleSet`] is fixed at startup: an ordered list of removal rules,
//! a guard table built from the user's whitelist, and the hosts that are
//! never rewritten. Rules only ever delete parameters, so the order they
//! run in does not change the result.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use url::form_urlencoded;

/// Parameters removed on every host
const GLOBAL_PARAMS: &[&str] = &[
    // Facebook
    "fbclid",
    // TikTok
    "ttclid",
    // Twitter / X
    "twclid",
    // Reddit Ads
    "rdt_cid",
    // Pinterest
    "epik",
    // LinkedIn
    "li_fat_id",
    "trk",
    "trkCampaign",
    // Google Analytics
    "utm_id",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "_ga",
    "gclid",
    "gclsrc",
    "_gl",
    // Extended UTM variants
    "utm_campaignid",
    "utm_cid",
    "utm_reader",
    "utm_referrer",
    "utm_name",
    "utm_social",
    "utm_social-type",
    // Adobe Analytics / Omniture
    "s_cid",
    "s_kwcid",
    "s_src",
    "ef_id",
    // Microsoft Ads
    "msclkid",
    "mcid",
    "wt.mc_id",
    // Instagram
    "igshid",
    // HubSpot
    "_hsenc",
    "_hsmi",
    "__hstc",
    "__hssc",
    "__hsfp",
    // Marketo
    "mkt_tok",
    // Mailchimp
    "mc_cid",
    "mc_eid",
    "goal",
    // Yandex
    "yclid",
    "_openstat",
    // SendGrid
    "mc",
    "mcd",
    "cvosrc",
    // Sales Cloud / CRM platforms
    "sc_channel",
    "sc_campaign",
    "sc_geo",
    "sc_publisher",
    "sc_outcome",
    "sc_country",
    // Zendesk
    "zanpid",
    // Ometria
    "oly_enc_id",
    "oly_anon_id",
    // Klaviyo
    "__s",
    "_ke",
    // Others
    "redirect_log_mongo_id",
    "redirect_mongo_id",
    "fb_action_ids",
    "fb_action_types",
    "fb_source",
    "fb_ref",
    "action_object_map",
    "action_type_map",
    "action_ref_map",
    "vero_conv",
    "vero_id",
    "wickedid",
    "wt_mc",
    "ml_subscriber",
    "ml_subscriber_hash",
    "trk_contact",
    "trk_msg",
    "trk_module",
    "trk_sid",
    "gdftrk",
    "gdfms",
    "gdffi",
    "__tn__",
    "itm_source",
    "itm_medium",
    "itm_campaign",
    "cr_cc",
    "guce_referrer",
    "guce_referrer_sig",
];

/// `(host, entry)` pairs; an entry written `name=value` only matches that value
const SCOPED_PARAMS: &[(&str, &str)] = &[
    // Facebook
    ("www.facebook.com", "privacy_mutation_token"),
    ("www.facebook.com", "acontext"),
    ("www.facebook.com", "__xts__[0]"),
    ("www.facebook.com", "notif_t"),
    ("www.facebook.com", "notif_id"),
    ("www.facebook.com", "notif_ids[0]"),
    ("www.facebook.com", "notif_ids[1]"),
    ("www.facebook.com", "notif_ids[2]"),
    ("www.facebook.com", "notif_ids[3]"),
    ("www.facebook.com", "ref=notif"),
    ("www.facebook.com", "ref=watch_permalink"),
    // Dropbox
    ("www.dropbox.com", "_ad"),
    ("www.dropbox.com", "_camp"),
    ("www.dropbox.com", "_tk"),
    // YouTube
    ("youtu.be", "si"),
    ("www.youtube.com", "si"),
    // Microsoft properties
    ("devblogs.microsoft.com", "utm_issue"),
    ("devblogs.microsoft.com", "utm_position"),
    ("devblogs.microsoft.com", "utm_topic"),
    ("devblogs.microsoft.com", "utm_section"),
    ("devblogs.microsoft.com", "utm_cta"),
    ("devblogs.microsoft.com", "utm_description"),
    ("devblogs.microsoft.com", "ocid"),
    ("learn.microsoft.com", "ocid"),
    ("learn.microsoft.com", "redirectedfrom"),
    ("azure.microsoft.com", "OCID"),
    ("azure.microsoft.com", "ef_id"),
    ("www.msn.com", "ocid"),
    ("www.msn.com", "cvid"),
    ("bing.com", "ocid"),
    ("www.bing.com", "ocid"),
    ("www.bing.com", "cvid"),
    ("www.bing.com", "setlang"),
    ("news.microsoft.com", "ocid"),
    ("support.microsoft.com", "ocid"),
    ("blogs.microsoft.com", "ocid"),
    ("techcommunity.microsoft.com", "ocid"),
    // Bilibili
    ("www.bilibili.com", "share_source"),
    ("www.bilibili.com", "share_medium"),
];

/// Providers whose own query parameters carry session state
const EXCLUDED_HOSTS: &[&str] = &["icloud.com", "www.icloud.com"];

/// One decoded `name=value` pair, keeping the bytes it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    raw: String,
    name: String,
    value: String,
}

impl QueryParam {
    fn parse(raw: &str) -> Option<Self> {
        let (name, value) = form_urlencoded::parse(raw.as_bytes()).next()?;
        Some(Self {
            raw: raw.to_string(),
            name: name.into_owned(),
            value: value.into_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The segment exactly as it appeared in the address
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Immutable view of a query string.
///
/// Every removal returns a new `Query`; survivors keep their original
/// encoding and relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<QueryParam>,
}

impl Query {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(raw: &str) -> Self {
        let params = raw
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter_map(QueryParam::parse)
            .collect();
        Self { params }
    }

    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// A copy with every occurrence of `name` removed
    pub fn without(&self, name: &str) -> Query {
        Query {
            params: self
                .params
                .iter()
                .filter(|p| p.name != name)
                .cloned()
                .collect(),
        }
    }

    /// Distinct names present here but absent from `other`, in order of
    /// first appearance.
    pub fn removed_in(&self, other: &Query) -> Vec<String> {
        let mut seen = HashSet::new();
        self.params
            .iter()
            .filter(|p| !other.contains(&p.name))
            .filter(|p| seen.insert(p.name.as_str()))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Re-join the surviving segments; `None` when nothing is left.
    pub fn to_query_string(&self) -> Option<String> {
        if self.params.is_empty() {
            return None;
        }
        Some(
            self.params
                .iter()
                .map(|p| p.raw.as_str())
                .collect::<Vec<_>>()
                .join("&"),
        )
    }
}

/// Parameter name -> domain suffixes where it must survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuardTable {
    entries: HashMap<String, Vec<String>>,
}

impl GuardTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `whitelist` configuration mapping
    pub fn from_whitelist<I, S>(whitelist: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (param, suffixes) in whitelist {
            let param = param.into();
            for suffix in suffixes {
                table.guard(&param, &suffix);
            }
        }
        table
    }

    pub fn guard(&mut self, param: &str, domain_suffix: &str) {
        let suffix = domain_suffix.trim().to_lowercase();
        if suffix.is_empty() {
            return;
        }
        let suffixes = self.entries.entry(param.to_string()).or_default();
        if !suffixes.contains(&suffix) {
            suffixes.push(suffix);
        }
    }

    pub fn is_guarded(&self, param: &str, host: &str) -> bool {
        let host = host.to_lowercase();
        self.entries
            .get(param)
            .map(|suffixes| suffixes.iter().any(|s| host.ends_with(s.as_str())))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Host suffixes for which no rule is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionList {
    suffixes: Vec<String>,
}

impl ExclusionList {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn excludes(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.suffixes.iter().any(|s| host.ends_with(s.as_str()))
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::new(EXCLUDED_HOSTS)
    }
}

/// What a rule sees while it runs
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub host: &'a str,
    pub guards: &'a GuardTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Rule {
    /// Remove `param` on every host
    pub fn global(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            expected_value: None,
            scope: None,
        }
    }

    /// Remove on exactly `domain`; `entry` may be `name` or `name=value`
    pub fn scoped(domain: impl Into<String>, entry: &str) -> Self {
        let (param, expected_value) = match entry.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (entry.to_string(), None),
        };
        Self {
            param,
            expected_value,
            scope: Some(domain.into()),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.expected_value = Some(value.into());
        self
    }

    pub fn applies_to(&self, host: &str) -> bool {
        match &self.scope {
            Some(domain) => domain.eq_ignore_ascii_case(host),
            None => true,
        }
    }

    /// One step of the removal pipeline
    pub fn apply(&self, ctx: &RuleContext<'_>, query: Query) -> Query {
        if !self.applies_to(ctx.host) || ctx.guards.is_guarded(&self.param, ctx.host) {
            return query;
        }

        let matches = match (query.get(&self.param), &self.expected_value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(present), Some(expected)) => present == expected,
        };

        if matches {
            query.without(&self.param)
        } else {
            query
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    guards: GuardTable,
    exclusions: ExclusionList,
}

impl RuleSet {
    /// Duplicate rules are collapsed, keeping the first occurrence.
    pub fn new(rules: Vec<Rule>, guards: GuardTable, exclusions: ExclusionList) -> Self {
        let mut unique: Vec<Rule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if !unique.contains(&rule) {
                unique.push(rule);
            }
        }
        Self {
            rules: unique,
            guards,
            exclusions,
        }
    }

    /// The bundled tracker table with no guards
    pub fn builtin() -> Self {
        let rules = GLOBAL_PARAMS
            .iter()
            .map(|param| Rule::global(*param))
            .chain(
                SCOPED_PARAMS
                    .iter()
                    .map(|(domain, entry)| Rule::scoped(*domain, entry)),
            )
            .collect();
        Self::new(rules, GuardTable::new(), ExclusionList::default())
    }

    pub fn with_guards(mut self, guards: GuardTable) -> Self {
        self.guards = guards;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn guards(&self) -> &GuardTable {
        &self.guards
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_excluded(&self, host: &str) -> bool {
        self.exclusions.excludes(host)
    }

    /// Fold every rule over `query`, left to right
    pub fn apply(&self, host: &str, query: Query) -> Query {
        let ctx = RuleContext {
            host,
            guards: &self.guards,
        };
        self.rules
            .iter()
            .fold(query, |query, rule| rule.apply(&ctx, query))
    }
}
