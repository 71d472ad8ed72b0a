//! One-shot page hardening
//!
//! Applied once per page, before any page script runs. A host lacking a
//! capability skips that step; nothing here is fatal.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::error::HostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HardeningStep {
    DisableDnsPrefetch,
    SuppressReferrer,
    NeutralizeBeacon,
    SpoofBattery,
    HideNetworkInformation,
    ClearPerformanceEntries,
}

impl HardeningStep {
    pub const ALL: [HardeningStep; 6] = [
        HardeningStep::DisableDnsPrefetch,
        HardeningStep::SuppressReferrer,
        HardeningStep::NeutralizeBeacon,
        HardeningStep::SpoofBattery,
        HardeningStep::HideNetworkInformation,
        HardeningStep::ClearPerformanceEntries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HardeningStep::DisableDnsPrefetch => "disable-dns-prefetch",
            HardeningStep::SuppressReferrer => "suppress-referrer",
            HardeningStep::NeutralizeBeacon => "neutralize-beacon",
            HardeningStep::SpoofBattery => "spoof-battery",
            HardeningStep::HideNetworkInformation => "hide-network-information",
            HardeningStep::ClearPerformanceEntries => "clear-performance-entries",
        }
    }

    /// Script body for webview hosts
    pub fn script(&self) -> &'static str {
        match self {
            HardeningStep::DisableDnsPrefetch => {
                r#"const meta = document.createElement('meta');
      meta.httpEquiv = 'x-dns-prefetch-control';
      meta.content = 'off';
      (document.head || document.documentElement).appendChild(meta);"#
            }
            HardeningStep::SuppressReferrer => {
                r#"const meta = document.createElement('meta');
      meta.name = 'referrer';
      meta.content = 'no-referrer';
      const target = document.head || document.documentElement;
      if (target) target.insertBefore(meta, target.firstChild);"#
            }
            HardeningStep::NeutralizeBeacon => {
                r#"if ('sendBeacon' in navigator) navigator.sendBeacon = () => false;"#
            }
            HardeningStep::SpoofBattery => {
                r#"if (navigator.getBattery) {
        navigator.getBattery = () => Promise.resolve({
          charging: true, level: 1,
          onchargingchange: null, onlevelchange: null,
          onchargingtimechange: null, ondischargingtimechange: null,
        });
      }"#
            }
            HardeningStep::HideNetworkInformation => {
                r#"if (navigator.connection) {
        Object.defineProperty(navigator, 'connection', { get: () => undefined, configurable: false });
      }"#
            }
            HardeningStep::ClearPerformanceEntries => {
                r#"if (window.performance) {
        if (typeof performance.clearResourceTimings === 'function') performance.clearResourceTimings();
        if (typeof performance.clearMeasures === 'function') performance.clearMeasures();
      }"#
            }
        }
    }
}

impl std::fmt::Display for HardeningStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host side of the hardening steps
pub trait PageHardening {
    fn apply(&self, step: HardeningStep) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardeningReport {
    pub applied: Vec<HardeningStep>,
    /// Capability missing on this host
    pub skipped: Vec<HardeningStep>,
    pub failed: Vec<HardeningStep>,
}

/// Apply every step in order
pub fn harden<P: PageHardening + ?Sized>(page: &P) -> HardeningReport {
    let mut report = HardeningReport::default();

    for step in HardeningStep::ALL {
        match page.apply(step) {
            Ok(()) => report.applied.push(step),
            Err(HostError::Unavailable(capability)) => {
                tracing::debug!(step = %step, capability = %capability, "Hardening step skipped");
                report.skipped.push(step);
            }
            Err(e) => {
                tracing::debug!(step = %step, error = %e, "Hardening step failed");
                report.failed.push(step);
            }
        }
    }

    tracing::debug!(
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        "Page hardened"
    );

    report
}

/// Collects step scripts instead of running them
#[derive(Default)]
struct ScriptPage {
    body: RefCell<String>,
}

impl PageHardening for ScriptPage {
    fn apply(&self, step: HardeningStep) -> Result<(), HostError> {
        let mut body = self.body.borrow_mut();
        body.push_str("  // ");
        body.push_str(step.as_str());
        body.push_str("\n  try {\n      ");
        body.push_str(step.script());
        body.push_str("\n  } catch {}\n");
        Ok(())
    }
}

/// Every step as one initialization script, each guarded on its own
pub fn init_script() -> String {
    let page = ScriptPage::default();
    harden(&page);
    format!("(() => {{\n{}}})();\n", page.body.into_inner())
}
