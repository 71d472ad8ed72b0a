use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;

use shield_core::{
    Action, ActionOutcome, ActionRunner, CommandMenu, Config, Database, LogRegistrar, SiteData,
    SiteDataCleaner, SiteOrigin, StatsCounter,
};

use crate::console::ConsoleNotifier;

pub async fn run(
    config: Config,
    url: String,
    db: PathBuf,
    action: Action,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    config.validate()?;

    let origin = SiteOrigin::parse(&url)?;
    let data = SiteData::new(Database::open(&db)?);
    tracing::info!(origin = %origin, db = %db.display(), action = %action, "Running clear action");

    let stats = Arc::new(StatsCounter::new());
    let menu = Arc::new(CommandMenu::new(LogRegistrar::new(), stats.clone()));
    menu.refresh();

    let runner = ActionRunner::new(
        SiteDataCleaner::new(data, origin),
        ConsoleNotifier::new(config.toast_duration(), yes),
        menu,
        stats,
    );

    let report = match runner.run(action).await {
        ActionOutcome::Cancelled => {
            eprintln!("cancelled");
            return Ok(());
        }
        ActionOutcome::Cleared(report) => report,
        ActionOutcome::ReloadRequested(report) => {
            println!("reload requested");
            report
        }
        ActionOutcome::StatsShown(_) => return Ok(()),
        ActionOutcome::OpenUrl(url) => {
            println!("{url}");
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (operation, ok) in report.results() {
            println!("{:<16} {}", operation.label(), if *ok { "ok" } else { "failed" });
        }
    }

    if !report.all_ok() {
        bail!("{} operation(s) failed", report.failed().len());
    }
    Ok(())
}
