use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};

use shield_core::{
    CommandMenu, Config, HistoryHost, LogRegistrar, MemoryHistory, NavigationSignal, Shield,
};

/// One line of the watch script
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Router navigation nobody hears about
    Push(String),
    /// Page script calling the intercepted replace
    Replace(String),
    Back,
    Forward,
    Hash(String),
    Wait(Duration),
    Show,
}

impl Step {
    fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        let step = match (command, arg.is_empty()) {
            ("push", false) => Step::Push(arg.to_string()),
            ("replace", false) => Step::Replace(arg.to_string()),
            ("back", true) => Step::Back,
            ("forward", true) => Step::Forward,
            ("hash", _) => Step::Hash(arg.to_string()),
            ("wait", false) => {
                let ms: u64 = arg
                    .parse()
                    .with_context(|| format!("invalid wait duration '{arg}'"))?;
                Step::Wait(Duration::from_millis(ms))
            }
            ("show", true) => Step::Show,
            _ => bail!("unrecognized command '{line}'"),
        };
        Ok(Some(step))
    }
}

pub async fn run(config: Config, url: String) -> anyhow::Result<()> {
    let shield = Shield::new(config)?;
    let history = Arc::new(MemoryHistory::new(url));
    let installed = shield.install(history.clone());

    let watcher = tokio::spawn(installed.watcher.run(installed.signals));

    // Menu labels carry the live token count
    let menu = Arc::new(CommandMenu::new(LogRegistrar::new(), shield.stats().clone()));
    menu.refresh();
    let menu_refresh = menu.spawn_refresh(shield.config().menu_refresh_interval());
    let page = installed.history;
    let source = installed.source;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let step = match Step::parse(&line) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match step {
            Step::Push(url) => history.push(url),
            Step::Replace(url) => {
                if let Err(e) = page.replace_state(&url) {
                    eprintln!("replace failed: {e}");
                }
            }
            Step::Back => match history.back() {
                Ok(_) => {
                    source.emit(NavigationSignal::HistoryPop);
                }
                Err(e) => eprintln!("{e}"),
            },
            Step::Forward => match history.forward() {
                Ok(_) => {
                    source.emit(NavigationSignal::HistoryPop);
                }
                Err(e) => eprintln!("{e}"),
            },
            Step::Hash(fragment) => {
                history.navigate_fragment(&fragment);
                source.emit(NavigationSignal::HashChange);
            }
            Step::Wait(duration) => tokio::time::sleep(duration).await,
            Step::Show => {
                // Let pending signals drain first
                tokio::task::yield_now().await;
                println!("{}", history.current());
            }
        }
    }

    // Closing every sender ends the watcher loop
    drop(page);
    drop(source);
    let report = watcher.await?;
    menu_refresh.abort();
    menu.refresh();

    println!("{}", history.current());
    eprintln!(
        "{} signal(s), {} poll tick(s), {} rewrite(s)",
        report.signals, report.poll_ticks, report.rewrites
    );
    eprintln!("{}", serde_json::to_string(&shield.stats().snapshot())?);

    Ok(())
}
