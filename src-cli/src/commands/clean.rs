use shield_core::{Config, Shield};

use super::inputs_or_stdin;

pub fn run(config: Config, urls: Vec<String>, verbose: bool) -> anyhow::Result<()> {
    let shield = Shield::new(config)?;

    for url in inputs_or_stdin(urls)? {
        match shield.strip_url(&url) {
            Some(rewrite) => {
                if verbose {
                    eprintln!(
                        "removed {} token(s): {}{}",
                        rewrite.tokens(),
                        rewrite.removed_params.join(", "),
                        if rewrite.fragment_stripped {
                            " (+fragment)"
                        } else {
                            ""
                        }
                    );
                }
                println!("{}", rewrite.to);
            }
            None => println!("{url}"),
        }
    }

    Ok(())
}

pub fn run_fragments(config: Config, fragments: Vec<String>) -> anyhow::Result<()> {
    let cleaner = config.fragment_cleaner()?;

    for fragment in inputs_or_stdin(fragments)? {
        println!("{}", cleaner.clean_fragment(&fragment));
    }

    Ok(())
}
