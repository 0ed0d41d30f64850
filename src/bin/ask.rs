use std::env;

use anyhow::{Context, bail};

use courtside::artifact::Artifact;
use courtside::catalog::{self, build_catalog};
use courtside::commands::{self, CommandContext, Invocation};
use courtside::config::BotConfig;
use courtside::log_pane;
use courtside::stats_fetch::provider_from_config;

// Runs one chat command and prints the replies, e.g.
// `ask search LeBron James` or `ask '!team Boston Celtics'`.
fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    log_pane::init_stderr_logging()?;

    let config = BotConfig::from_env();
    let raw = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if raw.trim().is_empty() {
        bail!("usage: ask <command> [args...]");
    }
    let line = if Invocation::parse(&raw, &config.prefix).is_some() {
        raw
    } else {
        format!("{}{}", config.prefix, raw.trim())
    };

    let provider = provider_from_config(&config).context("stats provider setup failed")?;
    let catalog = catalog::install(build_catalog(config.catalog_source, provider.as_ref()));
    let ctx = CommandContext::new(&config, catalog, provider);
    let invocation = Invocation::parse(&line, &ctx.prefix).context("not a command line")?;

    let mut replies: Vec<Artifact> = Vec::new();
    let result = commands::run(&ctx, &invocation, &mut replies);
    for reply in &replies {
        match reply {
            Artifact::Text(text) => println!("{text}"),
            Artifact::Image { .. } => println!("[image] {}", reply.summary()),
        }
    }

    if let Err(err) = result {
        tracing::warn!(command = %invocation.command, error = %err, "command failed");
        std::process::exit(1);
    }
    Ok(())
}
