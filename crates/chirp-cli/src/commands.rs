use anyhow::{bail, Context};
use chirp_ledger::{LikeValidator, SqliteLikeLedger};
use chirp_server::{ChirpServer, ServerConfig, StorageBackend};
use chirp_store::Database;
use colored::Colorize;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Migrate(args) => cmd_migrate(args).await,
        Command::Config(args) => cmd_config(args),
        Command::Audit(args) => cmd_audit(args).await,
    }
}

fn load_config(args: &StorageArgs) -> anyhow::Result<ServerConfig> {
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = &args.database_url {
        config.database.url = url.clone();
    }
    Ok(config)
}

async fn open_database(config: &ServerConfig) -> anyhow::Result<Database> {
    debug!(url = %config.database.url, "opening database");
    Database::connect(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.url))
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.storage)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.in_memory {
        config.storage = StorageBackend::Memory;
    }
    if args.expose_internal_errors {
        config.expose_internal_errors = true;
    }
    println!("{} chirp on {}", "▶".green().bold(), config.bind_addr.to_string().bold());
    ChirpServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_migrate(args: StorageArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let db = open_database(&config).await?;
    let before = db.schema_version().await?;
    let after = db.migrate().await?;
    db.close().await;
    if after > before {
        println!(
            "{} Migrated {} from v{} to v{}",
            "✓".green().bold(),
            config.database.url.bold(),
            before,
            after
        );
    } else {
        println!("{} {} is up to date (v{})", "✓".green(), config.database.url.bold(), after);
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(args.config.as_deref())?;
    print!("{}", config.redacted().to_toml()?);
    Ok(())
}

async fn cmd_audit(args: StorageArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let db = open_database(&config).await?;
    if db.schema_version().await? == 0 {
        db.close().await;
        bail!("{} has no schema; run `chirp migrate` first", config.database.url);
    }

    let ledger = SqliteLikeLedger::new(db.clone());
    let reports = LikeValidator::audit_all(&ledger).await;
    db.close().await;
    let reports = reports?;

    let mut failed = 0;
    for report in &reports {
        if report.is_valid() {
            println!(
                "  {} post {}: {} rows, {} active",
                "ok".green(),
                report.post_id,
                report.event_count,
                report.active_count
            );
            continue;
        }
        failed += 1;
        println!("  {} post {}", "FAIL".red().bold(), report.post_id);
        for violation in &report.violations {
            println!("      {:?}: {}", violation.kind, violation.description);
        }
    }

    if failed > 0 {
        bail!("{failed} of {} posts failed the like audit", reports.len());
    }
    println!("{} {} posts audited, no violations", "✓".green().bold(), reports.len());
    Ok(())
}
