use anyhow::{Context, Result};
use http::{Request, Response};
use serde_json::json;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use volter::cli::commands::{CardCommand, HistoryCommand, ResolveCommand, SignupCommand};
use volter::cli::output::*;
use volter::cli::{signup, Cli, Command};
use volter::persistence::store::connect;
use volter::{AppConfig, AuditStore, Card, CardOptions, Monitor, ServerError, SqliteAuditStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    // Execute command
    let ok = match &cli.command {
        Command::Card(cmd) => check_card(cmd)?,
        Command::Signup(cmd) => run_signup(cmd, &config).await?,
        Command::Resolve(cmd) => resolve_signup(cmd, &config).await?,
        Command::History(cmd) => show_history(cmd, &config).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn check_card(cmd: &CardCommand) -> Result<bool> {
    let options = CardOptions {
        name: cmd.name.clone(),
        number: cmd.number.clone(),
        expiry: cmd.expiry.clone(),
        cvc: cmd.cvc.clone(),
    };

    match Card::new(options) {
        Ok(card) => {
            if cmd.json {
                let data = json!({
                    "name": card.name,
                    "number": card.masked(),
                    "expiry": card.expiry,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{}", format_card(&card));
            }
            Ok(true)
        }
        Err(e) => {
            println!("{}", format_error(&ServerError::from(e)));
            Ok(false)
        }
    }
}

async fn signup_pipeline(config: &AppConfig) -> Result<signup::SignupPipeline> {
    let pool = connect(&config.database.path.to_string_lossy()).await?;
    signup::prepare(&pool).await.context("Failed to prepare users table")?;
    Ok(signup::pipeline(pool, config.auth.clone())?)
}

async fn run_signup(cmd: &SignupCommand, config: &AppConfig) -> Result<bool> {
    let pipeline = signup_pipeline(config).await?;
    let input = json!({ "email": cmd.email, "name": cmd.name });

    match pipeline.run(input, cmd.token.as_deref()).await {
        Ok(outcome) => {
            if cmd.json {
                let data = json!({ "user": outcome.completed(), "skipped": outcome.is_skipped() });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{}", format_outcome(pipeline.name(), &outcome));
            }
            Ok(!outcome.is_skipped())
        }
        Err(e) => {
            println!("{}", format_error(&e));
            Ok(false)
        }
    }
}

async fn resolve_signup(cmd: &ResolveCommand, config: &AppConfig) -> Result<bool> {
    let pipeline = signup_pipeline(config).await?;

    let mut builder = Request::builder().method("POST").uri(cmd.path.as_str());
    for (name, value) in &cmd.header {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let request = builder
        .body(cmd.args.clone())
        .context("Failed to build request")?;

    let result = pipeline.resolve_outcome(cmd.args.clone(), &request).await;
    let (status, ok) = match &result {
        Ok(outcome) => {
            println!("{}", format_outcome(pipeline.name(), outcome));
            (http::StatusCode::OK, true)
        }
        Err(e) => {
            println!("{}", format_error(e));
            (e.code.status(), false)
        }
    };

    if !cmd.no_audit {
        let store = SqliteAuditStore::with_table(
            &config.database.path.to_string_lossy(),
            &config.monitor.table,
        )
        .await?;
        let mut monitor = Monitor::new(Arc::new(store));
        if !config.monitor.echo {
            monitor = monitor.silent();
        }

        let response = Response::builder()
            .status(status)
            .body(())
            .context("Failed to build response")?;
        let record = monitor.log(&request, &response, cmd.peer).await?;
        println!(
            "{} Request audited (ID: {})",
            INFO,
            style(&record.id.to_string()[..8]).dim()
        );
    }

    Ok(ok)
}

async fn show_history(cmd: &HistoryCommand, config: &AppConfig) -> Result<bool> {
    let store = SqliteAuditStore::with_table(
        &config.database.path.to_string_lossy(),
        &config.monitor.table,
    )
    .await?;

    // If specific record ID is requested
    if let Some(id) = &cmd.id {
        let id = uuid::Uuid::parse_str(id).context("Invalid record ID format")?;
        match store.load(id).await? {
            Some(record) if cmd.json => println!("{}", serde_json::to_string_pretty(&record)?),
            Some(record) => println!("{}", format_record(&record)),
            None => println!("{} Record not found", WARN),
        }
        return Ok(true);
    }

    let records = store.recent(cmd.limit).await?;
    if records.is_empty() {
        println!("{} No requests audited yet", INFO);
        return Ok(true);
    }

    if cmd.json {
        let data = json!({ "records": records, "total": store.count().await? });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!(
            "{} Audited requests (showing latest {} of {}):",
            INFO,
            records.len(),
            store.count().await?
        );
        for record in &records {
            println!("  {}", format_record(record));
        }
    }

    Ok(true)
}
