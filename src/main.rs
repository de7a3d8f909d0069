mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use sg_core::config::Config;
use sg_core::credential::mask_key;
use sg_db::pool::get_conn;
use sg_db::queries::{audit_log, rate_limits, settings};
use sg_server::context::AppContext;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "synthgate=trace,sg_server=trace,sg_db=debug,sg_core=debug,tower_http=debug".to_string()
        } else {
            "synthgate=info,sg_server=info,sg_db=info,sg_core=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so command output on stdout stays scriptable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(config_path);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sg_server::start(config))?;
            Ok(())
        }
        Commands::GenerateApiKey => generate_api_key(config_path),
        Commands::ShowApiKey { reveal } => show_api_key(config_path, reveal),
        Commands::RateLimit { value, reset } => rate_limit(config_path, value, reset),
        Commands::Cleanup => cleanup(config_path),
        Commands::Usage { client_id } => usage(config_path, &client_id),
        Commands::Audit { limit } => audit(config_path, limit),
        Commands::Validate {
            config: validate_path,
        } => validate_config(validate_path.as_deref().or(config_path)),
        Commands::Version => {
            println!("synthgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open(config_path: Option<&Path>) -> Result<AppContext> {
    let config = Config::load_or_default(config_path);
    sg_server::open_context(config).context("failed to open database")
}

fn generate_api_key(config_path: Option<&Path>) -> Result<()> {
    let ctx = open(config_path)?;
    let key = ctx.gate.rotate_key()?;
    println!("{key}");
    Ok(())
}

fn show_api_key(config_path: Option<&Path>, reveal: bool) -> Result<()> {
    let ctx = open(config_path)?;
    match ctx.gate.current_key()? {
        Some(key) if reveal => println!("{key}"),
        Some(key) => println!("{}", mask_key(&key)),
        None => {
            anyhow::bail!("No API key stored. Run `synthgate generate-api-key` or start the server.")
        }
    }
    Ok(())
}

fn rate_limit(config_path: Option<&Path>, value: Option<u32>, reset: bool) -> Result<()> {
    let ctx = open(config_path)?;
    let conn = get_conn(&ctx.db)?;
    let configured = ctx.config.gate.rate_limit_per_minute;

    if reset {
        settings::delete_setting(&conn, settings::RATE_LIMIT)?;
        println!("Rate limit reset to configured {configured}/min");
        return Ok(());
    }

    match value {
        Some(0) => anyhow::bail!("Rate limit must be at least 1"),
        Some(n) => {
            settings::set_setting(&conn, settings::RATE_LIMIT, &n.to_string())?;
            println!("Rate limit set to {n}/min (applies on next server start)");
        }
        None => match settings::get_rate_limit(&conn)? {
            Some(n) => println!("{n}/min (stored; config default {configured}/min)"),
            None => println!("{configured}/min (config)"),
        },
    }
    Ok(())
}

fn cleanup(config_path: Option<&Path>) -> Result<()> {
    let ctx = open(config_path)?;
    let report = sg_server::maintenance::run_sweep_once(&ctx, Utc::now())?;
    let conn = get_conn(&ctx.db)?;
    let remaining = rate_limits::count_windows(&conn)?;
    tracing::info!(
        rate_windows = report.rate_windows,
        audit_entries = report.audit_entries,
        remaining,
        "Manual cleanup complete"
    );
    println!(
        "Removed {} rate windows and {} audit entries ({remaining} windows kept)",
        report.rate_windows, report.audit_entries
    );
    Ok(())
}

fn usage(config_path: Option<&Path>, client_id: &str) -> Result<()> {
    let ctx = open(config_path)?;
    let conn = get_conn(&ctx.db)?;
    let windows = rate_limits::list_for_client(&conn, client_id)?;

    if windows.is_empty() {
        println!("No recorded windows for {client_id}");
        return Ok(());
    }

    println!("Windows for {client_id} (limit {}/min):", ctx.gate.limiter().ceiling());
    for w in &windows {
        println!("  {}  {}", w.window_start, w.request_count);
    }
    Ok(())
}

fn audit(config_path: Option<&Path>, limit: usize) -> Result<()> {
    let ctx = open(config_path)?;
    let conn = get_conn(&ctx.db)?;
    let entries = audit_log::list_recent(&conn, limit)?;

    if entries.is_empty() {
        println!("Audit log is empty (is audit.persist enabled?)");
        return Ok(());
    }

    for e in &entries {
        println!(
            "{}  {:<6} {:<32} {:<24} {}",
            e.created_at,
            e.method,
            e.route,
            e.client_id,
            e.user_agent.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Rate limit: {}/min", config.gate.rate_limit_per_minute);
    println!("  On store failure: {:?}", config.gate.on_store_failure);
    println!("  Max request size: {} bytes", config.validation.max_request_bytes);
    println!(
        "  Audit: enabled={} persist={}",
        config.audit.enabled, config.audit.persist
    );

    for warning in config.validate() {
        println!("  ! {warning}");
    }

    Ok(())
}
