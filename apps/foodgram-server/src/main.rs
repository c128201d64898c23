use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use clap::{Parser, Subcommand};
use foodgram::{Foodgram, FoodgramConfig};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const FOODGRAM_SECTION: &str = "foodgram";
const INGRESS_SECTION: &str = "api_ingress";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` when no query is given so the file is created on first run.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// Foodgram Server - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram-server")]
#[command(about = "Foodgram Server - recipe sharing backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Foodgram Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
        Commands::Migrate => migrate(config).await,
    }
}

/// Detect DB backend from URL scheme. Only backends compiled into sea-orm are accepted.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim().to_owned();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(&raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

fn database_section(config: &AppConfig) -> Result<&DatabaseConfig> {
    config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database configuration is required (database.url)"))
}

async fn connect_db(db_config: &DatabaseConfig, base_dir: &Path) -> Result<DatabaseConnection> {
    let backend = detect_from_dsn(db_config)?;

    let mut dsn = db_config.url.trim().to_owned();
    if backend == "sqlite" && dsn.starts_with("sqlite://") {
        dsn = absolutize_sqlite_dsn(&dsn, base_dir, true)?;
    }
    // An in-memory database exists per connection; keep the pool at one.
    let max_conns = if dsn == "sqlite::memory:" {
        1
    } else {
        db_config.max_conns.unwrap_or(10)
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(max_conns)
        .acquire_timeout(Duration::from_millis(
            db_config.acquire_timeout_ms.unwrap_or(5000),
        ))
        .sqlx_logging(false);

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))?;
    tracing::info!("Connected DB backend: {}", backend);
    Ok(db)
}

fn ingress_config(config: &AppConfig) -> Result<ApiIngressConfig> {
    let mut cfg: ApiIngressConfig = config.module_config(INGRESS_SECTION)?;
    if !config.modules.contains_key(INGRESS_SECTION) && config.server.timeout_sec > 0 {
        cfg.request_timeout_secs = config.server.timeout_sec;
    }
    Ok(cfg)
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let foodgram_cfg: FoodgramConfig = config.module_config(FOODGRAM_SECTION)?;
    let ingress = ApiIngress::new(ingress_config(&config)?);
    let addr = ingress.bind_addr(&config.server.host, config.server.port)?;

    let base_dir = PathBuf::from(&config.server.home_dir);
    let db = connect_db(database_section(&config)?, &base_dir).await?;
    Foodgram::migrate(&db).await?;

    let foodgram = Foodgram::init(db, foodgram_cfg);
    let router = ingress.build_router(
        foodgram.register_rest(axum::Router::new()),
        Some(foodgram.openapi()),
    );

    let cancel = CancellationToken::new();
    let c = cancel.clone();
    tokio::spawn(async move {
        match shutdown::wait_for_shutdown().await {
            Ok(()) => tracing::info!("shutdown: signal received"),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "shutdown: primary waiter failed; falling back to ctrl_c()"
                );
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        c.cancel();
    });

    ingress.serve(addr, router, cancel).await
}

async fn migrate(config: AppConfig) -> Result<()> {
    let base_dir = PathBuf::from(&config.server.home_dir);
    let db = connect_db(database_section(&config)?, &base_dir).await?;
    Foodgram::migrate(&db).await?;
    println!("Migrations applied");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let db = database_section(&config)?;
    let backend = detect_from_dsn(db)?;
    let _: FoodgramConfig = config.module_config(FOODGRAM_SECTION)?;
    let ingress = ApiIngress::new(ingress_config(&config)?);
    let addr = ingress.bind_addr(&config.server.host, config.server.port)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Database backend: {backend}");
    println!("Listen address: {addr}");
    println!("{}", config.to_yaml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dsn_is_kept() {
        let out = absolutize_sqlite_dsn("sqlite://:memory:", Path::new("/tmp"), false).unwrap();
        assert_eq!(out, "sqlite::memory:");
    }

    #[test]
    fn relative_dsn_is_anchored_to_home() {
        let out =
            absolutize_sqlite_dsn("sqlite://database/foodgram.db", Path::new("/srv/fg"), false)
                .unwrap();
        assert_eq!(out, "sqlite:///srv/fg/database/foodgram.db?mode=rwc");

        let out = absolutize_sqlite_dsn("sqlite:///var/db.sqlite?mode=ro", Path::new("/x"), false)
            .unwrap();
        assert_eq!(out, "sqlite:///var/db.sqlite?mode=ro");
    }

    #[test]
    fn dsn_scheme_detection() {
        let cfg = |url: &str| DatabaseConfig {
            url: url.to_owned(),
            max_conns: None,
            acquire_timeout_ms: None,
        };
        assert_eq!(detect_from_dsn(&cfg("sqlite://db.sqlite")).unwrap(), "sqlite");
        assert_eq!(
            detect_from_dsn(&cfg("postgres://u:p@localhost/fg")).unwrap(),
            "postgres"
        );
        assert!(detect_from_dsn(&cfg("mysql://localhost/fg")).is_err());
        assert!(detect_from_dsn(&cfg("")).is_err());
    }
}
