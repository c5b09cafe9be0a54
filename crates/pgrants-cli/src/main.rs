mod config;

use facet::Facet;
use figue as args;
use owo_colors::OwoColorize;
use pgrants::{DbPool, Inspector, Instance, PrivilegeCatalog};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE_URL: &str = "host=localhost user=postgres";

/// Inspect privileges of a PostgreSQL instance.
#[derive(Facet, Debug)]
struct Cli {
    /// Show version information
    #[facet(args::named, args::short = 'V')]
    version: bool,

    /// Configuration file (default: search for .config/pgrants.styx)
    #[facet(default, args::named, args::short = 'c')]
    config: Option<String>,

    /// Connection string (default: $DATABASE_URL)
    #[facet(default, args::named, args::short = 'd')]
    database_url: Option<String>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args_ref: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    let cli: Cli = match args::from_slice(&args_ref) {
        Ok(cli) => cli,
        Err(err) if err.is_help_request() => {
            print!("{}", err.help_text().unwrap_or(""));
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    if cli.version {
        println!("pgrants {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let _ = dotenvy::dotenv();
    // stdout carries the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(run(cli)),
        Err(err) => Err(err.into()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (config, path) = config::load(cli.config.as_deref().map(Path::new))?;
    match path {
        Some(path) => tracing::info!(path = %path.display(), "Loaded configuration."),
        None => tracing::warn!("No configuration file found, using defaults."),
    }

    let catalog = PrivilegeCatalog::builtin();
    for object in config::uninspectable_objects(&config, &catalog) {
        tracing::warn!(object, "Managed privileges for an unknown object type are ignored.");
    }

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    tracing::debug!(database = %mask_password(&database_url), "Connecting.");

    let pool = DbPool::from_conninfo(&database_url)?;
    let instance = Inspector::new(&pool, &catalog).inspect(&config).await?;
    report(&instance);
    Ok(())
}

fn report(instance: &Instance) {
    println!(
        "{} {} as {}",
        "PostgreSQL".bold(),
        instance.server_version_num,
        instance.current_role.cyan()
    );
    println!(
        "{} managed roles, {} grants",
        instance.managed_roles.len(),
        instance.grants.len()
    );

    for db in instance.databases.values() {
        println!();
        println!("{} {}", db.name.bold(), format!("(owner {})", db.owner).dimmed());
        for schema in db.schemas.values() {
            println!(
                "  {} {}",
                schema.name,
                format!("(owner {})", schema.owner).dimmed()
            );
        }
        for grant in instance.grants.iter().filter(|g| g.database == db.name) {
            if grant.partial {
                println!("  {}", grant.yellow());
            } else {
                println!("  {}", grant.green());
            }
        }
    }
}

fn mask_password(url: &str) -> String {
    if let Some(start) = url.find("://") {
        if let Some(at) = url.find('@') {
            let prefix = &url[..start + 3];
            let suffix = &url[at..];
            if let Some(colon) = url[start + 3..at].find(':') {
                let user = &url[start + 3..start + 3 + colon];
                return format!("{prefix}{user}:***{suffix}");
            }
        }
    }
    url.split_whitespace()
        .map(|kv| match kv.split_once('=') {
            Some(("password", _)) => "password=***".to_string(),
            _ => kv.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
