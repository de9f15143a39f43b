//! Import accounts from a legacy `users.json` export into PostgreSQL.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use tracing_subscriber::{EnvFilter, fmt};

use routeshare::legacy_import::{LegacyImporter, parse_legacy_users};
use routeshare::outbound::password::Argon2PasswordHasher;
use routeshare::outbound::persistence::{
    DbPool, DieselRouteRepository, DieselUserRepository, PoolConfig, run_migrations,
};

#[derive(Debug, Parser)]
#[command(name = "import-legacy-users", about = "Import legacy users.json accounts")]
struct Cli {
    /// Path to the legacy JSON document.
    input: PathBuf,
    /// PostgreSQL connection URL.
    #[arg(long)]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    let cli = Cli::parse();
    let bytes = fs::read(&cli.input)
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;
    let legacy = parse_legacy_users(&bytes)?;

    run_migrations(&cli.database_url).await?;
    let pool = DbPool::new(PoolConfig::new(cli.database_url.as_str()).with_max_size(2)).await?;

    let importer = LegacyImporter::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselRouteRepository::new(pool)),
        Arc::new(Argon2PasswordHasher::default()),
        Arc::new(DefaultClock),
    );
    let report = importer.import(legacy).await?;

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "imported {}, already present {}, rejected {}, routes linked {}, routes missing {}",
        report.imported.len(),
        report.existing.len(),
        report.rejected.len(),
        report.linked_routes,
        report.missing_routes.len()
    )?;
    for (username, field) in &report.rejected {
        writeln!(out, "rejected {username}: invalid {field}")?;
    }
    Ok(())
}
