//! Load `station_flow_YYYY-Mon-DD.csv` exports into the metro flow table.
//!
//! ```bash
//! subbike-import --dir ./data/flows -f config.yaml
//! subbike-import --dir ./data/flows --dry-run
//! ```

use std::path::PathBuf;

use clap::Parser;
use subbike::{Config, config, import, telemetry};

#[derive(Parser, Debug)]
#[command(author, version, about = "Import hourly station flow CSV files", long_about = None)]
struct ImportArgs {
    /// Directory containing station_flow_*.csv files
    #[arg(long)]
    dir: PathBuf,

    /// Configuration file providing the database connection
    #[arg(short = 'f', long, env = "SUBBIKE_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Parse and validate every file without touching the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = ImportArgs::parse();
    let config: Config = Config::figment(&config::Args {
        config: args.config.clone(),
        validate: false,
    })
    .extract()?;

    telemetry::init_telemetry(config.enable_otel_export, "subbike-import")?;
    tracing::debug!("{:?}", args);

    let pool = if args.dry_run {
        None
    } else {
        let pool = subbike::connect_pool(&config.database).await?;
        subbike::migrator().run(&pool).await?;
        Some(pool)
    };

    let result = import::import_dir(pool.as_ref(), &args.dir).await;

    if let Some(pool) = pool {
        pool.close().await;
    }
    telemetry::shutdown_telemetry();

    let summary = result?;
    println!(
        "{} {} rows from {} files ({} skipped)",
        if args.dry_run { "Parsed" } else { "Imported" },
        summary.rows,
        summary.files,
        summary.skipped
    );

    Ok(())
}
