//! vendod server entry point

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use vendo_config::Config;
use vendo_errors::Error;
use vendod::{router, AppState};

#[derive(Parser, Debug)]
#[clap(name = "vendod")]
#[clap(about = "Digital-goods fulfillment server")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Listening port
    #[clap(long, env = "PORT")]
    port: Option<u16>,

    /// Path to the SQLite credential database
    #[clap(long, env = "DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Path to the TOML product catalog
    #[clap(long, env = "CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Log filter directives, e.g. `vendod=debug`
    #[clap(
        long,
        env = "RUST_LOG",
        default_value = "vendod=info,vendo_fulfill=info,vendo_store=info"
    )]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    if let Err(e) = run(args).await {
        error!("server error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    info!("starting vendod v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(catalog) = args.catalog {
        config.catalog_path = catalog;
    }

    let state = AppState::from_config(&config).await?;
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "fulfillment server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
