use clap::Parser;
use frontera_core::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "frontera",
    about = "Frontera strategy coaching API server",
    version
)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, env = "FRONTERA_CONFIG", default_value = "frontera.yaml")]
    config: PathBuf,

    /// Override the configured bind port.
    #[arg(long, env = "FRONTERA_PORT")]
    port: Option<u16>,

    /// Override the configured database path.
    #[arg(long, env = "FRONTERA_DB")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let mut config = Config::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    frontera_server::serve(config).await
}
