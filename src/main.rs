use clap::Parser;
use tracing_subscriber::EnvFilter;

use molty::cli::Cli;
use molty::config::Config;

#[tokio::main]
async fn main() {
    // .env is optional; a missing file is not an error.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    if let Err(err) = molty::run(&config, cli).await {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
