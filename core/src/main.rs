/// CipherChat terminal client - main entry point
use cipherchat_core::Config;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let (config, rest) = Config::from_args(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(arg) = rest.first() {
        anyhow::bail!(
            "Unexpected argument '{}'. Usage: {} [--backend <url>] [--sender <alice|bob>] [--log-file <path>]",
            arg,
            args.first().map(String::as_str).unwrap_or("cipherchat")
        );
    }

    // The terminal belongs to the UI, so logs only go to a file when asked
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }

    info!("Starting CipherChat against {}", config.backend_url);
    cipherchat_core::tui::run(&config)
}
