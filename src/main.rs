use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "chitravachaka",
    version,
    about = "Read text from images, translate it and speak it aloud"
)]
struct Cli {
    /// Address to listen on (overrides [server].host)
    #[arg(long = "host")]
    host: Option<String>,

    /// Port to listen on (overrides [server].port and PORT)
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "settings")]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    chitravachaka::logging::init(cli.verbose)?;

    let mut settings = chitravachaka::settings::load_settings(cli.settings.as_deref())?;
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    settings.validate()?;

    info!(
        "ocr: {} ({}), speech: {}",
        settings.tesseract_cmd,
        settings.tessdata_dir.display(),
        settings.speech_engine.as_str()
    );
    chitravachaka::server::run_server(settings).await
}
