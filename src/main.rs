use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lineposter::logging;
use lineposter::storage::{AppDirs, Config, ConfigStorage, TomlConfigStorage};
use lineposter::{DispatchResult, Dispatcher, Payload};

#[derive(Parser)]
#[command(name = "lineposter")]
#[command(about = "Share text and images with the LINE app", long_about = None)]
struct Cli {
    /// Open the web share URL when LINE is not installed
    #[arg(long, global = true)]
    fallback: bool,

    /// Config file (default: $XDG_CONFIG_HOME/lineposter/lineposter.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory bundled assets are read from
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a text message (reads stdin when MESSAGE is omitted)
    Text { message: Option<String> },

    /// Post an image by local path
    Image { path: PathBuf },

    /// Stage a bundled asset and post it as an image
    Asset { asset_path: String },

    /// Print the URI that would be opened, without opening it
    Uri {
        #[arg(value_enum)]
        kind: UriKind,
        payload: String,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum UriKind {
    Text,
    Image,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let dirs = AppDirs::ensure()?;
    let config_storage =
        TomlConfigStorage::new(cli.config.clone().unwrap_or_else(|| dirs.config_file()));

    // Config decides which logger to install, so the load itself is not logged
    let loaded = config_storage.load();
    match &loaded {
        Ok(c) if c.logging.file => logging::init_logger(
            logging::default_log_path(&dirs.data),
            &c.logging.file_level,
            &c.logging.echo_level,
        )?,
        _ => env_logger::init(),
    }
    let mut config = loaded?;

    if cli.fallback {
        config.general.allow_fallback = true;
    }
    if let Some(assets_dir) = cli.assets_dir {
        config.storage.assets_dir = Some(assets_dir);
    }

    let dispatcher = Dispatcher::from_config(&config, dirs.files());
    let result = match cli.command {
        Commands::Text { message } => cmd_text(&dispatcher, message)?,
        Commands::Image { path } => cmd_image(&dispatcher, &path),
        Commands::Asset { asset_path } => cmd_asset(&dispatcher, &asset_path)?,
        Commands::Uri { kind, payload } => cmd_uri(&dispatcher, kind, payload),
        Commands::Config => return cmd_config(&config_storage, &config),
    };

    if !result.is_success() {
        eprintln!("{}", describe(result));
    }
    Ok(exit_code(result))
}

/// Post text from the argument or stdin
fn cmd_text(dispatcher: &Dispatcher, message: Option<String>) -> Result<DispatchResult> {
    let message = match message {
        Some(message) => message,
        None => read_stdin()?,
    };
    Ok(dispatcher.post_text(&message))
}

/// Post a local image
fn cmd_image(dispatcher: &Dispatcher, path: &Path) -> DispatchResult {
    dispatcher.post_image(path)
}

/// Stage a bundled asset and post it
fn cmd_asset(dispatcher: &Dispatcher, asset_path: &str) -> Result<DispatchResult> {
    if dispatcher.stager().is_none() {
        bail!("No assets directory configured. Pass --assets-dir or set storage.assets_dir");
    }
    Ok(dispatcher.post_assets_image(asset_path))
}

/// Print the share URI for the current install state
fn cmd_uri(dispatcher: &Dispatcher, kind: UriKind, payload: String) -> DispatchResult {
    let payload = match kind {
        UriKind::Text => Payload::Text(payload),
        UriKind::Image => Payload::ImagePath(PathBuf::from(payload)),
    };
    match dispatcher.share_uri(&payload) {
        Ok(share) => {
            println!("{}", share.uri);
            DispatchResult::Succeeded
        }
        Err(result) => result,
    }
}

/// Show the config file path and effective values
fn cmd_config(storage: &TomlConfigStorage, config: &Config) -> Result<ExitCode> {
    println!("Config file: {}", storage.path().display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize configuration")?
    );
    Ok(ExitCode::SUCCESS)
}

/// Read a message from stdin, dropping one trailing newline
fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read message from stdin")?;
    if buffer.ends_with('\n') {
        buffer.pop();
        if buffer.ends_with('\r') {
            buffer.pop();
        }
    }
    Ok(buffer)
}

fn describe(result: DispatchResult) -> &'static str {
    match result {
        DispatchResult::Succeeded => "Shared.",
        DispatchResult::AppNotInstalled => {
            "The LINE app is not installed. Use --fallback to share through the web."
        }
        DispatchResult::EncodingFailed => "Failed to encode the message as UTF-8.",
        DispatchResult::AssetCopyFailed => "Failed to copy the image from the assets directory.",
    }
}

fn exit_code(result: DispatchResult) -> ExitCode {
    match result {
        DispatchResult::Succeeded => ExitCode::SUCCESS,
        DispatchResult::AppNotInstalled => ExitCode::from(2),
        DispatchResult::AssetCopyFailed => ExitCode::from(3),
        DispatchResult::EncodingFailed => ExitCode::from(4),
    }
}
