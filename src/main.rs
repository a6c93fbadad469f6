//! artetv - ARTE catalog browser and player adapter
//!
//! # Usage
//!
//! ```bash
//! # Root menu
//! artetv
//!
//! # Browse a collection (JSON for automation)
//! artetv "?mode=collection&path=CATEGORIES" --json
//!
//! # Resolve a stream
//! artetv "?mode=watch&id=110342-012-A"
//! ```

use clap::Parser;
use log::{debug, warn};

use artetv::cli::{Cli, ExitCode, Output};
use artetv::config::{self, Config};
use artetv::navigation::Addon;
use artetv::terminal::TerminalHost;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level()),
    )
    .try_init();

    run(cli).await.into()
}

/// Serve one request and return exit code
async fn run(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let mut settings = match cli.config {
        Some(ref path) => Config::load_from(path),
        None => Config::load(),
    };

    let language = match cli.language {
        Some(ref language) => match config::supported(language.clone()) {
            Some(language) => language,
            None => {
                return output.reject(
                    format!("Unsupported language: {}", language),
                    ExitCode::InvalidArgs,
                )
            }
        },
        None => {
            let saved = settings.language.clone();
            let language = settings.resolve_language(config::system_language().as_deref());
            if settings.language != saved {
                save_settings(&cli, &settings);
            }
            language
        }
    };
    debug!("Catalog language: {}", language);

    let addon = match Addon::new(cli.base_url.as_str(), &cli.params, &language) {
        Ok(addon) => addon,
        Err(e) => return output.fail(&anyhow::Error::from(e)),
    };

    let mut host = TerminalHost::new(output, settings.media_dir())
        .with_api_version(cli.host_version)
        .with_inputstream(!cli.no_inputstream)
        .with_query(cli.query.clone());

    match addon.run(&mut host).await {
        Ok(()) => host.exit_code(),
        Err(e) => output.fail(&e),
    }
}

/// Persist a detected language, best effort
fn save_settings(cli: &Cli, settings: &Config) {
    let result = match cli.config {
        Some(ref path) => settings.save_to(path),
        None => settings.save(),
    };
    if let Err(e) = result {
        warn!("Could not save settings: {}", e);
    }
}
