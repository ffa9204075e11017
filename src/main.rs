//! MyAvatar CLI entry point

use std::process::ExitCode;

use clap::Parser;

use myavatar::cli::{
    app::{load_merged_config, run_avatars, run_generate, run_videos, EXIT_ERROR},
    args::{Cli, Commands, GenerateOptions},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use myavatar::domain::config::AppConfig;
use myavatar::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    let presenter = Presenter::new();

    // Config subcommand does not need a merged config
    let command = match command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        backend_url: cli.backend_url.clone(),
        api_token: None, // Token comes from env/file only
        avatar_id: cli.avatar.clone(),
        max_duration: cli.max_duration.clone(),
        poll_interval_ms: cli.poll_interval_ms,
        poll_max_attempts: cli.poll_max_attempts,
        encodings: None,
        poll_past_transport_errors: if cli.poll_past_transport_errors {
            Some(true)
        } else {
            None
        },
        clipboard: if cli.clipboard { Some(true) } else { None },
        notify: if cli.notify { Some(true) } else { None },
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    match command {
        Some(Commands::Avatars) => run_avatars(&config).await,
        Some(Commands::Videos) => run_videos(&config).await,
        Some(Commands::Config { .. }) => unreachable!("handled above"),
        None => {
            let options = GenerateOptions {
                avatar_id: config.avatar_id.clone(),
                title: cli.title.clone(),
                max_duration: config.max_duration_or_default(),
                clipboard: config.clipboard_or_default(),
                notify: config.notify_or_default(),
            };

            run_generate(options, &config).await
        }
    }
}
