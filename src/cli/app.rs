//! Main app runner for the record-and-generate flow

use std::env;
use std::process::ExitCode;
use std::sync::{Arc, Mutex as StdMutex};

use crate::application::poller::PollError;
use crate::application::{
    GenerateCallbacks, GenerateError, GenerateInput, GenerateVideoUseCase, PollSettings,
    RecordInput,
};
use crate::domain::config::AppConfig;
use crate::domain::recording::select_encoding;
use crate::infrastructure::recording::create_recorder;
use crate::infrastructure::{
    ArboardClipboard, BackendConfig, CpalVoiceRecorder, HttpBackendClient, NotifyRustNotifier,
    XdgConfigStore,
};

use super::args::GenerateOptions;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;
use crate::application::ports::ConfigStore;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

type AppUseCase = GenerateVideoUseCase<
    CpalVoiceRecorder,
    HttpBackendClient,
    ArboardClipboard,
    NotifyRustNotifier,
>;

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    // Build env config
    let env_config = AppConfig {
        api_token: read_non_empty_env("MYAVATAR_API_TOKEN"),
        backend_url: read_non_empty_env("MYAVATAR_BACKEND_URL"),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

fn read_non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Run the one-shot record-and-generate flow
pub async fn run_generate(options: GenerateOptions, config: &AppConfig) -> ExitCode {
    let presenter = Arc::new(StdMutex::new(Presenter::new()));

    if options.avatar_id.as_deref().map(str::trim).unwrap_or("").is_empty() {
        presenter.lock().unwrap().error(
            "No avatar selected. Pass -a <id> or run 'myavatar config set avatar_id <id>' \
             ('myavatar avatars' lists the options).",
        );
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    // Setup signal handler
    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    // Create adapters
    let recorder = create_recorder();
    let backend = Arc::new(HttpBackendClient::new(BackendConfig::from_config(config)));
    let clipboard = ArboardClipboard::new();
    let notifier = NotifyRustNotifier::new();

    let use_case: Arc<AppUseCase> = Arc::new(GenerateVideoUseCase::new(
        recorder,
        backend,
        clipboard,
        notifier,
        PollSettings::from_config(config),
    ));

    // Ctrl-C halts whatever phase is active: the record loop finalizes,
    // the poller cancels.
    {
        let shutdown_flag = shutdown.flag();
        let use_case = Arc::clone(&use_case);
        tokio::spawn(async move {
            loop {
                if shutdown_flag.load(std::sync::atomic::Ordering::SeqCst) {
                    use_case.stop_recording_early();
                    use_case.cancel_generation();
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        });
    }

    // Enter finalizes the recording early
    {
        let use_case = Arc::clone(&use_case);
        tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
            use_case.stop_recording_early();
        });
    }

    let encoding = select_encoding(&config.encodings_or_default());
    let record_input = RecordInput {
        max_duration: options.max_duration,
        encoding,
    };

    let callbacks = build_callbacks(Arc::clone(&presenter));

    presenter.lock().unwrap().start_spinner(&format!(
        "Recording ({})... press Enter to stop",
        encoding
    ));

    if let Err(error) = use_case.record(record_input, &callbacks).await {
        presenter.lock().unwrap().spinner_fail("Recording failed");
        presenter.lock().unwrap().error(&error.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    if shutdown.is_shutdown() {
        let _ = use_case.reset().await;
        presenter.lock().unwrap().stop_spinner();
        presenter.lock().unwrap().warn("Cancelled");
        return ExitCode::from(EXIT_ERROR);
    }

    presenter
        .lock()
        .unwrap()
        .start_spinner("Uploading recording...");

    let generate_input = GenerateInput {
        avatar_id: options.avatar_id.clone(),
        title: options.title.clone(),
        enable_clipboard: options.clipboard,
        enable_notify: options.notify,
    };

    match use_case.generate(generate_input, &callbacks).await {
        Ok(output) => {
            presenter
                .lock()
                .unwrap()
                .spinner_success(&format!("Video ready after {} checks", output.attempts));

            // The URL is the result; everything else goes to stderr.
            presenter.lock().unwrap().output(&output.video_url);

            if output.clipboard_copied {
                presenter.lock().unwrap().info("Copied to clipboard");
            }

            ExitCode::from(EXIT_SUCCESS)
        }
        Err(GenerateError::Poll(PollError::Cancelled)) => {
            presenter.lock().unwrap().stop_spinner();
            presenter.lock().unwrap().warn("Cancelled");
            ExitCode::from(EXIT_ERROR)
        }
        Err(GenerateError::Poll(PollError::PollingTimeout { attempts })) => {
            presenter.lock().unwrap().spinner_fail("Timed out");
            presenter.lock().unwrap().error(&format!(
                "No result after {} checks. The video may still finish; \
                 see 'myavatar videos' later.",
                attempts
            ));
            ExitCode::from(EXIT_ERROR)
        }
        Err(error) => {
            presenter.lock().unwrap().spinner_fail("Generation failed");
            presenter.lock().unwrap().error(&error.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn build_callbacks(presenter: Arc<StdMutex<Presenter>>) -> GenerateCallbacks {
    let recording_presenter = Arc::clone(&presenter);
    let end_presenter = Arc::clone(&presenter);
    let upload_presenter = Arc::clone(&presenter);
    let accepted_presenter = Arc::clone(&presenter);
    let progress_presenter = presenter;

    GenerateCallbacks {
        on_recording_progress: Some(Arc::new(move |elapsed_ms, max_ms| {
            recording_presenter
                .lock()
                .unwrap()
                .update_recording_progress(elapsed_ms, max_ms);
        })),
        on_recording_end: Some(Box::new(move |size: &str| {
            end_presenter
                .lock()
                .unwrap()
                .spinner_success(&format!("Recording complete ({})", size));
        })),
        on_upload_start: Some(Box::new(move || {
            upload_presenter
                .lock()
                .unwrap()
                .update_spinner("Uploading recording...");
        })),
        on_job_accepted: Some(Box::new(move |job_id: &str| {
            accepted_presenter
                .lock()
                .unwrap()
                .update_spinner(&format!("Generating (job {})...", job_id));
        })),
        on_generation_progress: Some(Arc::new(move |percent| {
            progress_presenter
                .lock()
                .unwrap()
                .update_generation_progress(percent);
        })),
    }
}

/// Run the `avatars` subcommand
pub async fn run_avatars(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let backend = HttpBackendClient::new(BackendConfig::from_config(config));

    match super::library_cmd::handle_avatars_command(&backend, &presenter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(error) => {
            presenter.error(&error.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the `videos` subcommand
pub async fn run_videos(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let backend = HttpBackendClient::new(BackendConfig::from_config(config));

    match super::library_cmd::handle_videos_command(&backend, &presenter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(error) => {
            presenter.error(&error.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
