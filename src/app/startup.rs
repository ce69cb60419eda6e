//! Application startup: configuration, logging, wiring and command dispatch

use std::sync::Arc;

use clap::Parser;

use crate::app::cli::api::{
    creation_failure_message, format_created, format_list, format_removed, format_status,
    format_sweep, join_label, Args, Command, Config, NotifyBackend,
};
use crate::core::error_handling::{display_message, log_error_with_context};
use crate::core::logging::init_logging;
use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownCoordinator;
use crate::extract::api::{ExtractError, FetchSettings, HttpExtractor};
use crate::notifications::api::{
    LogNotifier, NotificationDispatcher, NotificationError, Notifier, TelegramNotifier,
};
use crate::store::api::{MemoryRepository, Repository, SqliteRepository, StoreError, StoreResult};
use crate::watcher::api::{CreateRequest, WatchError, WatchService, WatchSettings};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Could not open the item store: {0}")]
    Store(#[from] StoreError),

    #[error("Could not set up page fetching: {0}")]
    Extract(#[from] ExtractError),

    #[error("Could not set up notifications: {0}")]
    Notification(#[from] NotificationError),
}

/// Parse arguments, run the selected command and return the exit code
pub async fn startup() -> i32 {
    let args = Args::parse();
    let use_color = args.use_color();

    let mut config = match Config::load(args.config_file.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    config.apply_args(&args);

    let log_format = config.logging.format.map(|f| f.to_string());
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        config.logging.level.as_deref(),
        log_format.as_deref(),
        log_file.as_deref(),
        use_color && log_file.is_none(),
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    log::debug!(
        "pagewatch {} ({}, built {}) running '{}'",
        env!("CARGO_PKG_VERSION"),
        crate::GIT_HASH,
        crate::BUILD_TIME,
        args.command.name()
    );

    let service = match build_service(&config) {
        Ok(service) => service,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    run_command(&args.command, &service, use_color).await
}

/// The repository selected by `[storage] database`
pub fn build_repository(config: &Config) -> StoreResult<Arc<dyn Repository>> {
    let cap = config.watch.max_items_per_owner;
    match config.database_path() {
        Some(path) => {
            log::debug!("Using database {}", path.display());
            Ok(Arc::new(SqliteRepository::open(&path, cap)?))
        }
        None => {
            log::warn!("Using the in-memory store; items are lost on exit");
            Ok(Arc::new(MemoryRepository::new(cap)))
        }
    }
}

pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>, NotificationError> {
    match config.notify.backend {
        NotifyBackend::Log => Ok(Arc::new(LogNotifier::new()?)),
        NotifyBackend::Telegram => {
            let token = config.telegram_token().unwrap_or_default();
            Ok(Arc::new(TelegramNotifier::new(token, config.request_timeout())?))
        }
    }
}

/// Wire repository, extractor and notifier into a service
pub fn build_service(config: &Config) -> Result<WatchService, StartupError> {
    let repository = build_repository(config)?;
    let extractor = HttpExtractor::new(FetchSettings {
        user_agent: config.watch.user_agent.clone(),
        timeout: config.request_timeout(),
    })?;
    let notifier = build_notifier(config)?;
    log::debug!("Notifications go through the {} backend", notifier.name());

    let dispatcher = NotificationDispatcher::new(
        notifier,
        RetryPolicy::new(config.notify.retry_attempts, config.retry_delay()),
    );

    Ok(
        WatchService::new(repository, Arc::new(extractor), Arc::new(dispatcher)).with_settings(
            WatchSettings {
                poll_interval: config.poll_interval(),
                sweep_concurrency: config.watch.sweep_concurrency,
            },
        ),
    )
}

/// Execute one command against a wired service
pub async fn run_command(command: &Command, service: &WatchService, use_color: bool) -> i32 {
    match command {
        Command::Add {
            owner,
            url,
            selector,
            label,
        } => {
            let label = join_label(label);
            let request = CreateRequest::new(owner, url, selector, label.as_deref());
            match service.create_item(request).await {
                Ok(item) => {
                    println!("{}", format_created(&item, use_color));
                    0
                }
                Err(e) => {
                    log_error_with_context(&e, "Adding tracked item");
                    eprintln!("{}", creation_failure_message(&e));
                    1
                }
            }
        }
        Command::List { owner } => match service.list_items(owner).await {
            Ok(items) => {
                println!("{}", format_list(&items, use_color));
                0
            }
            Err(e) => report_failure(&e, "Listing tracked items"),
        },
        Command::Status { owner } => match service.list_items(owner).await {
            Ok(items) => {
                println!("{}", format_status(&items, use_color));
                0
            }
            Err(e) => report_failure(&e, "Reading tracking status"),
        },
        Command::Remove { owner, id } => match service.remove_item(owner, *id).await {
            Ok(removed) => {
                println!("{}", format_removed(*id, removed));
                if removed {
                    0
                } else {
                    1
                }
            }
            Err(e) => report_failure(&e, "Removing tracked item"),
        },
        Command::Sweep => match service.run_sweep().await {
            Ok(report) => {
                println!("{}", format_sweep(&report));
                0
            }
            Err(e) => report_failure(&e, "Sweep"),
        },
        Command::Run => {
            let (coordinator, shutdown_rx) = ShutdownCoordinator::new();
            coordinator.install_signal_handlers();
            service.run(shutdown_rx).await;
            log::info!("Stopped");
            0
        }
    }
}

fn report_failure(error: &WatchError, context: &str) -> i32 {
    log_error_with_context(error, context);
    eprintln!("Error: {}", display_message(error, context));
    1
}
