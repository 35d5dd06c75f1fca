// # embedded_usage
//
// Shows listsync-core embedded in an application: every address given on
// the command line goes through the local signup lifecycle, confirmations
// are drained by a background worker, and state changes are synced to the
// remote list.
//
// ## Configuration
//
// Either point `LISTSYNC_CONFIG` at a JSON `SyncConfig` file, or use:
//
// - `LISTSYNC_MAILCHIMP_API_KEY`: API key (`<key>-<dc>`), required
// - `LISTSYNC_MAILCHIMP_BASE_URL`: API root override (optional)
// - `LISTSYNC_LISTS`: Comma-separated `name=remote_id` pairs, required
// - `LISTSYNC_DEFAULT_LIST`: Default list name (defaults to the first list)
// - `LISTSYNC_STORE_PATH`: Subscriber store file (in-memory when unset)
//
// `LISTSYNC_LOG_LEVEL` (trace|debug|info|warn|error) applies in both modes.
//
// ## Example
//
// ```bash
// export LISTSYNC_MAILCHIMP_API_KEY=your_key-us6
// export LISTSYNC_LISTS=waitlist=a1b2c3,beta=d4e5f6
// export LISTSYNC_STORE_PATH=/tmp/listsync/subscribers.json
//
// cargo run -p listsync-demos --bin embedded_usage -- ursula@example.com
// ```

use anyhow::{Context, Result};
use listsync_core::{
    DispatchConfig, ListClient, ListDirectory, ListsConfig, ProviderClientFactory,
    ProviderConfig, QueueDispatcher, StoreConfig, SubscriberLifecycle, SyncConfig, open_store,
};
use listsync_provider_mailchimp::MailchimpFactory;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the demo
#[derive(Debug, Clone, Copy)]
enum DemoExitCode {
    /// Every signup was handled
    Success = 0,
    /// Configuration or startup error
    ConfigError = 1,
    /// At least one signup failed
    RuntimeError = 2,
}

impl From<DemoExitCode> for ExitCode {
    fn from(code: DemoExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let log_level = match env::var("LISTSYNC_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DemoExitCode::ConfigError.into();
    }

    let config = match load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DemoExitCode::ConfigError.into();
        }
    };

    let emails: Vec<String> = env::args().skip(1).collect();
    if emails.is_empty() {
        eprintln!("Usage: embedded_usage <email>...");
        return DemoExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DemoExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config, emails).await {
            Ok(0) => DemoExitCode::Success,
            Ok(failures) => {
                warn!("{} signup(s) failed", failures);
                DemoExitCode::RuntimeError
            }
            Err(e) => {
                error!("Startup failed: {:#}", e);
                DemoExitCode::ConfigError
            }
        }
    })
    .into()
}

/// Load configuration from `LISTSYNC_CONFIG` or from individual variables
fn load_config() -> Result<SyncConfig> {
    if let Ok(path) = env::var("LISTSYNC_CONFIG") {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read LISTSYNC_CONFIG file {}", path))?;
        return Ok(SyncConfig::from_json_str(&json)?);
    }

    let api_key = env::var("LISTSYNC_MAILCHIMP_API_KEY").context(
        "LISTSYNC_MAILCHIMP_API_KEY is required. \
        Set it via: export LISTSYNC_MAILCHIMP_API_KEY=your_key-us6",
    )?;

    let pairs = env::var("LISTSYNC_LISTS").context(
        "LISTSYNC_LISTS is required. \
        Set it via: export LISTSYNC_LISTS=waitlist=a1b2c3,beta=d4e5f6",
    )?;

    let mut lists = Vec::new();
    for pair in pairs.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (name, id) = pair
            .split_once('=')
            .with_context(|| format!("LISTSYNC_LISTS entry `{}` is not name=remote_id", pair))?;
        lists.push((name.trim().to_string(), id.trim().to_string()));
    }

    let default_list = env::var("LISTSYNC_DEFAULT_LIST")
        .ok()
        .or_else(|| lists.first().map(|(name, _)| name.clone()))
        .unwrap_or_default();

    let lists = lists
        .into_iter()
        .fold(ListsConfig::new(default_list), |config, (name, id)| {
            config.with_list(name, id)
        });

    let store = match env::var("LISTSYNC_STORE_PATH") {
        Ok(path) if !path.is_empty() => StoreConfig::File { path },
        _ => StoreConfig::Memory,
    };

    Ok(SyncConfig {
        lists,
        provider: ProviderConfig::Mailchimp {
            api_key,
            base_url: env::var("LISTSYNC_MAILCHIMP_BASE_URL").ok(),
            timeout_secs: 10,
        },
        store,
        dispatch: DispatchConfig::default(),
    })
}

/// Wire the components and handle each signup; returns the failure count
async fn run(config: SyncConfig, emails: Vec<String>) -> Result<usize> {
    let directory = Arc::new(ListDirectory::from_config(&config.lists));
    let provider = MailchimpFactory.create(&config.provider)?;
    let client = ListClient::new(Arc::clone(&directory), provider);

    let store = open_store(&config.store).await?;
    let (dispatcher, queue) = QueueDispatcher::from_config(&config.dispatch);
    let lifecycle = SubscriberLifecycle::new(store, Box::new(dispatcher));

    // Stand-in for the application's notification worker
    let worker = tokio::spawn(async move {
        let mut jobs = queue.into_stream();
        while let Some(job) = jobs.next().await {
            info!(
                "Sending confirmation to {} ({:?}, queued at {})",
                job.subscriber.email, job.reason, job.queued_at
            );
        }
    });

    let mut failures = 0;
    for email in &emails {
        let outcome = match lifecycle.handle_signup(email).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Signup for {} rejected: {}", email, e);
                failures += 1;
                continue;
            }
        };

        if !outcome.changed_state() {
            info!("{} is already subscribed", email);
            continue;
        }

        // Remote membership is best-effort and idempotent
        let email: &str = outcome.subscriber().email.as_ref();
        match client
            .subscribe_or_update(email, &Default::default(), "", &Default::default())
            .await?
        {
            Some(_) => info!("{} synced to list `{}`", email, directory.default_list_name()),
            None => warn!(
                "{} saved locally but not synced: {}",
                email,
                client.last_error().unwrap_or_default()
            ),
        }
    }

    lifecycle.store().flush().await?;

    // Closing the only dispatcher ends the worker's stream
    drop(lifecycle);
    if let Err(e) = worker.await {
        error!("Confirmation worker panicked: {}", e);
    }

    Ok(failures)
}
