//! postworx - sync your Teamworx schedule, with coworker rosters, into an
//! `.ics` calendar.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postworx_core::auth::{CredentialStore, Session, SessionData};
use postworx_core::{ApiClient, Config, ShiftCache, ShiftCalendar, SyncRunner};

/// Log file written in the cache directory
const LOG_FILE: &str = "postworx.log";

/// Environment variable that may hold the account password
const PASSWORD_ENV: &str = "POSTWORX_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "postworx", version, about)]
struct Cli {
    /// Config file (default: ~/.config/postworx/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory the calendar is written to
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Remove cached shifts older than the sync window
    #[arg(long)]
    cull: bool,

    /// Stop at the first shift whose coworkers cannot be fetched
    #[arg(long)]
    fail_fast: bool,

    /// Delete the stored password and session, then exit
    #[arg(long)]
    forget_password: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize tracing to stderr plus a log file in `log_dir`
fn init_tracing(verbose: bool, log_dir: &Path) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(ref path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if cli.cull {
        config.cull_cache = true;
    }
    if cli.fail_fast {
        config.fail_fast = true;
    }
    if let Some(ref output) = cli.output {
        config.output_dir = Some(output.clone());
    }

    let cache_dir = config.cache_dir()?;
    let _log_guard = init_tracing(cli.verbose, &cache_dir);
    info!(config = %config_path.display(), "postworx starting");

    if cli.forget_password {
        return forget_password(&config, cache_dir);
    }

    let tz = config.tz()?;
    let today = Utc::now().with_timezone(&tz).date_naive();

    let client = ApiClient::new(&config.host)?;
    let session = open_session(&client, &config, cache_dir).await?;
    let client = client.with_session(&session);

    let mut cache = ShiftCache::load(config.cache_file()?)?;
    let options = config.sync_options(today);
    let mut calendar = ShiftCalendar::new(config.org_name(), tz);

    let report = SyncRunner::new(&client, &mut cache, &options, today)
        .on_shift(|shift| {
            let note = if shift.in_calendar { "" } else { " (not added: invalid times)" };
            println!("[{:>11}] {} {}{}", shift.outcome, shift.key, shift.position, note);
        })
        .run(&mut calendar)
        .await?;
    if report.evicted > 0 {
        println!(
            "Removed {} cached shift(s) dated before {}",
            report.evicted, options.window.start
        );
    }

    let path = calendar.write_to_dir(&config.output_dir())?;
    println!("Your schedule has been saved to:\n{}", path.display());

    info!("postworx finished");
    Ok(())
}

/// Reuse a saved session for this site and user, or sign in.
async fn open_session(client: &ApiClient, config: &Config, cache_dir: PathBuf) -> Result<SessionData> {
    let mut session = Session::new(cache_dir);
    if let Err(e) = session.load() {
        warn!(error = %e, "Ignoring unreadable session file");
    }

    if let Some(data) = session.reusable_for(client.base_url(), &config.username) {
        info!("Reusing saved session");
        return Ok(data.clone());
    }

    let password = resolve_password(config)?;
    let data = client
        .authenticate(&config.username, &password)
        .await
        .context("Authentication failed")?;

    session.update(data.clone());
    if let Err(e) = session.save() {
        warn!(error = %e, "Failed to save session");
    }
    Ok(data)
}

/// Password from config, environment, keychain, or an interactive prompt
/// (in that order). A prompted password is remembered in the keychain.
fn resolve_password(config: &Config) -> Result<String> {
    if let Some(ref password) = config.password {
        return Ok(password.clone());
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        if !password.is_empty() {
            return Ok(password);
        }
    }

    match CredentialStore::get_password(&config.username) {
        Ok(Some(password)) => return Ok(password),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Keychain unavailable"),
    }

    let password = rpassword::prompt_password(format!("Password for {}: ", config.username))
        .context("Failed to read password")?;
    if password.is_empty() {
        bail!("No password given");
    }
    if let Err(e) = CredentialStore::store(&config.username, &password) {
        warn!(error = %e, "Failed to store password in keychain");
    }
    Ok(password)
}

fn forget_password(config: &Config, cache_dir: PathBuf) -> Result<()> {
    let mut session = Session::new(cache_dir);
    session.clear()?;

    if CredentialStore::delete(&config.username)? {
        println!("Stored password for {} removed.", config.username);
    } else {
        println!("No stored password for {}.", config.username);
    }
    Ok(())
}
