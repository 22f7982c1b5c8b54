//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use inspection_roster::adapters::persistence::{MemoryRepo, SqliteRepo};
use inspection_roster::adapters::ui::tui::TuiInputPort;
use inspection_roster::ports::{BusinessStore, ComplaintStore, InputPort};
use inspection_roster::shared::config::AppConfig;
use inspection_roster::usecases::{IntakeService, RefreshScheduler, RosterService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    inspection_roster::adapters::ui::init_ui();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config load failed; using defaults");
            AppConfig::default()
        }
    };

    // --- Stores: SQLite (WAL) by default, in-memory on ROSTER_STORAGE=memory ---
    let (complaints, businesses): (Arc<dyn ComplaintStore>, Arc<dyn BusinessStore>) =
        if cfg.use_memory_storage() {
            warn!("ROSTER_STORAGE=memory: roster is lost on exit");
            let repo = Arc::new(MemoryRepo::new());
            (
                Arc::clone(&repo) as Arc<dyn ComplaintStore>,
                repo as Arc<dyn BusinessStore>,
            )
        } else {
            let data_path = PathBuf::from(cfg.data_dir_or_default());
            let repo = Arc::new(
                SqliteRepo::connect(&data_path)
                    .await
                    .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
            );
            let data_dir_abs = data_path.canonicalize().unwrap_or_else(|_| data_path.clone());
            info!(path = %data_dir_abs.display(), "data directory");
            (
                Arc::clone(&repo) as Arc<dyn ComplaintStore>,
                repo as Arc<dyn BusinessStore>,
            )
        };

    // --- Services ---
    let staleness_hours = cfg.staleness_hours_or_default();
    info!(staleness_hours, "roster staleness threshold");
    let roster = Arc::new(RosterService::new(
        Arc::clone(&complaints),
        Arc::clone(&businesses),
        chrono::Duration::hours(staleness_hours),
    ));
    let intake = Arc::new(IntakeService::new(Arc::clone(&complaints)));

    let check_interval_secs = cfg.check_interval_secs_or_default();
    let recent_window_secs = cfg.recent_window_secs_or_default();
    info!(
        check_interval_secs,
        recent_window_secs, "refresh scheduler timings"
    );
    let scheduler = Arc::new(RefreshScheduler::new(
        Arc::clone(&roster),
        Arc::clone(&complaints),
        Duration::from_secs(check_interval_secs),
        chrono::Duration::seconds(i64::try_from(recent_window_secs).unwrap_or(i64::MAX / 1000)),
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        roster,
        intake,
        scheduler,
        cfg.import_path_or_default(),
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
