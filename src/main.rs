use std::path::PathBuf;

use modwatch::app::{context::RunContext, run};
use modwatch::infra::{
    config::ConfigLoader,
    http::ApiClient,
    logging::{init_logging, BootError},
    postgres_mirror::PgMirror,
    random::MutexRng,
    sqlite_store::SqliteStore,
    system_clock::SystemClock,
};
use modwatch::ports::store::Store;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), BootError> {
    let cfg_path = pick_config_path(std::env::args().skip(1).next());
    let cfg = ConfigLoader::load(&cfg_path)
        .await
        .map_err(|e| BootError::Fatal(e.to_string()))?;
    init_logging(&cfg.log_level);

    info!(
        subreddit = %cfg.subreddit,
        db_path = %cfg.sqlite_path.display(),
        mirror_configured = cfg.postgres_url.is_some(),
        "Loaded config"
    );

    let primary = SqliteStore::new(&cfg.sqlite_path)
        .await
        .map_err(BootError::Fatal)?;
    primary.migrate().await.map_err(BootError::Fatal)?;

    // The mirror is advisory: any failure here downgrades to a mirrorless
    // run instead of aborting.
    let mirror = match cfg.postgres_url.as_deref() {
        Some(url) => match connect_mirror(url).await {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(error = %e, "Mirror unavailable, continuing without it");
                None
            }
        },
        None => None,
    };

    let gateway = ApiClient::new(&cfg.http, cfg.auth.clone(), MutexRng::new())
        .map_err(BootError::Fatal)?;

    let ctx = RunContext {
        cfg,
        primary,
        mirror,
        gateway,
        clock: SystemClock::default(),
    };

    let result = tokio::select! {
        r = run::run_once(&ctx) => r,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupt received, shutting down");
            Err(run::RunError::Interrupted)
        }
    };

    ctx.primary.close().await;
    if let Some(m) = ctx.mirror.as_ref() {
        m.close().await;
    }

    match result {
        Ok(summary) => {
            info!(
                pages = summary.pages,
                scanned_posts = summary.scanned_posts,
                scanned_comments = summary.scanned_comments,
                recheck_candidates = summary.recheck_candidates,
                recheck_posts = summary.recheck_posts,
                recheck_comments = summary.recheck_comments,
                mirror_active = summary.mirror_active,
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            Err(BootError::Fatal(e.to_string()))
        }
    }
}

async fn connect_mirror(url: &str) -> Result<PgMirror, String> {
    let mirror = PgMirror::connect(url).await?;
    mirror.migrate().await?;
    Ok(mirror)
}

fn pick_config_path(arg1: Option<String>) -> PathBuf {
    if let Some(p) = arg1 {
        return PathBuf::from(p);
    }
    PathBuf::from("res/config.toml")
}
