use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use vidfetch::core::convert::FfmpegConverter;
use vidfetch::core::extractor::YtDlpExtractor;
use vidfetch::core::worker::spawn_workers;
use vidfetch::utils::{ensure_dir_exists, init_tracing};
use vidfetch::{AppConfig, AppState, JobStore, VideoDownloader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    if config.using_dev_secret() {
        warn!("running with the development secret key; set VIDFETCH_SECRET_KEY in production");
    }

    ensure_dir_exists(&config.download_dir).context("creating download directory")?;

    let store = JobStore::open(&config.database_path).context("opening job store")?;

    let extractor = Arc::new(YtDlpExtractor::new(
        config.yt_dlp_bin.clone(),
        config.download_dir.clone(),
    ));
    let converter = Arc::new(FfmpegConverter::new(config.ffmpeg_bin.clone()));
    let downloader = Arc::new(VideoDownloader::new(
        extractor,
        converter,
        config.download_dir.clone(),
    ));

    let queue = spawn_workers(
        config.workers,
        config.queue_capacity,
        store.clone(),
        downloader,
    );

    let state = AppState {
        store,
        queue,
        config: Arc::new(config),
    };
    let app = vidfetch::http::router(state.clone());

    let listener = tokio::net::TcpListener::bind(state.config.bind_addr)
        .await
        .with_context(|| format!("binding {}", state.config.bind_addr))?;
    info!("{} v{} listening on {}", vidfetch::NAME, vidfetch::VERSION, state.config.bind_addr);

    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
