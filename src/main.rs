use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use verbatim::application::ports::TranscriptAnalyzer;
use verbatim::application::services::{
    JobDefaults, JobService, RunningJobs, TranscriptionPipeline, TranscriptionWorker,
};
use verbatim::infrastructure::analysis::OpenAiTranscriptAnalyzer;
use verbatim::infrastructure::audio::TranscriptionEngineFactory;
use verbatim::infrastructure::media::{FfmpegMediaProbe, FfmpegSegmenter};
use verbatim::infrastructure::observability::{TracingConfig, init_tracing};
use verbatim::infrastructure::persistence::InMemoryJobRepository;
use verbatim::infrastructure::storage::LocalStagingStore;
use verbatim::infrastructure::workspace::TempWorkspaceProvider;
use verbatim::presentation::{AppState, Settings, create_router, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (settings, environment) = Settings::load()?;

    let mut tracing_config = TracingConfig {
        environment: environment.to_string(),
        ..TracingConfig::default()
    };
    tracing_config.json_format |= settings.logging.json_format;
    if let Some(directives) = &settings.logging.directives {
        tracing_config = tracing_config.with_default_directives(directives.clone());
    }
    init_tracing(&tracing_config)?;

    let engine = TranscriptionEngineFactory::create(
        settings.transcription.provider.into(),
        settings.transcription.engine_options(),
    )
    .context("transcription engine")?;

    let pipeline = Arc::new(TranscriptionPipeline::new(
        Arc::new(FfmpegMediaProbe::default()),
        Arc::new(FfmpegSegmenter::default()),
        engine,
        Arc::new(TempWorkspaceProvider::new(settings.storage.workspace_root.clone())),
        settings.pipeline.to_pipeline_config(),
    )?);

    let analyzer: Option<Arc<dyn TranscriptAnalyzer>> = match (
        settings.analysis.enabled,
        settings.transcription.resolved_api_key(),
    ) {
        (true, Some(api_key)) => Some(Arc::new(OpenAiTranscriptAnalyzer::new(
            api_key,
            settings.analysis.base_url.clone(),
            settings.analysis.title_model.clone(),
        ))),
        (true, None) => {
            tracing::warn!("No API key available for analysis, transcripts will not be analyzed");
            None
        }
        (false, _) => None,
    };

    let job_repository = Arc::new(InMemoryJobRepository::new());
    let staging_store = Arc::new(
        LocalStagingStore::new(settings.storage.upload_dir.clone())
            .context("upload directory")?,
    );
    let running = RunningJobs::default();

    let (sender, receiver) = mpsc::channel(settings.worker.queue_capacity.max(1));
    let worker = TranscriptionWorker::new(
        receiver,
        pipeline,
        analyzer,
        job_repository.clone(),
        staging_store.clone(),
        running.clone(),
        settings.worker.max_concurrent_jobs,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });
    let worker_handle = tokio::spawn(worker.run(shutdown_requested(shutdown_rx.clone())));

    let job_service = Arc::new(JobService::new(
        job_repository,
        staging_store,
        sender,
        running,
        JobDefaults {
            language: settings.pipeline.default_language.clone(),
            model_hint: settings.analysis.model.clone(),
        },
    ));

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("server address")?;
    let router = create_router(AppState {
        job_service,
        settings,
    });

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = %environment, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_requested(shutdown_rx))
        .await?;

    tracing::info!("Server stopped, waiting for transcription worker");
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Transcription worker terminated abnormally");
    }

    Ok(())
}

async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    // A dropped sender means the signal task is gone; treat it as a request to stop.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
