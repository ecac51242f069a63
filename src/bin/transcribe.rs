use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use verbatim::application::ports::{ErrorKind, TranscriptionError};
use verbatim::application::services::{PipelineError, SegmentProgress, TranscriptionPipeline};
use verbatim::infrastructure::audio::TranscriptionEngineFactory;
use verbatim::infrastructure::media::{FfmpegMediaProbe, FfmpegSegmenter};
use verbatim::infrastructure::observability::{TracingConfig, init_tracing};
use verbatim::infrastructure::workspace::TempWorkspaceProvider;
use verbatim::presentation::{Settings, SettingsError, ShutdownSignal, shutdown_signal};

/// Transcribe an audio or video file, splitting it to fit the speech-to-text upload limit.
#[derive(Parser, Debug)]
#[command(name = "verbatim-transcribe", version)]
struct Cli {
    /// Audio or video file to transcribe
    input: PathBuf,

    /// Spoken language (ISO-639-1)
    #[arg(short, long)]
    language: Option<String>,

    /// Where to write the transcript [default: <input stem>.txt next to the input]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Largest segment to upload, in MB
    #[arg(long)]
    budget_mb: Option<f64>,

    /// Transcription attempts per segment
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Segments transcribed in parallel
    #[arg(long)]
    concurrency: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Settings(#[from] SettingsError),
    #[error("transcription engine: {0}")]
    Engine(#[from] TranscriptionError),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
    #[error("cannot write transcript to {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("logging: {0}")]
    Tracing(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Settings(_) => 3,
            CliError::Engine(e) => exit_code_for(e.kind()),
            CliError::Pipeline(e) => exit_code_for(e.kind()),
            CliError::Output { .. } => 4,
            CliError::Tracing(_) => 1,
        }
    }
}

fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Configuration => 3,
        ErrorKind::ToolFailure
        | ErrorKind::TransientService
        | ErrorKind::Authentication
        | ErrorKind::AssemblyInvariant => 2,
        ErrorKind::Internal => 4,
    }
}

enum Outcome {
    Written { path: PathBuf, segments: usize },
    Interrupted(ShutdownSignal),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Outcome::Written { path, segments }) => {
            println!("Transcript written to {} ({} segments)", path.display(), segments);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Interrupted(signal)) => {
            eprintln!("Interrupted");
            ExitCode::from(signal.exit_code())
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome, CliError> {
    let (settings, environment) = Settings::load()?;

    let mut tracing_config = TracingConfig {
        environment: environment.to_string(),
        ..TracingConfig::default()
    }
    .with_default_directives("warn");
    tracing_config.json_format |= settings.logging.json_format;
    init_tracing(&tracing_config).map_err(|e| CliError::Tracing(e.to_string()))?;

    let mut pipeline_config = settings.pipeline.to_pipeline_config();
    if let Some(budget) = cli.budget_mb {
        pipeline_config.segment_budget_mb = budget;
    }
    if let Some(attempts) = cli.max_attempts {
        pipeline_config.retry.max_attempts = attempts.max(1);
    }
    if let Some(concurrency) = cli.concurrency {
        pipeline_config.max_concurrent_segments = concurrency.max(1);
    }

    let engine = TranscriptionEngineFactory::create(
        settings.transcription.provider.into(),
        settings.transcription.engine_options(),
    )?;
    let pipeline = TranscriptionPipeline::new(
        Arc::new(FfmpegMediaProbe::default()),
        Arc::new(FfmpegSegmenter::default()),
        engine,
        Arc::new(TempWorkspaceProvider::new(settings.storage.workspace_root.clone())),
        pipeline_config,
    )?
    .with_progress(Arc::new(|progress: &SegmentProgress| {
        eprintln!("{}", progress_line(progress));
    }));

    let language = cli
        .language
        .unwrap_or_else(|| settings.pipeline.default_language.clone());
    let output_path = cli.output.unwrap_or_else(|| default_output_path(&cli.input));

    tracing::info!(
        input = %cli.input.display(),
        language = %language,
        budget_mb = pipeline_config.segment_budget_mb,
        "Starting transcription"
    );

    // Dropping the pipeline future on a signal removes its working directory and
    // kills any running ffmpeg child.
    let output = tokio::select! {
        result = pipeline.run_transcription_pipeline(&cli.input, &language) => result?,
        signal = shutdown_signal() => {
            tracing::warn!(?signal, "Interrupted, cleaning up");
            return Ok(Outcome::Interrupted(signal));
        }
    };

    tokio::fs::write(&output_path, &output.text)
        .await
        .map_err(|source| CliError::Output {
            path: output_path.clone(),
            source,
        })?;

    Ok(Outcome::Written {
        path: output_path,
        segments: output.segment_count,
    })
}

fn progress_line(progress: &SegmentProgress) -> String {
    format!(
        "[{}/{}] {:>3.0}% segment {} transcribed in {:.1}s",
        progress.completed,
        progress.total,
        progress.percent(),
        progress.segment_index,
        progress.elapsed_seconds
    )
}

fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("txt")
}
