use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use interview_coach::audio::FfmpegNormalizer;
use interview_coach::config::Config;
use interview_coach::feedback::FeedbackGenerator;
use interview_coach::http::{create_router, AppState};
use interview_coach::llm::GeminiClient;
use interview_coach::planner::QuestionPlanner;
use interview_coach::session::{
    FsSessionRepository, LocalAudioStore, SessionOrchestrator, SessionRepository,
};
use interview_coach::speech::{HttpEmotionClassifier, HttpTranscriber};

#[derive(Debug, Parser)]
#[command(name = "interview-coach", about = "Mock-interview practice backend")]
struct Cli {
    /// Config file stem (without extension)
    #[arg(long, default_value = "config/interview-coach")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_coach=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    cfg.validate()?;

    info!("{} starting", cfg.service.name);

    // Missing transcoder tooling or credentials are fatal here, never per
    // request
    let normalizer = FfmpegNormalizer::new(&cfg.audio.ffmpeg, &cfg.audio.ffprobe)
        .await
        .context("Audio transcoder unavailable")?;

    let sessions: Arc<dyn SessionRepository> =
        Arc::new(FsSessionRepository::new(&cfg.storage.sessions_path)?);
    let audio_blobs = Arc::new(LocalAudioStore::new(&cfg.storage.uploads_path)?);
    let generator = Arc::new(GeminiClient::new(&cfg.llm));
    let transcriber = Arc::new(HttpTranscriber::new(&cfg.speech));
    let emotion = Arc::new(HttpEmotionClassifier::new(&cfg.speech));

    let planner = QuestionPlanner::new(generator.clone(), sessions.clone());
    let feedback = FeedbackGenerator::new(generator);
    let orchestrator = SessionOrchestrator::new(
        planner,
        sessions,
        audio_blobs,
        Arc::new(normalizer),
        transcriber,
        emotion,
        feedback,
        cfg.analysis.workers,
    );

    let app = create_router(AppState::new(Arc::new(orchestrator)));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
