pub mod audio;
pub mod config;
pub mod error;
pub mod feedback;
pub mod http;
pub mod llm;
pub mod planner;
pub mod session;
pub mod speech;

pub use audio::{AudioNormalizer, FfmpegNormalizer, NormalizedAudio};
pub use config::Config;
pub use error::CoachError;
pub use feedback::{FeedbackGenerator, Report};
pub use http::{create_router, AppState};
pub use llm::{GeminiClient, LlmError, TextGenerator};
pub use planner::{QuestionPlan, QuestionPlanner};
pub use session::{
    AnswerSubmission, AudioBlobStore, FsSessionRepository, InMemorySessionRepository,
    LocalAudioStore, Session, SessionOrchestrator, SessionRepository,
};
pub use speech::{EmotionClassifier, EmotionScore, SpeechError, Transcriber};
