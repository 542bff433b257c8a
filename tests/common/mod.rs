// Shared test doubles for the session pipeline: scripted text generation,
// byte-echo speech services, and an in-memory blob store.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use interview_coach::audio::{AudioNormalizer, NormalizedAudio};
use interview_coach::feedback::{FeedbackGenerator, Report};
use interview_coach::llm::{LlmError, TextGenerator};
use interview_coach::planner::QuestionPlanner;
use interview_coach::session::{
    AudioBlobStore, Difficulty, Focus, InMemorySessionRepository, Session, SessionOrchestrator,
    SessionSettings, SessionState,
};
use interview_coach::speech::{EmotionClassifier, EmotionScore, SpeechError, Transcriber};

/// Text generator fed from a fixed response queue; every call past the end
/// of the queue (and every `None` entry) fails like an exhausted chain.
/// Prompts are captured for assertions.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Option<&str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_owned))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose service is down for every call.
    pub fn down() -> Self {
        Self::new(Vec::new())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Some(text)) => Ok(text),
            _ => Err(LlmError::Exhausted {
                last: "scripted outage".to_string(),
            }),
        }
    }
}

/// Normalizer that copies the raw bytes into a temp "waveform" unchanged,
/// so downstream doubles can inspect the original upload.
pub struct StubNormalizer;

#[async_trait]
impl AudioNormalizer for StubNormalizer {
    async fn normalize(&self, src: &Path) -> Result<NormalizedAudio> {
        let bytes = tokio::fs::read(src).await?;
        let file = tempfile::Builder::new().suffix(".wav").tempfile()?;
        std::fs::write(file.path(), &bytes)?;
        Ok(NormalizedAudio::new(file))
    }

    async fn probe_duration(&self, _src: &Path) -> String {
        "00:05".to_string()
    }
}

/// Transcriber that echoes the waveform bytes back as text. Uploads
/// containing `FAIL_TRANSCRIPTION` simulate a service outage.
pub struct EchoTranscriber;

#[async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(&self, waveform: &Path) -> Result<String, SpeechError> {
        let bytes = tokio::fs::read(waveform).await?;
        let text = String::from_utf8_lossy(&bytes).to_string();
        if text.contains("FAIL_TRANSCRIPTION") {
            return Err(SpeechError::Unavailable {
                status: 503,
                body: "transcriber down".to_string(),
            });
        }
        Ok(text)
    }
}

/// Classifier returning a fixed calm reading. Uploads containing
/// `FAIL_EMOTION` simulate an uninterpretable response.
pub struct StaticEmotion;

#[async_trait]
impl EmotionClassifier for StaticEmotion {
    async fn classify(&self, waveform: &Path) -> Result<EmotionScore, SpeechError> {
        let bytes = tokio::fs::read(waveform).await?;
        if String::from_utf8_lossy(&bytes).contains("FAIL_EMOTION") {
            return Err(SpeechError::UnexpectedSchema("empty class list".to_string()));
        }
        Ok(EmotionScore {
            label: "calm".to_string(),
            confidence: 0.91,
        })
    }
}

/// Blob store over a HashMap, materializing blobs to a temp dir on read.
/// `remove` simulates a blob lost between recording and finish.
pub struct MemoryBlobStore {
    dir: TempDir,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            blobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn remove(&self, key: &str) {
        self.blobs.lock().unwrap().remove(key);
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl AudioBlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<PathBuf>> {
        let bytes = self.blobs.lock().unwrap().get(key).cloned();
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let path = self.dir.path().join(key.replace('/', "_"));
        tokio::fs::write(&path, &bytes).await?;
        Ok(Some(path))
    }
}

/// A fully wired orchestrator over in-memory collaborators.
pub struct TestBackend {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub blobs: Arc<MemoryBlobStore>,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn backend_with(responses: Vec<Option<&str>>) -> TestBackend {
    let sessions = Arc::new(InMemorySessionRepository::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let generator = Arc::new(ScriptedGenerator::new(responses));

    let planner = QuestionPlanner::new(generator.clone(), sessions.clone());
    let feedback = FeedbackGenerator::new(generator.clone());
    let orchestrator = SessionOrchestrator::new(
        planner,
        sessions.clone(),
        blobs.clone(),
        Arc::new(StubNormalizer),
        Arc::new(EchoTranscriber),
        Arc::new(StaticEmotion),
        feedback,
        2,
    );

    TestBackend {
        orchestrator: Arc::new(orchestrator),
        sessions,
        blobs,
        generator,
    }
}

/// Backend whose text service is down: deterministic fallback questions,
/// error-shaped reports.
pub fn backend() -> TestBackend {
    backend_with(Vec::new())
}

/// A completed prior round, for seeding adaptation tests.
pub fn completed_session(
    user_id: &str,
    role: &str,
    round_number: u32,
    weaknesses: &[&str],
    score: u32,
) -> Session {
    let report = Report {
        overall_score: score,
        areas_for_improvement: weaknesses.iter().map(|w| w.to_string()).collect(),
        ..Report::default()
    };

    let mut session = session_fixture(user_id, role, round_number);
    session.state = SessionState::Completed;
    session.completed_at = Some(Utc::now());
    session.summary = Some(report);
    session
}

/// A bare Active session record.
pub fn session_fixture(user_id: &str, role: &str, round_number: u32) -> Session {
    Session {
        session_id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        role: role.to_string(),
        round_number,
        config: SessionSettings {
            difficulty: Difficulty::Adaptive,
            focus: Focus::General,
        },
        questions: (0..8).map(|i| format!("Question {i}?")).collect(),
        based_on_session_id: None,
        based_on_weaknesses: Vec::new(),
        previous_score: None,
        answers: Vec::new(),
        state: SessionState::Active,
        created_at: Utc::now(),
        completed_at: None,
        summary: None,
        per_question: Vec::new(),
    }
}

/// Valid report JSON the scoring schema expects.
pub fn sample_report_json() -> &'static str {
    r#"{
        "overallScore": 82,
        "grade": "B+",
        "performanceLevel": "Strong",
        "keyStrengths": ["Clear structure", "Concrete examples", "Calm delivery"],
        "areasForImprovement": ["system design", "quantifying impact", "pacing"],
        "performanceBreakdown": [
            {"category": "Communication", "score": 85, "summary": "Clear and steady.", "suggestions": ["Pause before answering"]},
            {"category": "Technical Knowledge", "score": 78, "summary": "Solid fundamentals.", "suggestions": ["Review system design basics"]},
            {"category": "Problem-Solving", "score": 80, "summary": "Methodical.", "suggestions": ["State assumptions early"]},
            {"category": "Professionalism", "score": 88, "summary": "Composed.", "suggestions": ["Keep it up"]}
        ],
        "immediateActionItems": ["Practice one system design question"],
        "longTermDevelopment": ["Build a portfolio project"],
        "summary": "A strong round with room to grow in system design."
    }"#
}
