use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::store::{sanitize_component, AudioBlobStore, SessionRepository};
use super::types::{
    Answer, AnswerAnalysis, Difficulty, Focus, Session, SessionSettings, SessionState,
};
use crate::audio::AudioNormalizer;
use crate::error::CoachError;
use crate::feedback::{FeedbackGenerator, Report};
use crate::planner::QuestionPlanner;
use crate::speech::{EmotionClassifier, Transcriber};

/// Transcript line marker for questions the user skipped.
const SKIPPED_MARKER: &str = "[SKIPPED]";

/// Character budget for the combined transcript fed to the scoring prompt.
/// Truncation applies to the assembled text, not per answer, so very long
/// sessions can lose their late questions from scoring.
const TRANSCRIPT_CHAR_BUDGET: usize = 18_000;

/// One answer submission, as received from the HTTP surface.
#[derive(Debug)]
pub struct AnswerSubmission {
    pub question_index: u32,
    /// Question text as presented to the user; falls back to the stored
    /// question at that index when absent
    pub question: Option<String>,
    pub skipped: bool,
    pub audio: Option<AudioUpload>,
}

#[derive(Debug)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

/// Outcome of [`SessionOrchestrator::start`].
#[derive(Debug)]
pub struct StartedSession {
    pub session_id: String,
    pub questions: Vec<String>,
    pub round_number: u32,
    pub config: SessionSettings,
    pub based_on_session_id: Option<String>,
    pub based_on_weaknesses: Vec<String>,
    pub previous_score: Option<u32>,
}

/// Outcome of [`SessionOrchestrator::finish`].
#[derive(Debug)]
pub struct CompletedSession {
    pub summary: Report,
    pub per_question: Vec<AnswerAnalysis>,
}

/// Control logic for the practice-session lifecycle (Active to Completed,
/// terminal).
///
/// Every collaborator is injected at construction; there is no ambient
/// state. Operations are stateless against the shared repository, so the
/// process holds no per-session lock.
pub struct SessionOrchestrator {
    planner: QuestionPlanner,
    sessions: Arc<dyn SessionRepository>,
    audio_blobs: Arc<dyn AudioBlobStore>,
    normalizer: Arc<dyn AudioNormalizer>,
    transcriber: Arc<dyn Transcriber>,
    emotion: Arc<dyn EmotionClassifier>,
    feedback: FeedbackGenerator,
    analysis_workers: usize,
}

impl SessionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        planner: QuestionPlanner,
        sessions: Arc<dyn SessionRepository>,
        audio_blobs: Arc<dyn AudioBlobStore>,
        normalizer: Arc<dyn AudioNormalizer>,
        transcriber: Arc<dyn Transcriber>,
        emotion: Arc<dyn EmotionClassifier>,
        feedback: FeedbackGenerator,
        analysis_workers: usize,
    ) -> Self {
        Self {
            planner,
            sessions,
            audio_blobs,
            normalizer,
            transcriber,
            emotion,
            feedback,
            analysis_workers: analysis_workers.max(1),
        }
    }

    /// Plan questions and open a new Active session.
    pub async fn start(
        &self,
        role: &str,
        user_id: &str,
        difficulty: Difficulty,
        focus: Focus,
    ) -> Result<StartedSession, CoachError> {
        let plan = self.planner.plan(role, user_id, difficulty, focus).await;

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            role: role.to_string(),
            round_number: plan.round_number,
            config: SessionSettings { difficulty, focus },
            questions: plan.questions.clone(),
            based_on_session_id: plan.based_on_session_id.clone(),
            based_on_weaknesses: plan.based_on_weaknesses.clone(),
            previous_score: plan.previous_score,
            answers: Vec::new(),
            state: SessionState::Active,
            created_at: Utc::now(),
            completed_at: None,
            summary: None,
            per_question: Vec::new(),
        };

        self.sessions.put(&session).await?;

        info!(
            "Started session {} for {} ({}, round {})",
            session.session_id, user_id, role, session.round_number
        );

        Ok(StartedSession {
            session_id: session.session_id,
            questions: session.questions,
            round_number: session.round_number,
            config: session.config,
            based_on_session_id: plan.based_on_session_id,
            based_on_weaknesses: plan.based_on_weaknesses,
            previous_score: plan.previous_score,
        })
    }

    /// Append one answer to an Active session. Audio is stored raw; all
    /// analysis is deferred to `finish` to keep per-answer latency low.
    pub async fn record_answer(
        &self,
        session_id: &str,
        user_id: &str,
        submission: AnswerSubmission,
    ) -> Result<(), CoachError> {
        let mut session = self.load_owned(user_id, session_id).await?;
        if session.is_completed() {
            return Err(CoachError::InvalidState(
                "Session already completed".to_string(),
            ));
        }

        let index = submission.question_index;
        if index as usize >= session.questions.len() {
            return Err(CoachError::InvalidInput(format!(
                "questionIndex {index} out of range"
            )));
        }

        let question = submission
            .question
            .unwrap_or_else(|| session.questions[index as usize].clone());

        let mut answer = Answer {
            question_index: index,
            question,
            skipped: submission.skipped,
            timestamp: Utc::now(),
            audio_key: None,
            original_file_name: None,
        };

        // Skipped answers ignore any attached audio
        if !submission.skipped {
            let Some(upload) = submission.audio else {
                return Err(CoachError::InvalidInput("Missing audio".to_string()));
            };

            // One slot per (user, session, index); re-recording overwrites
            // the blob while the answer log below still appends
            let key = format!(
                "{}/{}/q{}",
                sanitize_component(user_id),
                session.session_id,
                index
            );
            self.audio_blobs.put(&key, &upload.bytes).await?;
            answer.audio_key = Some(key);
            answer.original_file_name = upload.file_name;
        }

        session.answers.push(answer);
        self.sessions.put(&session).await?;
        Ok(())
    }

    /// Analyze every recorded answer, score the session, and complete it.
    pub async fn finish(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<CompletedSession, CoachError> {
        let mut session = self.load_owned(user_id, session_id).await?;
        if session.is_completed() {
            return Err(CoachError::InvalidState(
                "Session already completed".to_string(),
            ));
        }

        // Last write per index, ascending; the raw log keeps every submission
        let latest: Vec<Answer> = session
            .latest_answers()
            .into_values()
            .cloned()
            .collect();

        info!(
            "Finishing session {} ({} of {} questions answered)",
            session.session_id,
            latest.len(),
            session.questions.len()
        );

        // Bounded concurrency; `buffered` yields results in submission
        // order, which is ascending index here
        let per_question: Vec<AnswerAnalysis> = stream::iter(latest)
            .map(|answer| self.analyze_answer(answer))
            .buffered(self.analysis_workers)
            .collect()
            .await;

        let combined = assemble_transcript(&per_question);
        let summary = self.feedback.summarize(&combined).await;

        session.summary = Some(summary.clone());
        session.per_question = per_question.clone();
        session.completed_at = Some(Utc::now());
        session.state = SessionState::Completed;
        self.sessions.put(&session).await?;

        info!("Completed session {}", session.session_id);

        Ok(CompletedSession {
            summary,
            per_question,
        })
    }

    async fn load_owned(&self, user_id: &str, session_id: &str) -> Result<Session, CoachError> {
        self.sessions
            .get(user_id, session_id)
            .await?
            .ok_or(CoachError::NotFound)
    }

    /// Run one answer through normalize, duration probe, transcription,
    /// then emotion classification. Upstream failures land in the record's
    /// error field; they never abort the other answers.
    async fn analyze_answer(&self, answer: Answer) -> AnswerAnalysis {
        let mut analysis = AnswerAnalysis {
            question_index: answer.question_index,
            question: answer.question.clone(),
            skipped: answer.skipped,
            transcript: None,
            emotion: None,
            duration: String::new(),
            error: None,
        };

        if answer.skipped {
            return analysis;
        }

        let Some(key) = answer.audio_key.as_deref() else {
            analysis.error = Some("audio reference missing".to_string());
            return analysis;
        };

        let raw = match self.audio_blobs.get(key).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                warn!("Stored audio missing for Q{}", answer.question_index);
                analysis.error = Some("stored audio not found".to_string());
                return analysis;
            }
            Err(e) => {
                warn!("Audio lookup failed for Q{}: {e:#}", answer.question_index);
                analysis.error = Some(format!("audio lookup failed: {e}"));
                return analysis;
            }
        };

        // The temp waveform is deleted when `normalized` drops, on every
        // path out of this function
        let normalized = match self.normalizer.normalize(&raw).await {
            Ok(waveform) => waveform,
            Err(e) => {
                warn!(
                    "Audio conversion failed for Q{}: {e:#}",
                    answer.question_index
                );
                analysis.error = Some(format!("audio conversion failed: {e}"));
                return analysis;
            }
        };

        analysis.duration = {
            let from_raw = self.normalizer.probe_duration(&raw).await;
            if from_raw.is_empty() {
                self.normalizer.probe_duration(normalized.path()).await
            } else {
                from_raw
            }
        };

        match self.transcriber.transcribe(normalized.path()).await {
            Ok(text) => analysis.transcript = Some(text),
            Err(e) => {
                warn!("Transcription failed for Q{}: {e}", answer.question_index);
                analysis.error = Some(format!("transcription failed: {e}"));
                return analysis;
            }
        }

        match self.emotion.classify(normalized.path()).await {
            Ok(score) => analysis.emotion = Some(score),
            Err(e) => {
                // The transcript is kept; only the emotion read is lost
                warn!(
                    "Emotion classification failed for Q{}: {e}",
                    answer.question_index
                );
                analysis.error = Some(format!("emotion classification failed: {e}"));
            }
        }

        analysis
    }
}

/// Assemble the scoring transcript from per-question records: ascending
/// question index, blank-line separated, truncated to the combined budget.
pub fn assemble_transcript(per_question: &[AnswerAnalysis]) -> String {
    let mut ordered: Vec<&AnswerAnalysis> = per_question.iter().collect();
    ordered.sort_by_key(|a| a.question_index);

    let lines: Vec<String> = ordered
        .into_iter()
        .map(|entry| {
            let body = if entry.skipped {
                SKIPPED_MARKER.to_string()
            } else if let Some(transcript) = &entry.transcript {
                transcript.clone()
            } else {
                format!(
                    "[ERROR: {}]",
                    entry
                        .error
                        .as_deref()
                        .unwrap_or("answer could not be processed")
                )
            };
            format!("Q{}: {}\n{}", entry.question_index, entry.question, body)
        })
        .collect();

    truncate_chars(lines.join("\n\n"), TRANSCRIPT_CHAR_BUDGET)
}

fn truncate_chars(text: String, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => {
            let mut truncated = text;
            truncated.truncate(idx);
            truncated
        }
        None => text,
    }
}
