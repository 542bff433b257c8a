use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::feedback::Report;
use crate::speech::EmotionScore;

/// Number of questions in every practice round.
pub const QUESTIONS_PER_SESSION: usize = 8;

/// Difficulty requested for a practice round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Adaptive,
    Easy,
    Medium,
    Hard,
}

/// Topic emphasis requested for a practice round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    #[default]
    General,
    Technical,
    Behavioral,
    WeaknessRemediation,
}

/// Resolved generation settings, fixed at session creation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    pub difficulty: Difficulty,
    pub focus: Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Completed,
}

/// One response to one question. The raw audio blob is referenced by key,
/// never embedded in the session document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_index: u32,
    /// Question text as presented when the answer was recorded
    pub question: String,
    pub skipped: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
}

/// Finish-time analysis of one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalysis {
    pub question_index: u32,
    pub question: String,
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionScore>,
    /// "mm:ss", or empty when the probe failed
    #[serde(default)]
    pub duration: String,
    /// Set when this answer's audio could not be located or processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One mock-interview round, persisted as a single document nested under
/// the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub role: String,
    /// Strictly increasing per (user, role)
    pub round_number: u32,
    pub config: SessionSettings,
    /// Exactly 8, fixed at creation
    pub questions: Vec<String>,
    /// Prior round this one adapts to, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on_session_id: Option<String>,
    #[serde(default)]
    pub based_on_weaknesses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_score: Option<u32>,
    /// Append-only submission log; duplicates per index are possible
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Report>,
    #[serde(default)]
    pub per_question: Vec<AnswerAnalysis>,
}

impl Session {
    /// Latest answer per question index, ascending. The answer list is the
    /// audit log; re-recordings are reconciled here, last write wins.
    pub fn latest_answers(&self) -> BTreeMap<u32, &Answer> {
        let mut latest = BTreeMap::new();
        for answer in &self.answers {
            latest.insert(answer.question_index, answer);
        }
        latest
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }
}
