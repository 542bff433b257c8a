//! Adaptive question planning
//!
//! Each new round looks at the user's most recent prior round for the same
//! role and derives a difficulty/focus strategy from its outcome. Planning
//! always produces a usable set of exactly 8 questions: when the text
//! service is down or returns junk, a deterministic fallback list stands in.

use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{json as llm_json, TextGenerator};
use crate::session::{Difficulty, Focus, Session, SessionRepository, QUESTIONS_PER_SESSION};

/// Question used to pad short generator output up to the full set.
const FILLER_QUESTION: &str =
    "What would you like the interviewer to know about you that we have not covered?";

/// Everything the orchestrator needs to create a new session.
#[derive(Debug, Clone)]
pub struct QuestionPlan {
    pub questions: Vec<String>,
    pub round_number: u32,
    pub based_on_session_id: Option<String>,
    pub based_on_weaknesses: Vec<String>,
    pub previous_score: Option<u32>,
}

pub struct QuestionPlanner {
    generator: Arc<dyn TextGenerator>,
    sessions: Arc<dyn SessionRepository>,
}

impl QuestionPlanner {
    pub fn new(generator: Arc<dyn TextGenerator>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            generator,
            sessions,
        }
    }

    /// Plan the next round for (user, role).
    pub async fn plan(
        &self,
        role: &str,
        user_id: &str,
        difficulty: Difficulty,
        focus: Focus,
    ) -> QuestionPlan {
        let prior = match self.sessions.find_latest(user_id, role).await {
            Ok(prior) => prior,
            Err(e) => {
                // First-round semantics; a broken store will fail the
                // session write instead
                warn!("Prior-round lookup failed for {user_id}/{role}: {e:#}");
                None
            }
        };

        let round_number = prior.as_ref().map_or(1, |s| s.round_number + 1);
        let weaknesses = prior_weaknesses(prior.as_ref());
        let previous_score = prior
            .as_ref()
            .and_then(|s| s.summary.as_ref())
            .filter(|r| r.error.is_none())
            .map(|r| r.overall_score);

        let prompt = build_prompt(
            role,
            round_number,
            &difficulty_instruction(difficulty, round_number, previous_score),
            &focus_instruction(focus, difficulty, &weaknesses),
        );

        let questions = match self.generator.generate(&prompt).await {
            Ok(text) => match llm_json::parse_string_array(&text) {
                Some(parsed) => shape_questions(parsed, role),
                None => {
                    warn!("Question generation returned malformed output, using fallback list");
                    fallback_questions(role)
                }
            },
            Err(e) => {
                warn!("Question generation failed, using fallback list: {e}");
                fallback_questions(role)
            }
        };

        info!(
            "Planned round {} for {} as {} ({} prior weaknesses)",
            round_number,
            user_id,
            role,
            weaknesses.len()
        );

        QuestionPlan {
            questions,
            round_number,
            based_on_session_id: prior.as_ref().map(|s| s.session_id.clone()),
            based_on_weaknesses: weaknesses,
            previous_score,
        }
    }
}

/// Weak areas carried over from the prior round's report, if it has one.
fn prior_weaknesses(prior: Option<&Session>) -> Vec<String> {
    prior
        .and_then(|s| s.summary.as_ref())
        .filter(|r| r.error.is_none())
        .map(|r| r.areas_for_improvement.clone())
        .unwrap_or_default()
}

fn difficulty_instruction(
    difficulty: Difficulty,
    round_number: u32,
    previous_score: Option<u32>,
) -> String {
    match difficulty {
        Difficulty::Easy => "Keep the questions approachable and foundational.".to_string(),
        Difficulty::Medium => "Aim for mid-level questions with some depth.".to_string(),
        Difficulty::Hard => "Ask demanding, senior-level questions.".to_string(),
        Difficulty::Adaptive => {
            if round_number <= 1 {
                "This is the user's first round, so start with foundational questions."
                    .to_string()
            } else {
                match previous_score {
                    Some(score) => format!(
                        "Make the questions slightly harder than the previous round \
                         (the user scored {score}/100 last time)."
                    ),
                    None => {
                        "Make the questions slightly harder than the previous round.".to_string()
                    }
                }
            }
        }
    }
}

fn focus_instruction(focus: Focus, difficulty: Difficulty, weaknesses: &[String]) -> String {
    match focus {
        Focus::Technical => {
            "Focus on technical depth and hands-on problem solving.".to_string()
        }
        Focus::Behavioral => "Focus on behavioral and situational questions.".to_string(),
        Focus::WeaknessRemediation if !weaknesses.is_empty() => format!(
            "Target the user's known weak areas: {}.",
            weaknesses.join(", ")
        ),
        // weakness_remediation without any recorded weaknesses degrades to
        // the general mix
        Focus::WeaknessRemediation | Focus::General => {
            if difficulty == Difficulty::Adaptive && !weaknesses.is_empty() {
                format!(
                    "Cover a general mix of technical and behavioral topics, touching on {} \
                     where it fits naturally.",
                    weaknesses.join(", ")
                )
            } else {
                "Cover a general mix of technical and behavioral topics.".to_string()
            }
        }
    }
}

fn build_prompt(
    role: &str,
    round_number: u32,
    difficulty_instruction: &str,
    focus_instruction: &str,
) -> String {
    format!(
        "Generate exactly 8 realistic interview questions for a {role} \
         (practice round {round_number}).\n\
         {difficulty_instruction}\n\
         {focus_instruction}\n\
         Return ONLY a JSON array of strings. No extra explanation."
    )
}

/// Enforce exactly 8 non-empty questions: drop blanks, pad with the filler
/// question, truncate.
fn shape_questions(raw: Vec<String>, role: &str) -> Vec<String> {
    let mut questions: Vec<String> = raw
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        return fallback_questions(role);
    }

    while questions.len() < QUESTIONS_PER_SESSION {
        questions.push(FILLER_QUESTION.to_string());
    }
    questions.truncate(QUESTIONS_PER_SESSION);
    questions
}

/// Deterministic question set used whenever generation is unavailable.
fn fallback_questions(role: &str) -> Vec<String> {
    vec![
        format!("Tell me about yourself and your background in {role}."),
        "Describe a challenging problem you solved.".to_string(),
        "Walk me through a project you're proud of.".to_string(),
        "Tell me about a time you received difficult feedback.".to_string(),
        "Explain a trade-off you made under pressure.".to_string(),
        "What are your strengths and weaknesses?".to_string(),
        format!("How do you stay current with {role} trends?"),
        format!("Why should we hire you for {role}?"),
    ]
}
