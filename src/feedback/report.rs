use serde::{Deserialize, Deserializer, Serialize};

/// Fixed scoring categories requested from the model.
pub const BREAKDOWN_CATEGORIES: [&str; 4] = [
    "Communication",
    "Technical Knowledge",
    "Problem-Solving",
    "Professionalism",
];

/// Per-category slice of the performance breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryScore {
    pub category: String,
    #[serde(deserialize_with = "clamped_score")]
    pub score: u32,
    pub summary: String,
    pub suggestions: Vec<String>,
}

/// The structured coaching report produced at session completion.
///
/// Parsed leniently: models omit fields and bend numeric types, so every
/// field defaults and scores are clamped into [0, 100] during parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    #[serde(deserialize_with = "clamped_score")]
    pub overall_score: u32,
    pub grade: String,
    pub performance_level: String,
    pub key_strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub performance_breakdown: Vec<CategoryScore>,
    pub immediate_action_items: Vec<String>,
    pub long_term_development: Vec<String>,
    pub summary: String,
    /// Set instead of the fields above when scoring was unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Report standing in for a score when the model chain is exhausted or
    /// keeps returning malformed JSON.
    pub fn error_shaped(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Accept any JSON number and clamp it into the 0-100 contract.
fn clamped_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 100.0) as u32)
}
