use std::sync::Arc;
use tracing::warn;

use super::report::{Report, BREAKDOWN_CATEGORIES};
use crate::llm::{json as llm_json, TextGenerator};

/// Builds the scoring prompt and turns model output into a [`Report`],
/// with one JSON-repair retry before degrading to an error-shaped report.
pub struct FeedbackGenerator {
    generator: Arc<dyn TextGenerator>,
}

impl FeedbackGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Score a full session transcript. Never fails.
    pub async fn summarize(&self, combined_transcript: &str) -> Report {
        let prompt = build_scoring_prompt(combined_transcript);

        let text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Scoring call failed: {e}");
                return Report::error_shaped(format!("feedback generation failed: {e}"));
            }
        };

        match parse_report(&text) {
            Ok(report) => report,
            Err(parse_err) => {
                warn!("Report JSON invalid ({parse_err}), running one repair pass");
                self.repair(&text).await
            }
        }
    }

    /// Single repair attempt: ask the model to reformat its own output.
    async fn repair(&self, raw: &str) -> Report {
        let prompt =
            format!("Reformat the following into valid JSON only (no explanation):\n\n{raw}");

        match self.generator.generate(&prompt).await {
            Ok(text) => parse_report(&text).unwrap_or_else(|e| {
                warn!("Repair pass still invalid: {e}");
                Report::error_shaped(format!("model returned malformed report JSON: {e}"))
            }),
            Err(e) => Report::error_shaped(format!("report repair failed: {e}")),
        }
    }
}

fn parse_report(text: &str) -> Result<Report, String> {
    let cleaned = llm_json::strip_code_fences(text);
    let object = llm_json::extract_object(cleaned)
        .ok_or_else(|| "no JSON object in model output".to_string())?;
    serde_json::from_str(object).map_err(|e| e.to_string())
}

fn build_scoring_prompt(transcript: &str) -> String {
    let categories = BREAKDOWN_CATEGORIES.join(", ");
    format!(
        r#"You are an AI interview coach. Analyze this full mock interview and return JSON ONLY that matches this schema exactly:

{{
  "overallScore": 0-100,
  "grade": "string",
  "performanceLevel": "string",
  "keyStrengths": ["3-5 short strings"],
  "areasForImprovement": ["3-5 short strings"],
  "performanceBreakdown": [
    {{"category": "string", "score": 0-100, "summary": "string", "suggestions": ["string"]}}
  ],
  "immediateActionItems": ["string"],
  "longTermDevelopment": ["string"],
  "summary": "string"
}}

Guidelines:
- Include one performanceBreakdown entry per category: {categories}.
- All scores are integers from 0 to 100.
- Questions marked [SKIPPED] were not answered; note the skip but do not invent content for them.
- Be concise, specific, and encouraging. Use STAR-method advice when relevant.
- Keep each suggestion under 15 words.
- Ensure valid JSON (no markdown, no comments).

Interview transcript:
"""
{transcript}
"""
"#
    )
}
