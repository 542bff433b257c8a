//! Session scoring
//!
//! Turns the combined interview transcript into a structured coaching
//! report via the text-generation service. Scoring never fails the
//! session: an exhausted model chain or unparseable output degrades to an
//! error-shaped report.

mod generator;
mod report;

pub use generator::FeedbackGenerator;
pub use report::{CategoryScore, Report, BREAKDOWN_CATEGORIES};
