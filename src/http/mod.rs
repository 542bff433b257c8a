//! HTTP API for practice sessions
//!
//! - POST /practice/start - Plan questions and open a session
//! - POST /practice/answer - Record one answer (multipart, optional audio)
//! - POST /practice/finish - Analyze answers and produce the coaching report
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
