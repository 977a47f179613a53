//! HTTP API server for external control (assessment UI)
//!
//! This module provides the REST seam through which UI events drive the
//! session state machine:
//! - POST /sessions - Start a session
//! - POST /sessions/:id/recordings - Submit a recording, run its stages
//! - POST /sessions/:id/advance - Move past a finished attempt
//! - POST /sessions/:id/complete - Finalize and dispatch backup
//! - POST /sessions/:id/abandon - Abandon at a state boundary
//! - GET /sessions/:id - Session view
//! - GET /sessions/:id/comparison - Attempt comparison
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{
    StartSessionRequest, StartSessionResponse, SubmitRecordingRequest, SubmitRecordingResponse,
};
pub use routes::create_router;
pub use state::AppState;
