//! HTTP API for driving the replay buffer from a UI
//!
//! - POST /replay/start - Acquire capture and start the countdown
//! - POST /replay/pause - Pause every segment
//! - POST /replay/resume - Resume every segment
//! - POST /replay/loop - Toggle looping
//! - POST /replay/save - Save the rolling window to disk
//! - GET /replay/status - Query mode, countdown and window state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
