//! UI layer: HTTP/WebSocket endpoints and server runtime.

pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
