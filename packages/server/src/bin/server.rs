//! Real-time messaging hub for the chat feature.
//!
//! Tracks connected users over WebSocket and fans chat events out to the
//! other participants, recording messages and conversation metadata.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagu-server
//! cargo run --bin tsunagu-server -- --host 0.0.0.0 --port 8085
//! ```

use std::sync::Arc;

use clap::Parser;
use tsunagu_server::{
    infrastructure::repository::{InMemoryConversationRepository, InMemoryMessageRepository},
    ui::{AppState, Server},
};
use tsunagu_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tsunagu-server")]
#[command(about = "Real-time chat messaging hub", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8085")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. AppState (spawns the hub worker and builds the event router)
    // 3. Server

    let messages = Arc::new(InMemoryMessageRepository::new());
    let conversations = Arc::new(InMemoryConversationRepository::new());

    let state = Arc::new(AppState::new(messages, conversations, Arc::new(SystemClock)));

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
