mod console;

use std::sync::Arc;

use chatdesk::{AppConfig, ChatController, FileAudioPlayer, HttpChatApi};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the rendered chat
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatdesk=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Wiring ────────────────────────────────────────────────────────────────
    let config = AppConfig::from_env()?;
    info!("Using chat API at {}", config.api_base_url);
    info!("Voice replies are written to {}", config.audio_dir.display());

    let api = Arc::new(HttpChatApi::new(config.api_base_url.clone())?);
    let player = Arc::new(FileAudioPlayer::new(config.audio_dir.clone()));
    let controller = ChatController::new(api, player);

    // ── Notifications ─────────────────────────────────────────────────────────
    let mut notifications = controller.notifications();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(n) => println!("{}", console::render_notification(&n)),
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {skipped} notifications"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // ── Session list, then the prompt ─────────────────────────────────────────
    if let Err(e) = controller.initialize().await {
        warn!("Starting without sessions: {e}");
    }
    let state = controller.state();
    println!("{}", console::render_sessions(&state));
    println!("{}", console::render_thread(&state));
    println!("Type /help for commands.");

    console::run(&controller).await
}
