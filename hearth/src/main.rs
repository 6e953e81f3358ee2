use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use hearth::config::HostConfig;
use hearth::conversation::{Conversation, ConversationDispatcher};
use hearth::models::{ContactInfo, ContactList};
use hearth::user::LocalUserService;
use hearth_mailbox::{LoopbackOutbox, PostOffice};
use tracing_subscriber::prelude::*;

const ECHO_ID: &str = "echo";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing (optional, controlled via RUST_LOG)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=info,hearth_mailbox=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let script_path = std::env::args()
        .nth(1)
        .context("Usage: hearth <script.lua>")?;
    let code = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("Failed to read script '{script_path}'"))?;
    let name = Path::new(&script_path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("app")
        .to_string();
    let config = HostConfig::load(&HostConfig::default_path()?).await?;

    let post_office = PostOffice::new();
    let users = Arc::new(LocalUserService::new(config.profile_name.clone()));
    let echo = ContactInfo::new(ECHO_ID, "echo");
    users.add_contact(echo.clone());
    users.set_online(ECHO_ID, true);
    let outbox = Arc::new(LoopbackOutbox::new(post_office.clone()));
    let conversation = Conversation::with_contacts(
        uuid::Uuid::now_v7().to_string(),
        [echo].into_iter().collect::<ContactList>(),
    );
    let mut dispatcher = ConversationDispatcher::new(conversation, users, outbox, post_office);
    let app_id = dispatcher.place_app(&name, &code)?;
    tracing::info!(app_id, "Running {}", script_path);

    let mut interval = tokio::time::interval(config.poll_interval());
    let mut printed = 0;
    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        dispatcher.tick();
        if let Some(app) = dispatcher.app(&app_id) {
            let output = app.output();
            for line in output.iter().skip(printed) {
                println!("{line}");
            }
            printed = output.len();
        }
        ticks += 1;
        if config.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
    }
    Ok(())
}
