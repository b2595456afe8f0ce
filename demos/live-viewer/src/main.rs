//! Demo viewer: connects a coordinator to a real backend and prints what
//! it sees until Ctrl-C.
//!
//! ```text
//! live-viewer <backend-url> <room-id> <user-id> [spy-room-id]
//! ```

use liveroom::{
    ChannelId, Coordinator, CoordinatorConfig, Credential, CredentialProvider,
    EmoteType, MemberId, SessionError, SessionIdentity,
};
use liveroom_transport::WebSocketTransport;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Credential provider
// ---------------------------------------------------------------------------

/// Hands out the user id as its own token. Works against backends that run
/// with authentication disabled; a real deployment implements
/// [`CredentialProvider`] against its token service.
struct DevCredentials;

impl CredentialProvider for DevCredentials {
    async fn issue(
        &self,
        user: &MemberId,
        _room: &ChannelId,
    ) -> Result<Credential, SessionError> {
        Ok(Credential {
            user_id: user.clone(),
            token: user.as_str().to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(usage);
    let room = ChannelId::new(args.next().unwrap_or_else(usage));
    let user = MemberId::new(args.next().unwrap_or_else(usage));
    let spy_target = args.next().map(ChannelId::new);

    let transport = WebSocketTransport::connect(&url).await?;
    let coordinator = Coordinator::new(
        SessionIdentity::new(room, user),
        transport,
        CoordinatorConfig::default(),
    );

    coordinator.connect(&DevCredentials).await?;
    tracing::info!(identity = %coordinator.identity(), "connected");

    // Print every emote broadcast on the room.
    let mut emotes = coordinator
        .emote_events()
        .ok_or("emote stream already taken")?;
    tokio::spawn(async move {
        while let Some(event) = emotes.recv().await {
            println!("{} sent {:?}", event.sender, event.emote);
        }
    });

    // Print viewer-count changes on the room.
    let mut counts = coordinator.viewer_counts();
    tokio::spawn(async move {
        while counts.changed().await.is_ok() {
            println!("viewers: {}", *counts.borrow());
        }
    });

    // Optionally observe a concurrent room's membership.
    if let Some(target) = spy_target {
        let mut spy = coordinator.join_auxiliary(target.clone()).await?;
        tokio::spawn(async move {
            while let Some(event) = spy.recv().await {
                println!("{target}: {event:?}");
            }
        });
    }

    coordinator.send_emote(EmoteType::Clap).await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    coordinator.teardown().await;
    Ok(())
}

fn usage() -> String {
    eprintln!("usage: live-viewer <backend-url> <room-id> <user-id> [spy-room-id]");
    std::process::exit(2);
}
