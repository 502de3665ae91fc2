use forum_realtime_rs::{
    ChatMessage, RealtimeClient, RealtimeClientOptions, SessionContext, SessionStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Terminal chat against the forum chat service.
///
/// Lines typed on stdin are sent as chat messages; relayed messages are
/// printed as they arrive. Ctrl-C logs out and exits.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("FORUM_CHAT_URL").unwrap_or_else(|_| "ws://localhost:8082/ws".into());
    let username = std::env::var("FORUM_USERNAME").unwrap_or_else(|_| "guest".into());
    let token = std::env::var("FORUM_TOKEN").ok();

    let mut session = SessionContext::new(username);
    if let Some(user_id) = std::env::var("FORUM_USER_ID").ok().and_then(|id| id.parse().ok()) {
        session = session.with_user_id(user_id);
    }
    if let Some(token) = token.clone() {
        session = session.with_token(token);
    }

    let client = RealtimeClient::new(
        &url,
        RealtimeClientOptions {
            manual: true,
            access_token: token,
            ..Default::default()
        },
    )?;

    match client.fetch_history().await {
        Ok(history) => {
            for message in history {
                println!("{}: {}", message.username, message.content);
            }
        }
        Err(e) => tracing::warn!("Could not load chat history: {}", e),
    }

    let mut inbound = client.on_message().await;
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            match message.decode::<ChatMessage>() {
                Ok(chat) => println!("{}: {}", chat.username, chat.content),
                Err(_) => println!("{}", message.payload()),
            }
        }
    });

    let sessions = SessionStore::global();
    client.bind_session(sessions).await;
    let session = sessions.begin(session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if !line.trim().is_empty() => {
                    if let Err(e) = client.send_chat(&session, line.trim()).await {
                        println!("(not sent: {}, status: {})", e, client.status());
                    }
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    sessions.end();
    client.disconnect().await;
    Ok(())
}
