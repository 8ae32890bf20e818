use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wolfchat::auth::{AuthSession, CredentialStore, FileCredentialStore, MemoryCredentialStore};
use wolfchat::config::ClientConfig;
use wolfchat::dashboard::{Dashboard, DashboardCommand, Flow};
use wolfchat::gateway::HttpGateway;
use wolfchat::playback::{PlaybackController, SpeechCapability, SystemSpeech};
use wolfchat::recording::RecordingManager;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing; stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wolfchat=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting wolfchat");

    let config = ClientConfig::load().context("Failed to load configuration")?;
    info!("Backend: {}", config.api.base_url);

    let store: Arc<dyn CredentialStore> = match config.storage.credentials_path() {
        Some(path) => Arc::new(FileCredentialStore::new(path)),
        None => {
            warn!("No data directory, session will not persist");
            Arc::new(MemoryCredentialStore::new())
        }
    };
    let session = AuthSession::new(store);
    if let Err(e) = session.restore() {
        warn!("Could not restore session: {}", e);
    }

    let gateway = Arc::new(HttpGateway::new(&config.api, Arc::new(session.clone()))?);

    let speech = SystemSpeech::detect().map(|s| Arc::new(s) as Arc<dyn SpeechCapability>);
    if speech.is_none() {
        warn!("No speech engine found, read-aloud disabled");
    }

    let mut dashboard = Dashboard::new(
        gateway,
        session,
        recorder(&config),
        PlaybackController::new(speech),
    );
    dashboard.start().await;
    render(&mut dashboard);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };

                match DashboardCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if dashboard.handle(command).await == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(usage) => println!("{}", usage),
                }
                render(&mut dashboard);
            }
            _ = tick.tick() => {
                dashboard.poll();
                render(&mut dashboard);
            }
        }
    }

    info!("Goodbye");
    Ok(())
}

#[cfg(feature = "audio-io")]
fn recorder(config: &ClientConfig) -> Option<RecordingManager> {
    let device = Box::new(wolfchat::recording::CpalCapture::new());
    Some(RecordingManager::from_config(device, &config.recording))
}

#[cfg(not(feature = "audio-io"))]
fn recorder(_config: &ClientConfig) -> Option<RecordingManager> {
    None
}

fn render<G>(dashboard: &mut Dashboard<G>)
where
    G: wolfchat::gateway::AuthApi + wolfchat::gateway::ChatApi + wolfchat::gateway::SpeechApi,
{
    let updates = dashboard.take_updates();
    if updates.is_empty() {
        return;
    }

    let mut stdout = std::io::stdout().lock();
    for line in updates {
        let _ = writeln!(stdout, "{}", line);
    }
    let _ = stdout.flush();
}
