use dotenvy::dotenv;
use mediafire_relay::config::Settings;
use mediafire_relay::logging::{init_logging, RedactionPatterns};
use mediafire_relay::notify::TelegramNotifier;
use mediafire_relay::relay::RelayService;
use mediafire_relay::resolver::ResolutionPipeline;
use mediafire_relay::server::{self, AppState};
use mediafire_relay::size::HeadSizeProbe;
use std::sync::Arc;
use teloxide::Bot;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting MediaFire relay...");

    let settings = init_settings();

    let bot = Bot::new(settings.telegram_token.clone());
    let notifier = Arc::new(TelegramNotifier::new(bot));

    let pipeline = Arc::new(ResolutionPipeline::from_settings(&settings).map_err(|e| {
        error!("Failed to build resolver clients: {e}");
        e
    })?);
    info!(strategies = ?pipeline.strategy_names(), "Resolver pipeline ready.");

    let probe = Arc::new(
        HeadSizeProbe::new(settings.probe_timeout(), &settings.user_agent).map_err(|e| {
            error!("Failed to build HEAD size client: {e}");
            e
        })?,
    );

    let state = AppState {
        relay: RelayService::new(pipeline, probe, notifier),
        bot_username: settings.bot_username.clone(),
    };

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address).await.map_err(|e| {
        error!("Failed to bind {address}: {e}");
        e
    })?;

    server::serve(listener, state).await?;

    info!("Relay server stopped.");
    Ok(())
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
