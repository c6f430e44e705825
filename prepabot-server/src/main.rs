use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use twilight_model::id::marker::ApplicationMarker;
use twilight_model::id::Id;

use chrono_tz::Tz;

use prepabot_ai::{CompletionConfig, ModelProvider, OpenAiProvider};
use prepabot_common::config::BotConfig;
use prepabot_core::persons::PersonStore;
use prepabot_core::platforms::discord::DiscordEvent;
use prepabot_core::platforms::DiscordPlatform;
use prepabot_core::scrape::{MenuScraper, PostedMenuRegistry};
use prepabot_core::services::discord::slashcommands::{
    handle_interaction_create, register_global_slash_commands, InteractionContext,
};
use prepabot_core::services::MessageService;
use prepabot_core::tasks::birthday::{spawn_birthday_task, BirthdayTaskConfig};
use prepabot_core::tasks::menu_scrape::spawn_menu_scrape_task;

#[derive(Parser, Debug, Clone)]
#[command(name = "prepabot")]
#[command(author, version, about = "prepabot - community Discord bot with chat completion")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "./config/prepabot.json")]
    config: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("prepabot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Arc::new(BotConfig::load(&args.config)?);

    let timezone: Tz = config
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone {}: {e}", config.timezone))?;

    let token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN is not set"))?;

    // Completion replies are simply disabled without an API key.
    let provider: Option<Arc<dyn ModelProvider>> = match std::env::var("OPENAI_API_KEY") {
        Ok(api_key) => Some(Arc::new(OpenAiProvider::new(CompletionConfig::new(
            api_key,
            config.completion.clone(),
        )))),
        Err(_) => {
            warn!("OPENAI_API_KEY not set; chat completion disabled");
            None
        }
    };

    let persons = Arc::new(PersonStore::load(&config.persons_path)?);
    info!("loaded {} people records", persons.len());

    let registry = PostedMenuRegistry::load(&config.registry_path)?;
    let scraper = Arc::new(MenuScraper::new(config.menu_page_url.clone()));

    let mut platform = DiscordPlatform::new(token);
    platform.connect().await?;
    let platform = Arc::new(platform);

    let application_id = platform.application_id().await?;
    if let Some(http) = &platform.http {
        register_global_slash_commands(http, Id::<ApplicationMarker>::new(application_id)).await?;
        info!("registered global slash commands");
    }

    let mut message_service = MessageService::new(
        platform.clone(),
        provider,
        persons.clone(),
        config.clone(),
        timezone,
    );

    let interaction_ctx = InteractionContext {
        platform: platform.clone(),
        persons: persons.clone(),
        scraper: scraper.clone(),
        application_id,
        timezone,
    };

    let menu_task = spawn_menu_scrape_task(
        platform.clone(),
        scraper.clone(),
        registry,
        config.menu_channel_name.clone(),
    );
    let birthday_task = spawn_birthday_task(
        platform.clone(),
        persons.clone(),
        BirthdayTaskConfig {
            guild_id: config.guild_id,
            channel_id: config.general_channel_id,
            hour: config.birthday_hour,
            timezone,
            current_member_roles: config.current_member_roles.clone(),
        },
    );

    info!("prepabot up");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            maybe_event = platform.next_event() => {
                let Some(event) = maybe_event else {
                    warn!("gateway event stream ended");
                    break;
                };
                match event {
                    DiscordEvent::Ready { bot_user_id } => {
                        message_service.on_ready(bot_user_id);
                    }
                    DiscordEvent::Message(inbound) => {
                        message_service.handle_message(inbound).await;
                    }
                    DiscordEvent::Interaction(inter) => {
                        if let Err(e) = handle_interaction_create(&interaction_ctx, &inter).await {
                            error!("interaction handling failed: {e}");
                        }
                    }
                }
            }
        }
    }

    menu_task.abort();
    birthday_task.abort();
    info!("prepabot stopped");

    Ok(())
}
