// File: src/tasks/menu_scrape.rs

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::platforms::DiscordPlatform;
use crate::scrape::{MenuScraper, PostedMenuRegistry};

pub const MENU_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Diff scraped menu links against the registry. New links are persisted
/// and returned for announcement; a registered link is never returned
/// again.
pub fn register_new_menus(
    menus: Vec<String>,
    registry: &mut PostedMenuRegistry,
) -> Vec<String> {
    let mut new_menus = Vec::new();
    for link in menus {
        if registry.contains(&link) {
            continue;
        }
        if let Err(e) = registry.insert(link.clone()) {
            error!("failed to persist menu registry entry {link}: {e}");
        }
        new_menus.push(link);
    }
    new_menus
}

/// One poll cycle: scrape, diff against the registry, persist and announce
/// the new menus in every matching channel.
pub async fn check_menu(
    platform: &DiscordPlatform,
    scraper: &MenuScraper,
    registry: &mut PostedMenuRegistry,
    channel_name: &str,
) {
    let images = match scraper.fetch_images().await {
        Ok(images) => images,
        Err(e) => {
            // Skip this cycle; the next tick gets a fresh attempt.
            error!("menu scrape cycle failed: {e}");
            return;
        }
    };

    let new_menus = register_new_menus(images.menus, registry);
    if new_menus.is_empty() {
        debug!("no new menus");
        return;
    }

    let channels = platform.channels_named(channel_name);
    if channels.is_empty() {
        warn!("no channel named {channel_name} found; {} menus not announced", new_menus.len());
        return;
    }

    let body = new_menus.join("\n");
    for channel_id in channels {
        if let Err(e) = platform.send_message(channel_id, &body).await {
            warn!("menu announcement in {channel_id} failed: {e}");
        }
    }
    info!("announced {} new menu(s)", new_menus.len());
}

/// Spawns the hourly menu poll. The registry moves into the task; nothing
/// else mutates it.
pub fn spawn_menu_scrape_task(
    platform: Arc<DiscordPlatform>,
    scraper: Arc<MenuScraper>,
    mut registry: PostedMenuRegistry,
    channel_name: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(MENU_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            check_menu(&platform, &scraper, &mut registry, &channel_name).await;
        }
    })
}
