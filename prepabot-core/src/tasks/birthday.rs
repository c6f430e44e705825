// File: src/tasks/birthday.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tokio::time::Duration;
use tracing::{error, info, warn};

use prepabot_common::Error;

use crate::persons::PersonStore;

#[derive(Debug, Clone)]
pub struct BirthdayTaskConfig {
    pub guild_id: u64,
    pub channel_id: u64,
    pub hour: u32,
    pub timezone: Tz,
    /// Members holding any of these roles get the interactive button;
    /// alumni get a plain announcement.
    pub current_member_roles: Vec<u64>,
}

/// Next wall-clock occurrence of `hour:00` in the given zone, strictly
/// after `now`. Skips forward over DST gaps.
pub fn next_run(now: DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let target = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();

    let mut date = now.date_naive();
    if now.time() >= target {
        date = date.succ_opt().unwrap_or(date);
    }
    loop {
        if let Some(run) = tz
            .from_local_datetime(&date.and_time(target))
            .earliest()
        {
            if run > now {
                return run;
            }
        }
        date = match date.succ_opt() {
            Some(d) => d,
            None => return now,
        };
    }
}

/// The platform surface the birthday announcer needs. `DiscordPlatform`
/// implements it; tests substitute their own.
#[async_trait]
pub trait BirthdayNotifier: Send + Sync {
    /// `Ok(None)` when the member lookup fails.
    async fn member_roles(&self, guild_id: u64, user_id: u64) -> Result<Option<Vec<u64>>, Error>;

    async fn send_plain(&self, channel_id: u64, text: &str) -> Result<(), Error>;

    /// Announcement carrying the interactive birthday button.
    async fn send_with_button(
        &self,
        channel_id: u64,
        text: &str,
        user_id: u64,
    ) -> Result<(), Error>;
}

/// Announce everyone whose birthdate day+month match today.
pub async fn announce_birthdays<N: BirthdayNotifier + ?Sized>(
    platform: &N,
    persons: &PersonStore,
    config: &BirthdayTaskConfig,
) -> Result<(), Error> {
    let today = Utc::now().with_timezone(&config.timezone).date_naive();

    for person in persons.iter() {
        if !person.has_birthday_on(today) {
            continue;
        }

        let text = format!("Eh ! {} a anniversaire ! Souhaitez-le lui !", person.display);

        if let Some(user_id) = person.user_id {
            let roles = platform.member_roles(config.guild_id, user_id).await?;
            let Some(roles) = roles else {
                // Lookup failed; skip this person only.
                warn!("member {user_id} not found, skipping birthday announcement");
                continue;
            };

            // Don't spam alumni with mentions, but spam (lovely) current
            // students.
            let is_current = roles.iter().any(|r| config.current_member_roles.contains(r));
            if is_current {
                platform
                    .send_with_button(config.channel_id, &text, user_id)
                    .await?;
            } else {
                platform.send_plain(config.channel_id, &text).await?;
            }
        } else {
            platform.send_plain(config.channel_id, &text).await?;
        }

        info!(
            "announced birthday of {} ({})",
            person.display,
            today.format("%d/%m")
        );
    }

    Ok(())
}

/// Spawns the daily birthday check at the configured local time. One check
/// runs right away, so a restart later in the day still announces today's
/// birthdays.
pub fn spawn_birthday_task<N: BirthdayNotifier + 'static>(
    platform: Arc<N>,
    persons: Arc<PersonStore>,
    config: BirthdayTaskConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = announce_birthdays(platform.as_ref(), &persons, &config).await {
            error!("birthday check failed: {e}");
        }

        loop {
            let now = Utc::now().with_timezone(&config.timezone);
            let run_at = next_run(now, config.hour);
            let wait = (run_at - now)
                .to_std()
                .unwrap_or(Duration::from_secs(60));
            info!(
                "next birthday check at {} (in {}s)",
                run_at.format("%Y-%m-%d %H:%M %Z"),
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;

            if let Err(e) = announce_birthdays(platform.as_ref(), &persons, &config).await {
                error!("birthday check failed: {e}");
            }
        }
    })
}
