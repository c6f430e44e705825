// File: src/services/discord/slashcommands/birthdays.rs

use chrono::Utc;
use twilight_model::http::interaction::{
    InteractionResponse, InteractionResponseData, InteractionResponseType,
};
use twilight_model::id::marker::{ApplicationMarker, InteractionMarker};
use twilight_model::id::Id;
use twilight_util::builder::command::CommandBuilder;
use twilight_util::builder::embed::EmbedBuilder;

use prepabot_common::Error;

use super::InteractionContext;

/// Discord rejects embed descriptions past 4096 chars; stay under it.
const MAX_DESCRIPTION_LEN: usize = 4000;

pub fn create_birthdays_command() -> CommandBuilder {
    CommandBuilder::new(
        "prochains-anniv",
        "Liste les prochains anniversaires.",
        twilight_model::application::command::CommandType::ChatInput,
    )
}

/// Handle an incoming `/prochains-anniv` interaction.
pub async fn handle_birthdays_interaction(
    ctx: &InteractionContext,
    interaction_id: Id<InteractionMarker>,
    interaction_token: &str,
) -> Result<(), Error> {
    let today = Utc::now().with_timezone(&ctx.timezone).date_naive();

    let mut rows: Vec<String> = Vec::new();
    for (person, next) in ctx.persons.upcoming_birthdays(today) {
        let birth_ts = person
            .birthdate
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let next_ts = next
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        let row = format!(
            "{} ({}). <t:{}:D> (<t:{}:R>)",
            person.display, person.origin, birth_ts, next_ts
        );
        let used: usize = rows.iter().map(|r| r.len() + 1).sum();
        if used + row.len() > MAX_DESCRIPTION_LEN {
            break;
        }
        rows.push(row);
    }

    let embed = EmbedBuilder::new()
        .title("Listes des prochains anniversaires")
        .description(rows.join("\n"))
        .build();

    let http = ctx
        .platform
        .http
        .as_ref()
        .ok_or_else(|| Error::Platform("Discord HTTP client not connected".into()))?;

    http.interaction(Id::<ApplicationMarker>::new(ctx.application_id))
        .create_response(
            interaction_id,
            interaction_token,
            &InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    embeds: Some(vec![embed]),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error responding to `/prochains-anniv`: {e}")))?;

    Ok(())
}
