// File: src/services/discord/slashcommands/mod.rs

pub mod allergens;
pub mod birthdays;
pub mod ratio;

use std::sync::Arc;

use chrono_tz::Tz;
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::InteractionData;
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{
    InteractionResponse, InteractionResponseData, InteractionResponseType,
};
use twilight_model::id::marker::{ApplicationMarker, InteractionMarker};
use twilight_model::id::Id;

use prepabot_common::Error;

use crate::persons::PersonStore;
use crate::platforms::DiscordPlatform;
use crate::scrape::MenuScraper;
use crate::services::discord::components::parse_happy_birthday_id;

use allergens::{create_allergens_command, handle_allergens_interaction};
use birthdays::{create_birthdays_command, handle_birthdays_interaction};
use ratio::{create_ratio_command, handle_ratio_interaction};

/// Everything an interaction handler may need.
pub struct InteractionContext {
    pub platform: Arc<DiscordPlatform>,
    pub persons: Arc<PersonStore>,
    pub scraper: Arc<MenuScraper>,
    pub application_id: u64,
    pub timezone: Tz,
}

pub async fn register_global_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
) -> Result<(), Error> {
    // Build the slash commands:
    let birthdays_cmd = create_birthdays_command().build();
    let ratio_cmd = create_ratio_command().build();
    let allergens_cmd = create_allergens_command().build();
    let commands = &[birthdays_cmd, ratio_cmd, allergens_cmd];

    http.interaction(application_id)
        .set_global_commands(commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register global slash commands: {e}")))?;

    Ok(())
}

/// Dispatch slash commands and component clicks from an `InteractionCreate`.
pub async fn handle_interaction_create(
    ctx: &InteractionContext,
    event: &InteractionCreate,
) -> Result<(), Error> {
    let interaction = &event.0;
    let interaction_id = interaction.id;
    let interaction_token = &interaction.token;

    match &interaction.data {
        Some(InteractionData::ApplicationCommand(cmd_data)) => {
            let name = cmd_data.name.as_str();
            match name {
                "prochains-anniv" => {
                    handle_birthdays_interaction(ctx, interaction_id, interaction_token).await?;
                }
                "ratio" => {
                    handle_ratio_interaction(ctx, interaction, cmd_data).await?;
                }
                "allergenes" => {
                    handle_allergens_interaction(ctx, interaction_id, interaction_token).await?;
                }
                other => {
                    respond_text(
                        ctx,
                        interaction_id,
                        interaction_token,
                        &format!("Unrecognized command: {other}"),
                        false,
                        None,
                    )
                    .await
                    .ok(); // ignore error
                }
            }
        }
        Some(InteractionData::MessageComponent(comp_data)) => {
            if let Some(user_id) = parse_happy_birthday_id(&comp_data.custom_id) {
                let clicker = interaction
                    .member
                    .as_ref()
                    .and_then(|m| m.nick.clone().or_else(|| m.user.as_ref().map(|u| u.name.clone())))
                    .or_else(|| interaction.user.as_ref().map(|u| u.name.clone()))
                    .unwrap_or_else(|| "Quelqu'un".to_string());

                respond_text(
                    ctx,
                    interaction_id,
                    interaction_token,
                    &format!("{clicker} souhaite un joyeux anniversaire à <@{user_id}> !"),
                    false,
                    Some(DiscordPlatform::user_mentions_allowed()),
                )
                .await?;
            }
        }
        _ => {}
    }

    Ok(())
}

/// Plain-text interaction response, optionally ephemeral.
pub(crate) async fn respond_text(
    ctx: &InteractionContext,
    interaction_id: Id<InteractionMarker>,
    interaction_token: &str,
    content: &str,
    ephemeral: bool,
    allowed_mentions: Option<AllowedMentions>,
) -> Result<(), Error> {
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
                    content: Some(content.to_string()),
                    flags: ephemeral.then_some(MessageFlags::EPHEMERAL),
                    allowed_mentions,
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error responding to interaction: {e}")))?;

    Ok(())
}
