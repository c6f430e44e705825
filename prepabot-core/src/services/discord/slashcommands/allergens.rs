// File: src/services/discord/slashcommands/allergens.rs

use tracing::error;
use twilight_model::id::marker::InteractionMarker;
use twilight_model::id::Id;
use twilight_util::builder::command::CommandBuilder;

use prepabot_common::Error;

use super::{respond_text, InteractionContext};

pub fn create_allergens_command() -> CommandBuilder {
    CommandBuilder::new(
        "allergenes",
        "Affiche les allergènes du menu du jour.",
        twilight_model::application::command::CommandType::ChatInput,
    )
}

/// Handle an incoming `/allergenes` interaction: scrape on demand and list
/// whatever allergen sheets the page currently carries.
pub async fn handle_allergens_interaction(
    ctx: &InteractionContext,
    interaction_id: Id<InteractionMarker>,
    interaction_token: &str,
) -> Result<(), Error> {
    let allergens = match ctx.scraper.fetch_images().await {
        Ok(images) => images.allergens,
        Err(e) => {
            error!("allergen scrape failed: {e}");
            respond_text(
                ctx,
                interaction_id,
                interaction_token,
                "Impossible de récupérer les allergènes pour le moment.",
                true,
                None,
            )
            .await?;
            return Ok(());
        }
    };

    let content = format!(
        "Voici les allergènes du menu du jour :\n{}\n\n\
         S'ils ne sont pas à jour, c'est que le lycée ne les a pas publiés.\n\
         Attention : les allergènes sont susceptibles d'être modifiés, merci de se référer \
         au panneau d'affichage à la restauration scolaire.",
        allergens.join("\n")
    );

    respond_text(ctx, interaction_id, interaction_token, &content, false, None).await
}
