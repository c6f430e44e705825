// File: src/services/discord/slashcommands/ratio.rs

use tracing::debug;
use twilight_model::application::interaction::application_command::{
    CommandData, CommandOptionValue,
};
use twilight_model::application::interaction::Interaction;
use twilight_util::builder::command::{BooleanBuilder, CommandBuilder, UserBuilder};

use prepabot_common::Error;

use super::{respond_text, InteractionContext};

pub fn create_ratio_command() -> CommandBuilder {
    CommandBuilder::new(
        "ratio",
        "Ratio le dernier message d'un utilisateur.",
        twilight_model::application::command::CommandType::ChatInput,
    )
    .option(UserBuilder::new("user", "L'utilisateur que vous souhaitez ratio.").required(true))
    .option(BooleanBuilder::new(
        "anonymous",
        "Ne pas révéler qui est à l'origine de cet impitoyable ratio.",
    ))
}

/// Handle an incoming `/ratio` interaction: ack ephemerally, find the
/// target's most recent message in the channel, reply "ratio." under it and
/// heart the reply. Lookup or send failures are swallowed.
pub async fn handle_ratio_interaction(
    ctx: &InteractionContext,
    interaction: &Interaction,
    cmd_data: &CommandData,
) -> Result<(), Error> {
    let mut target: Option<u64> = None;
    let mut anonymous = false;
    for opt in &cmd_data.options {
        match (opt.name.as_str(), &opt.value) {
            ("user", CommandOptionValue::User(id)) => target = Some(id.get()),
            ("anonymous", CommandOptionValue::Boolean(value)) => anonymous = *value,
            _ => {}
        }
    }

    let Some(target) = target else {
        return Ok(());
    };
    let Some(channel_id) = interaction.channel.as_ref().map(|c| c.id.get()) else {
        return Ok(());
    };
    let invoker = interaction.author_id().map(|id| id.get());

    respond_text(
        ctx,
        interaction.id,
        &interaction.token,
        "Le ratio est à utiliser avec modération. (Je te le présenterai à l'occasion).",
        true,
        None,
    )
    .await?;

    // Look through recent messages to locate one from the target.
    let history = ctx.platform.recent_channel_messages(channel_id, 100).await?;
    let Some(message) = history.iter().find(|m| m.author_id == target) else {
        return Ok(());
    };

    let mut text = "ratio.".to_string();
    if !anonymous {
        if let Some(invoker) = invoker {
            text.push_str(&format!(" by <@{invoker}>"));
        }
    }

    match ctx.platform.reply(channel_id, message.id, &text, true).await {
        Ok(reply_id) => {
            if let Err(e) = ctx
                .platform
                .add_unicode_reaction(channel_id, reply_id, "💟")
                .await
            {
                debug!("ratio heart failed: {e}");
            }
        }
        Err(e) => {
            debug!("ratio reply failed: {e}");
        }
    }

    Ok(())
}
