// File: src/services/discord/components.rs

use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle};
use twilight_model::channel::message::{Component, EmojiReactionType};

pub const HAPPY_BIRTHDAY_PREFIX: &str = "happy-birthday:";

/// Single-button row letting anyone wish a user happy birthday with a
/// mention. The target user id rides in the custom id.
pub fn happy_birthday_row(user_id: u64) -> Component {
    Component::ActionRow(ActionRow {
        components: vec![Component::Button(Button {
            custom_id: Some(format!("{HAPPY_BIRTHDAY_PREFIX}{user_id}")),
            disabled: false,
            emoji: Some(EmojiReactionType::Unicode {
                name: "🎉".to_string(),
            }),
            label: Some("Happy Birthday !".to_string()),
            style: ButtonStyle::Primary,
            url: None,
            sku_id: None,
        })],
    })
}

/// Target user id from a happy-birthday custom id, if it is one.
pub fn parse_happy_birthday_id(custom_id: &str) -> Option<u64> {
    custom_id
        .strip_prefix(HAPPY_BIRTHDAY_PREFIX)
        .and_then(|raw| raw.parse().ok())
}
