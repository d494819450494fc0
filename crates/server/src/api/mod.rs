//! Decoding of the three platform callbacks into work for the home controller.
//! Signature checks happen before anything here runs.

use shared::{
    domain::UserId,
    error::ApiError,
    protocol::{
        EventEnvelope, InboundAction, InteractionPayload, PlatformEvent, SlashCommand,
        SlashCommandResponse,
    },
};
use tracing::debug;

pub const HELLO_COMMAND: &str = "/hello";
pub const HELLO_REPLY: &str = "BeepBoop here comes the joop";
const HOME_TAB: &str = "home";

/// What the events endpoint should do with a verified body.
#[derive(Debug, PartialEq, Eq)]
pub enum EventDisposition {
    /// Endpoint ownership check; echo the challenge back.
    Challenge(String),
    Dispatch(InboundAction),
    Ignore,
}

pub fn decode_event(body: &[u8]) -> Result<EventDisposition, ApiError> {
    let envelope: EventEnvelope = serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("invalid event body: {e}")))?;

    Ok(match envelope {
        EventEnvelope::UrlVerification { challenge } => EventDisposition::Challenge(challenge),
        EventEnvelope::EventCallback {
            event: PlatformEvent::AppHomeOpened { user, tab },
        } if tab.as_deref().map_or(true, |tab| tab == HOME_TAB) => {
            EventDisposition::Dispatch(InboundAction::surface_opened(user))
        }
        EventEnvelope::EventCallback { .. } | EventEnvelope::Unsupported => {
            debug!("ignoring event outside the home tab flow");
            EventDisposition::Ignore
        }
    })
}

/// Interactions arrive form encoded with the JSON in a `payload` field.
/// `Ok(None)` means a well-formed interaction we have no transition for.
pub fn decode_interaction(body: &[u8]) -> Result<Option<InboundAction>, ApiError> {
    let payload = url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| ApiError::validation("interaction body has no payload field"))?;

    let payload: InteractionPayload = serde_json::from_str(&payload)
        .map_err(|e| ApiError::validation(format!("invalid interaction payload: {e}")))?;

    Ok(match payload {
        InteractionPayload::BlockActions(actions) => actions.into_inbound_action(),
        InteractionPayload::Unsupported => None,
    })
}

pub fn decode_command(body: &[u8]) -> Result<SlashCommand, ApiError> {
    let mut command = None;
    let mut text = String::new();
    let mut user_id = None;
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "command" => command = Some(value.into_owned()),
            "text" => text = value.into_owned(),
            "user_id" => user_id = Some(UserId::new(value)),
            _ => {}
        }
    }

    Ok(SlashCommand {
        command: command.ok_or_else(|| ApiError::validation("slash command has no command"))?,
        text,
        user_id: user_id.ok_or_else(|| ApiError::validation("slash command has no user_id"))?,
    })
}

pub fn reply_to_command(command: &SlashCommand) -> SlashCommandResponse {
    match command.command.trim() {
        HELLO_COMMAND => SlashCommandResponse::ephemeral(HELLO_REPLY),
        other => SlashCommandResponse::ephemeral(format!(
            "I don't know `{other}`. Try `{HELLO_COMMAND}`, or open my Home tab to log a lift."
        )),
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
