//! Wire types exchanged with the chat platform: the home-tab view model that
//! gets published, and the inbound event/interaction payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

// ---------------------------------------------------------------------------
// Outbound: home view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Home,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeView {
    #[serde(rename = "type")]
    pub kind: SurfaceKind,
    #[serde(default)]
    pub private_metadata: String,
    pub blocks: Vec<Block>,
}

impl HomeView {
    pub fn new(private_metadata: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            kind: SurfaceKind::Home,
            private_metadata: private_metadata.into(),
            blocks,
        }
    }

    pub fn input_blocks(&self) -> impl Iterator<Item = (&str, &TextObject, &Element)> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Input {
                block_id,
                label,
                element,
            } => Some((block_id.as_str(), label, element)),
            _ => None,
        })
    }

    /// Every interactive element on the view, in render order.
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Section {
                    accessory: Some(element),
                    ..
                } => out.push(element),
                Block::Actions { elements, .. } => out.extend(elements.iter()),
                Block::Input { element, .. } => out.push(element),
                _ => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    PlainText,
    Mrkdwn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.into(),
            emoji: Some(true),
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.into(),
            emoji: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        text: TextObject,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<Element>,
    },
    Header {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        text: TextObject,
    },
    Divider,
    Actions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        elements: Vec<Element>,
    },
    Input {
        block_id: String,
        label: TextObject,
        element: Element,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button {
        action_id: String,
        text: TextObject,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
    UsersSelect {
        action_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<TextObject>,
    },
    PlainTextInput {
        action_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_value: Option<String>,
    },
}

impl Element {
    pub fn button(action_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Button {
            action_id: action_id.into(),
            text: TextObject::plain(text),
            value: None,
            style: None,
        }
    }

    pub fn action_id(&self) -> &str {
        match self {
            Self::Button { action_id, .. }
            | Self::UsersSelect { action_id, .. }
            | Self::PlainTextInput { action_id, .. } => action_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound: events and interactions
// ---------------------------------------------------------------------------

/// Current values of every input on a view, keyed by block id then element id.
pub type WidgetState = BTreeMap<String, BTreeMap<String, WidgetValue>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_user: Option<UserId>,
}

impl WidgetValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: Some("plain_text_input".to_string()),
            value: Some(value.into()),
            selected_user: None,
        }
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            kind: Some("users_select".to_string()),
            value: None,
            selected_user: Some(user_id),
        }
    }
}

/// Body of the events endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification { challenge: String },
    EventCallback { event: PlatformEvent },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    AppHomeOpened {
        user: UserId,
        #[serde(default)]
        tab: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

/// JSON carried in the `payload` form field of the interactions endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    BlockActions(BlockActionsPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockActionsPayload {
    pub user: PayloadUser,
    #[serde(default)]
    pub view: Option<PayloadView>,
    #[serde(default)]
    pub actions: Vec<PayloadAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadUser {
    pub id: UserId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadView {
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub state: PayloadViewState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadViewState {
    #[serde(default)]
    pub values: WidgetState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadAction {
    pub action_id: String,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_user: Option<UserId>,
}

impl BlockActionsPayload {
    /// Picks the first action whose id names a known trigger.
    pub fn into_inbound_action(self) -> Option<InboundAction> {
        let action = self
            .actions
            .into_iter()
            .find(|action| Trigger::from_action_id(&action.action_id).is_some())?;
        let trigger = Trigger::from_action_id(&action.action_id)?;
        let view = self.view.unwrap_or_default();
        let mut widget_state = view.state.values;

        // Some clients report the picked user only on the action itself.
        if let Some(user_id) = action.selected_user {
            let slot = widget_state
                .entry(action.block_id.unwrap_or_default())
                .or_default()
                .entry(action.action_id)
                .or_default();
            if slot.selected_user.is_none() {
                *slot = WidgetValue::user(user_id);
            }
        }

        Some(InboundAction {
            actor: self.user.id,
            trigger,
            widget_state,
            metadata: view.private_metadata,
            value: action.value,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    SurfaceOpened,
    SelectedUser,
    ViewRecords,
    AddRecord,
    ExerciseSave,
    DeleteRecord,
    NavHome,
}

impl Trigger {
    pub const INTERACTIVE: [Trigger; 6] = [
        Trigger::SelectedUser,
        Trigger::ViewRecords,
        Trigger::AddRecord,
        Trigger::ExerciseSave,
        Trigger::DeleteRecord,
        Trigger::NavHome,
    ];

    pub fn action_id(self) -> &'static str {
        match self {
            Self::SurfaceOpened => "app_home_opened",
            Self::SelectedUser => "selected_user",
            Self::ViewRecords => "view_records",
            Self::AddRecord => "add_record",
            Self::ExerciseSave => "exercise_save",
            Self::DeleteRecord => "delete_record",
            Self::NavHome => "nav_home",
        }
    }

    /// Only interactive triggers have action ids; the surface-opened event
    /// arrives through the events endpoint instead.
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        Self::INTERACTIVE
            .into_iter()
            .find(|trigger| trigger.action_id() == action_id)
    }
}

/// One inbound user interaction, normalised from either endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundAction {
    pub actor: UserId,
    pub trigger: Trigger,
    pub widget_state: WidgetState,
    pub metadata: String,
    pub value: Option<String>,
}

impl InboundAction {
    pub fn surface_opened(actor: UserId) -> Self {
        Self {
            actor,
            trigger: Trigger::SurfaceOpened,
            widget_state: WidgetState::new(),
            metadata: String::new(),
            value: None,
        }
    }

    pub fn interaction(actor: UserId, trigger: Trigger, metadata: impl Into<String>) -> Self {
        Self {
            actor,
            trigger,
            widget_state: WidgetState::new(),
            metadata: metadata.into(),
            value: None,
        }
    }

    pub fn with_widget_state(mut self, widget_state: WidgetState) -> Self {
        self.widget_state = widget_state;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Form fields posted to the slash command endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl SlashCommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
