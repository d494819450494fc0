//! Declarative home-tab screens. Every screen the controller can land on is a
//! `HomeScreen` variant and `render` is the single place that lays them out.

use shared::{
    domain::{ExerciseRecord, RolePolicy, UserId, UserProfile},
    protocol::{Block, ButtonStyle, Element, HomeView, TextObject, Trigger},
};

use crate::form::{RecordField, ValidationErrors};

pub const ADMIN_PROMPT: &str = "Whose fate are we controlling today?";
pub const EMPTY_RECORDS_TEXT: &str = "_No records yet._";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    AdminTargetChoice,
    ActionChoice,
    RecordList,
    RecordForm,
}

/// Who is being acted upon. Lives in the view's private metadata between
/// round trips; nothing is kept server side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    pub target: Option<UserId>,
}

impl NavigationContext {
    pub fn for_target(target: UserId) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn from_metadata(metadata: &str) -> Self {
        let metadata = metadata.trim();
        Self {
            target: (!metadata.is_empty()).then(|| UserId::new(metadata)),
        }
    }

    pub fn to_metadata(&self) -> String {
        self.target
            .as_ref()
            .map(|target| target.as_str().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeScreen {
    /// User picker shown to admins at the root.
    AdminTargetChoice,
    /// `delegated` is set when an admin reached this screen by picking someone.
    ActionChoice {
        target: UserProfile,
        delegated: bool,
    },
    RecordList {
        target: UserProfile,
        records: Vec<ExerciseRecord>,
    },
    RecordForm {
        target: UserProfile,
        draft: Option<ExerciseRecord>,
        errors: ValidationErrors,
    },
}

impl HomeScreen {
    /// Where a user lands when opening the surface or navigating home.
    pub fn root(actor: UserProfile, roles: &RolePolicy) -> Self {
        if roles.is_admin(&actor) {
            Self::AdminTargetChoice
        } else {
            Self::ActionChoice {
                target: actor,
                delegated: false,
            }
        }
    }

    pub fn kind(&self) -> ScreenKind {
        match self {
            Self::AdminTargetChoice => ScreenKind::AdminTargetChoice,
            Self::ActionChoice { .. } => ScreenKind::ActionChoice,
            Self::RecordList { .. } => ScreenKind::RecordList,
            Self::RecordForm { .. } => ScreenKind::RecordForm,
        }
    }

    pub fn target(&self) -> Option<&UserProfile> {
        match self {
            Self::AdminTargetChoice => None,
            Self::ActionChoice { target, .. }
            | Self::RecordList { target, .. }
            | Self::RecordForm { target, .. } => Some(target),
        }
    }

    pub fn context(&self) -> NavigationContext {
        NavigationContext {
            target: self.target().map(|target| target.id.clone()),
        }
    }

    pub fn render(&self) -> HomeView {
        let blocks = match self {
            Self::AdminTargetChoice => admin_target_choice_blocks(),
            Self::ActionChoice { target, delegated } => action_choice_blocks(target, *delegated),
            Self::RecordList { target, records } => record_list_blocks(target, records),
            Self::RecordForm {
                target,
                draft,
                errors,
            } => record_form_blocks(target, draft.as_ref(), errors),
        };
        HomeView::new(self.context().to_metadata(), blocks)
    }
}

fn admin_target_choice_blocks() -> Vec<Block> {
    vec![Block::Section {
        block_id: Some("user_selection".to_string()),
        text: TextObject::markdown(ADMIN_PROMPT),
        accessory: Some(Element::UsersSelect {
            action_id: Trigger::SelectedUser.action_id().to_string(),
            placeholder: Some(TextObject::plain("Select a user")),
        }),
    }]
}

fn action_choice_blocks(target: &UserProfile, delegated: bool) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(3);
    if delegated {
        blocks.push(Block::Header {
            block_id: Some("selected_user_name".to_string()),
            text: TextObject::plain(&target.display_name),
        });
        blocks.push(Block::Divider);
    }
    blocks.push(Block::Actions {
        block_id: Some("action_choice".to_string()),
        elements: vec![
            Element::button(Trigger::ViewRecords.action_id(), "View Workout Records"),
            Element::button(Trigger::AddRecord.action_id(), "Add New Record"),
        ],
    });
    blocks
}

fn record_list_blocks(target: &UserProfile, records: &[ExerciseRecord]) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(records.len() * 3 + 3);
    blocks.push(target_heading(target));

    if records.is_empty() {
        blocks.push(Block::Divider);
        blocks.push(markdown_section(EMPTY_RECORDS_TEXT.to_string(), None));
    }

    for record in records {
        blocks.push(Block::Divider);
        blocks.push(markdown_section(
            format!("*{}*", escape_mrkdwn(&record.name)),
            None,
        ));
        let delete = record.id.map(|id| Element::Button {
            action_id: Trigger::DeleteRecord.action_id().to_string(),
            text: TextObject::plain("Delete"),
            value: Some(id.to_string()),
            style: Some(ButtonStyle::Danger),
        });
        blocks.push(markdown_section(escape_mrkdwn(&record.summary_line()), delete));
    }

    blocks.push(Block::Actions {
        block_id: Some("record_list_actions".to_string()),
        elements: vec![Element::button(Trigger::NavHome.action_id(), "Back")],
    });
    blocks
}

fn record_form_blocks(
    target: &UserProfile,
    draft: Option<&ExerciseRecord>,
    errors: &ValidationErrors,
) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(RecordField::ALL.len() + 2);
    blocks.push(target_heading(target));

    for field in RecordField::ALL {
        let label = errors.for_field(field).unwrap_or(field.label());
        let initial_value = draft
            .map(|record| field.value_of(record))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        blocks.push(Block::Input {
            block_id: field.block_id().to_string(),
            label: TextObject::plain(label),
            element: Element::PlainTextInput {
                action_id: field.element_id().to_string(),
                initial_value,
            },
        });
    }

    blocks.push(Block::Actions {
        block_id: Some("record_form_actions".to_string()),
        elements: vec![
            Element::Button {
                action_id: Trigger::ExerciseSave.action_id().to_string(),
                text: TextObject::plain("Save"),
                value: None,
                style: Some(ButtonStyle::Primary),
            },
            Element::button(Trigger::NavHome.action_id(), "Back"),
        ],
    });
    blocks
}

fn target_heading(target: &UserProfile) -> Block {
    markdown_section(format!("*{}*", escape_mrkdwn(&target.display_name)), None)
}

fn markdown_section(text: String, accessory: Option<Element>) -> Block {
    Block::Section {
        block_id: None,
        text: TextObject::markdown(text),
        accessory,
    }
}

/// mrkdwn treats `&`, `<` and `>` as control characters.
fn escape_mrkdwn(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[path = "tests/screens_tests.rs"]
mod tests;
