//! Reads structured records out of a screen's widget state and checks them.

use shared::{
    domain::{ExerciseRecord, UserId},
    protocol::WidgetState,
};
use thiserror::Error;

pub const WEIGHT_ERROR_MESSAGE: &str = "must be a number";
pub const SELECTED_USER_ELEMENT: &str = "selected_user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    Equipment,
    Sets,
    Reps,
    Weight,
}

impl RecordField {
    pub const ALL: [RecordField; 5] = [
        RecordField::Name,
        RecordField::Equipment,
        RecordField::Sets,
        RecordField::Reps,
        RecordField::Weight,
    ];

    pub fn block_id(self) -> &'static str {
        match self {
            Self::Name => "exercise_name_input",
            Self::Equipment => "equipment_needed_input",
            Self::Sets => "sets_input",
            Self::Reps => "reps_input",
            Self::Weight => "weight_input",
        }
    }

    pub fn element_id(self) -> &'static str {
        match self {
            Self::Name => "exercise_name",
            Self::Equipment => "equipment_needed",
            Self::Sets => "sets",
            Self::Reps => "reps",
            Self::Weight => "weight",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Exercise Name",
            Self::Equipment => "Equipment",
            Self::Sets => "Sets",
            Self::Reps => "Reps",
            Self::Weight => "Weight",
        }
    }

    pub fn value_of(self, record: &ExerciseRecord) -> &str {
        match self {
            Self::Name => &record.name,
            Self::Equipment => &record.equipment,
            Self::Sets => &record.sets,
            Self::Reps => &record.reps,
            Self::Weight => &record.weight,
        }
    }
}

/// The screen that fired a save did not carry the inputs the form always
/// renders. This is a defect on our side, never a user mistake.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("widget state has no `{block_id}` block")]
    MissingBlock { block_id: &'static str },
    #[error("block `{block_id}` has no `{element_id}` element")]
    MissingElement {
        block_id: &'static str,
        element_id: &'static str,
    },
}

pub fn extract_record(state: &WidgetState, owner_id: &UserId) -> Result<ExerciseRecord, FormError> {
    Ok(ExerciseRecord::new(
        owner_id.clone(),
        field_value(state, RecordField::Name)?,
        field_value(state, RecordField::Equipment)?,
        field_value(state, RecordField::Sets)?,
        field_value(state, RecordField::Reps)?,
        field_value(state, RecordField::Weight)?,
    ))
}

fn field_value(state: &WidgetState, field: RecordField) -> Result<String, FormError> {
    let block_id = field.block_id();
    let element_id = field.element_id();
    let block = state
        .get(block_id)
        .ok_or(FormError::MissingBlock { block_id })?;
    let element = block.get(element_id).ok_or(FormError::MissingElement {
        block_id,
        element_id,
    })?;
    // An input the user left empty is reported with no value at all.
    Ok(element.value.clone().unwrap_or_default())
}

/// The user picked in any `selected_user` element on the screen.
pub fn selected_user(state: &WidgetState) -> Option<UserId> {
    state
        .values()
        .filter_map(|block| block.get(SELECTED_USER_ELEMENT))
        .filter_map(|element| element.selected_user.clone())
        .find(|user_id| !user_id.as_str().trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: RecordField,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_field(&self, field: RecordField) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn push(&mut self, field: RecordField, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

/// Only the weight is checked; every other field is accepted verbatim.
pub fn validate(record: &ExerciseRecord) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if !is_numeric(&record.weight) {
        errors.push(RecordField::Weight, WEIGHT_ERROR_MESSAGE);
    }
    errors
}

/// Integer or decimal text, ignoring surrounding whitespace. Values too large
/// for `f64` still count; the bare words `nan` and `inf` do not.
pub fn is_numeric(raw: &str) -> bool {
    let raw = raw.trim();
    raw.parse::<i64>().is_ok()
        || (raw.bytes().any(|b| b.is_ascii_digit()) && raw.parse::<f64>().is_ok())
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
