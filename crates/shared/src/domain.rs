use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workspace member identifier as issued by the chat platform (e.g. `U03MT066GJU`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(RecordId)
    }
}

/// One logged exercise performance. Counts and weight stay as the text the
/// user typed; only `weight` is ever checked for being numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub owner_id: UserId,
    pub name: String,
    pub equipment: String,
    pub sets: String,
    pub reps: String,
    pub weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExerciseRecord {
    pub fn new(
        owner_id: UserId,
        name: impl Into<String>,
        equipment: impl Into<String>,
        sets: impl Into<String>,
        reps: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            owner_id,
            name: name.into(),
            equipment: equipment.into(),
            sets: sets.into(),
            reps: reps.into(),
            weight: weight.into(),
            created_at: None,
        }
    }

    /// `(<equipment>) : <sets> x <reps> x <weight>lb`
    pub fn summary_line(&self) -> String {
        format!(
            "({}) : {} x {} x {}lb",
            self.equipment, self.sets, self.reps, self.weight
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub is_admin: bool,
}

/// Decides who counts as an administrator. The override id, when configured,
/// is treated as admin regardless of the directory's role flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePolicy {
    pub admin_override: Option<UserId>,
}

impl RolePolicy {
    pub fn with_admin_override(user_id: UserId) -> Self {
        Self {
            admin_override: Some(user_id),
        }
    }

    pub fn is_admin(&self, profile: &UserProfile) -> bool {
        profile.is_admin || self.admin_override.as_ref() == Some(&profile.id)
    }
}
