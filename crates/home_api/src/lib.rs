use std::sync::Arc;

use shared::domain::RolePolicy;
use slack_integration::{SurfacePublisher, UserDirectory};
use storage::RecordStore;

pub mod form;
pub mod navigation;
pub mod screens;

pub use navigation::{handle_action, next_screen, HandleOutcome, NavigationError};
pub use screens::{HomeScreen, NavigationContext, ScreenKind};

/// How to react when a screen fires an action without the inputs it always
/// renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractPolicy {
    Panic,
    LogAndIgnore,
}

impl Default for ContractPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::LogAndIgnore
        }
    }
}

impl ContractPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Panic
        } else {
            Self::LogAndIgnore
        }
    }
}

/// Collaborators the navigation controller needs. Cheap to clone; every
/// handler gets its own copy and nothing inside is mutated.
#[derive(Clone)]
pub struct HomeContext {
    pub records: Arc<dyn RecordStore>,
    pub directory: Arc<dyn UserDirectory>,
    pub publisher: Arc<dyn SurfacePublisher>,
    pub roles: RolePolicy,
    pub contract_policy: ContractPolicy,
}
