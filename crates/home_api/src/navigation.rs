use shared::{
    domain::{ExerciseRecord, RecordId, UserId, UserProfile},
    protocol::{InboundAction, Trigger},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    form::{self, FormError},
    screens::{HomeScreen, NavigationContext, ScreenKind},
    ContractPolicy, HomeContext,
};

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("no user was selected")]
    MissingSelection,
    #[error("malformed form input: {0}")]
    MalformedInput(#[from] FormError),
    #[error("delete action carried no usable record id: {0:?}")]
    InvalidRecordId(Option<String>),
    #[error("user {0} is not known to the directory")]
    UnknownUser(UserId),
    #[error("directory lookup failed: {0:#}")]
    Directory(anyhow::Error),
    #[error("record store failed: {0:#}")]
    Store(anyhow::Error),
}

/// What happened to one inbound action. The transport acknowledges the action
/// whatever the outcome.
#[derive(Debug)]
pub enum HandleOutcome {
    Published(ScreenKind),
    /// No transition happened; nothing was published.
    Skipped(NavigationError),
    /// The screen was computed but could not be delivered.
    PublishFailed(ScreenKind),
}

/// Runs one transition and publishes the resulting screen to the acting user.
pub async fn handle_action(ctx: &HomeContext, action: InboundAction) -> HandleOutcome {
    let actor = action.actor.clone();
    let trigger = action.trigger;

    let screen = match next_screen(ctx, &action).await {
        Ok(screen) => screen,
        Err(NavigationError::MissingSelection) => {
            warn!(%actor, "user selection fired without a selected user; re-rendering picker");
            HomeScreen::AdminTargetChoice
        }
        Err(err @ NavigationError::MalformedInput(_)) => {
            if ctx.contract_policy == ContractPolicy::Panic {
                panic!("contract violation while handling {trigger:?} for {actor}: {err}");
            }
            error!(%actor, ?trigger, error = %err, "screen state is missing form inputs; ignoring action");
            return HandleOutcome::Skipped(err);
        }
        Err(err) => {
            warn!(%actor, ?trigger, error = %err, "action handling failed; leaving screen unchanged");
            return HandleOutcome::Skipped(err);
        }
    };

    let kind = screen.kind();
    let view = screen.render();
    match ctx.publisher.publish(&actor, &view).await {
        Ok(()) => {
            info!(%actor, ?trigger, screen = ?kind, "home view updated");
            HandleOutcome::Published(kind)
        }
        Err(err) => {
            error!(%actor, ?trigger, screen = ?kind, error = %err, "failed to publish home view");
            HandleOutcome::PublishFailed(kind)
        }
    }
}

/// The transition table: which screen follows `action`, with whatever reads
/// and writes it implies.
pub async fn next_screen(
    ctx: &HomeContext,
    action: &InboundAction,
) -> Result<HomeScreen, NavigationError> {
    match action.trigger {
        Trigger::SurfaceOpened | Trigger::NavHome => {
            let actor = resolve_user(ctx, &action.actor).await?;
            Ok(HomeScreen::root(actor, &ctx.roles))
        }
        Trigger::SelectedUser => {
            let selected =
                form::selected_user(&action.widget_state).ok_or(NavigationError::MissingSelection)?;
            let target = resolve_user(ctx, &selected).await?;
            debug!(actor = %action.actor, target = %target.id, "acting on behalf of selected user");
            Ok(HomeScreen::ActionChoice {
                target,
                delegated: true,
            })
        }
        Trigger::ViewRecords => {
            let target = resolve_user(ctx, &target_id(action)).await?;
            let records = fetch_records(ctx, &target).await?;
            Ok(HomeScreen::RecordList { target, records })
        }
        Trigger::AddRecord => {
            let target = resolve_user(ctx, &target_id(action)).await?;
            Ok(HomeScreen::RecordForm {
                target,
                draft: None,
                errors: Default::default(),
            })
        }
        Trigger::DeleteRecord => {
            let record_id = action
                .value
                .as_deref()
                .and_then(|raw| raw.parse::<RecordId>().ok())
                .ok_or_else(|| NavigationError::InvalidRecordId(action.value.clone()))?;
            let target = resolve_user(ctx, &target_id(action)).await?;
            ctx.records
                .delete_by_id(record_id)
                .await
                .map_err(NavigationError::Store)?;
            info!(actor = %action.actor, target = %target.id, %record_id, "deleted exercise record");
            let records = fetch_records(ctx, &target).await?;
            Ok(HomeScreen::RecordList { target, records })
        }
        Trigger::ExerciseSave => {
            let owner_id = target_id(action);
            let record = form::extract_record(&action.widget_state, &owner_id)?;
            let errors = form::validate(&record);
            let target = resolve_user(ctx, &owner_id).await?;
            if !errors.is_empty() {
                debug!(actor = %action.actor, weight = %record.weight, "rejected record with non-numeric weight");
                return Ok(HomeScreen::RecordForm {
                    target,
                    draft: Some(record),
                    errors,
                });
            }

            let saved = ctx
                .records
                .save(record)
                .await
                .map_err(NavigationError::Store)?;
            info!(
                actor = %action.actor,
                owner = %saved.owner_id,
                record_id = ?saved.id,
                name = %saved.name,
                "saved exercise record"
            );
            let records = fetch_records(ctx, &target).await?;
            Ok(HomeScreen::RecordList { target, records })
        }
    }
}

/// The user being acted upon, read from the incoming screen. Screens that
/// predate the metadata field fall back to the actor.
fn target_id(action: &InboundAction) -> UserId {
    NavigationContext::from_metadata(&action.metadata)
        .target
        .unwrap_or_else(|| {
            debug!(actor = %action.actor, "no target in screen metadata; acting on self");
            action.actor.clone()
        })
}

async fn resolve_user(ctx: &HomeContext, user_id: &UserId) -> Result<UserProfile, NavigationError> {
    ctx.directory
        .resolve(user_id)
        .await
        .map_err(NavigationError::Directory)?
        .ok_or_else(|| NavigationError::UnknownUser(user_id.clone()))
}

async fn fetch_records(
    ctx: &HomeContext,
    target: &UserProfile,
) -> Result<Vec<ExerciseRecord>, NavigationError> {
    ctx.records
        .find_all_by_owner(&target.id)
        .await
        .map_err(NavigationError::Store)
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
