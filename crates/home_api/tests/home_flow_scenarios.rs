use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use home_api::{
    form::{RecordField, WEIGHT_ERROR_MESSAGE},
    handle_action, ContractPolicy, HandleOutcome, HomeContext,
};
use shared::{
    domain::{RolePolicy, UserId, UserProfile},
    protocol::{Block, HomeView, InboundAction, Trigger, WidgetState, WidgetValue},
};
use slack_integration::{SurfacePublisher, UserDirectory};
use storage::{RecordStore, Storage};
use tokio::sync::Mutex;

struct Directory(HashMap<UserId, UserProfile>);

#[async_trait]
impl UserDirectory for Directory {
    async fn resolve(&self, user_id: &UserId) -> anyhow::Result<Option<UserProfile>> {
        Ok(self.0.get(user_id).cloned())
    }
}

#[derive(Default)]
struct Screen(Mutex<Option<(UserId, HomeView)>>);

#[async_trait]
impl SurfacePublisher for Screen {
    async fn publish(&self, user_id: &UserId, view: &HomeView) -> anyhow::Result<()> {
        *self.0.lock().await = Some((user_id.clone(), view.clone()));
        Ok(())
    }
}

struct App {
    ctx: HomeContext,
    storage: Storage,
    screen: Arc<Screen>,
}

impl App {
    async fn new() -> Self {
        let users = [("UA", "coach", true), ("UB", "lifter", false)]
            .into_iter()
            .map(|(id, name, is_admin)| {
                (
                    UserId::new(id),
                    UserProfile {
                        id: UserId::new(id),
                        display_name: name.to_string(),
                        is_admin,
                    },
                )
            })
            .collect();
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let screen = Arc::new(Screen::default());
        let ctx = HomeContext {
            records: Arc::new(storage.clone()),
            directory: Arc::new(Directory(users)),
            publisher: screen.clone(),
            roles: RolePolicy::default(),
            contract_policy: ContractPolicy::Panic,
        };
        Self {
            ctx,
            storage,
            screen,
        }
    }

    /// Sends `action` and returns the view the actor now sees.
    async fn send(&self, action: InboundAction) -> HomeView {
        let actor = action.actor.clone();
        let outcome = handle_action(&self.ctx, action).await;
        assert!(
            matches!(outcome, HandleOutcome::Published(_)),
            "unexpected outcome {outcome:?}"
        );
        let (to, view) = self.screen.0.lock().await.clone().expect("published view");
        assert_eq!(to, actor);
        view
    }
}

/// Builds the interaction a click on `view` would produce, the way the
/// platform echoes the screen's metadata back.
fn click(actor: &str, view: &HomeView, trigger: Trigger) -> InboundAction {
    InboundAction::interaction(UserId::new(actor), trigger, view.private_metadata.clone())
}

fn fill_form(values: [&str; 5]) -> WidgetState {
    RecordField::ALL
        .into_iter()
        .zip(values)
        .map(|(field, value)| {
            (
                field.block_id().to_string(),
                BTreeMap::from([(field.element_id().to_string(), WidgetValue::text(value))]),
            )
        })
        .collect()
}

fn section_texts(view: &HomeView) -> Vec<String> {
    view.blocks
        .iter()
        .filter_map(|block| match block {
            Block::Section { text, .. } => Some(text.text.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn admin_logs_a_lift_for_another_user() {
    let app = App::new().await;

    let view = app.send(InboundAction::surface_opened(UserId::new("UA"))).await;
    assert_eq!(view.private_metadata, "");

    let pick = click("UA", &view, Trigger::SelectedUser).with_widget_state(BTreeMap::from([(
        "user_selection".to_string(),
        BTreeMap::from([(
            "selected_user".to_string(),
            WidgetValue::user(UserId::new("UB")),
        )]),
    )]));
    let view = app.send(pick).await;
    assert_eq!(view.private_metadata, "UB");

    let view = app.send(click("UA", &view, Trigger::AddRecord)).await;
    assert_eq!(view.private_metadata, "UB");

    let save = click("UA", &view, Trigger::ExerciseSave)
        .with_widget_state(fill_form(["Bench Press", "Barbell", "3", "5", "135"]));
    let view = app.send(save).await;

    assert_eq!(view.private_metadata, "UB");
    assert!(section_texts(&view).contains(&"(Barbell) : 3 x 5 x 135lb".to_string()));

    let stored = app
        .storage
        .find_all_by_owner(&UserId::new("UB"))
        .await
        .expect("records");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Bench Press");
    assert!(app
        .storage
        .find_all_by_owner(&UserId::new("UA"))
        .await
        .expect("records")
        .is_empty());

    let view = app.send(click("UA", &view, Trigger::NavHome)).await;
    assert_eq!(view.private_metadata, "");
}

#[tokio::test]
async fn member_is_told_weight_must_be_a_number() {
    let app = App::new().await;

    let view = app.send(InboundAction::surface_opened(UserId::new("UB"))).await;
    assert_eq!(view.private_metadata, "UB");
    let view = app.send(click("UB", &view, Trigger::AddRecord)).await;

    let save = click("UB", &view, Trigger::ExerciseSave)
        .with_widget_state(fill_form(["Squat", "Rack", "5", "5", "abc"]));
    let view = app.send(save).await;

    let (_, label, _) = view
        .input_blocks()
        .find(|(block_id, _, _)| *block_id == RecordField::Weight.block_id())
        .expect("weight input");
    assert_eq!(label.text, WEIGHT_ERROR_MESSAGE);
    assert_eq!(view.private_metadata, "UB");
    assert!(app
        .storage
        .find_all_by_owner(&UserId::new("UB"))
        .await
        .expect("records")
        .is_empty());

    let view = app.send(click("UB", &view, Trigger::NavHome)).await;
    let view = app.send(click("UB", &view, Trigger::ViewRecords)).await;
    assert!(section_texts(&view).contains(&"_No records yet._".to_string()));
}
