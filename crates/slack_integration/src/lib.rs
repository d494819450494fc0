use async_trait::async_trait;
use shared::{
    domain::{UserId, UserProfile},
    protocol::HomeView,
};

pub mod signature;
pub mod web_api;

pub use signature::{SignatureError, SignatureVerifier};
pub use web_api::{SlackApiError, SlackClient};

/// Resolves workspace members to profiles. `Ok(None)` means the directory
/// answered but does not know the user.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, user_id: &UserId) -> anyhow::Result<Option<UserProfile>>;
}

/// Replaces the home tab of one user with the given view.
#[async_trait]
pub trait SurfacePublisher: Send + Sync {
    async fn publish(&self, user_id: &UserId, view: &HomeView) -> anyhow::Result<()>;
}
