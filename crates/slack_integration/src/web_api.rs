use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{UserId, UserProfile},
    protocol::HomeView,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{SurfacePublisher, UserDirectory};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack method {method} failed: {error}")]
    Method { method: &'static str, error: String },
    #[error("slack method {method} returned ok without a user")]
    MissingUser { method: &'static str },
}

#[derive(Debug, Deserialize)]
struct UsersInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: UserId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    profile: Option<SlackUserProfile>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackUserProfile {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    real_name: Option<String>,
}

impl SlackUser {
    fn into_profile(self) -> UserProfile {
        let profile = self.profile.unwrap_or_default();
        let display_name = [profile.display_name, profile.real_name, self.real_name]
            .into_iter()
            .flatten()
            .map(|candidate| candidate.trim().to_string())
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(self.name);
        UserProfile {
            id: self.id,
            display_name,
            is_admin: self.is_admin,
        }
    }
}

#[derive(Debug, Serialize)]
struct ViewsPublishRequest<'a> {
    user_id: &'a UserId,
    view: &'a HomeView,
}

#[derive(Debug, Deserialize)]
struct ApiAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Minimal Web API client: `users.info` for the directory and
/// `views.publish` for the home tab.
#[derive(Clone)]
pub struct SlackClient {
    http: Client,
    api_base_url: String,
    bot_token: String,
}

impl SlackClient {
    pub fn with_base_url(api_base_url: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    pub async fn users_info(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        debug!(%user_id, "retrieving user with id");
        let body: UsersInfoResponse = self
            .http
            .get(format!("{}/users.info", self.api_base_url))
            .bearer_auth(&self.bot_token)
            .query(&[("user", user_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !body.ok {
            let error = body.error.unwrap_or_else(|| "unknown_error".to_string());
            if error == "user_not_found" {
                return Ok(None);
            }
            return Err(SlackApiError::Method {
                method: "users.info",
                error,
            }
            .into());
        }

        let user = body.user.ok_or(SlackApiError::MissingUser {
            method: "users.info",
        })?;
        Ok(Some(user.into_profile()))
    }

    pub async fn views_publish(&self, user_id: &UserId, view: &HomeView) -> Result<()> {
        let body: ApiAck = self
            .http
            .post(format!("{}/views.publish", self.api_base_url))
            .bearer_auth(&self.bot_token)
            .json(&ViewsPublishRequest { user_id, view })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !body.ok {
            return Err(SlackApiError::Method {
                method: "views.publish",
                error: body.error.unwrap_or_else(|| "unknown_error".to_string()),
            }
            .into());
        }
        info!(%user_id, blocks = view.blocks.len(), "published home view");
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SlackClient {
    async fn resolve(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        self.users_info(user_id).await
    }
}

#[async_trait]
impl SurfacePublisher for SlackClient {
    async fn publish(&self, user_id: &UserId, view: &HomeView) -> Result<()> {
        self.views_publish(user_id, view).await
    }
}

#[cfg(test)]
#[path = "tests/web_api_tests.rs"]
mod tests;
