use hrsaas_config::ApiSettings;
use hrsaas_model::{
    ApiResponse, Notification, NotificationSettings, Page, PushRegistration, PushSubscription,
};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::auth::TokenProvider;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("No access token available")]
    Unauthorized,
    #[error("Request rejected: {0}")]
    Envelope(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DismissedReport<'a> {
    notification_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResubscribeRequest<'a> {
    old_endpoint: Option<&'a str>,
    new_subscription: &'a PushSubscription,
}

#[derive(Debug, Serialize)]
struct BulkDeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BulkDeleteResult {
    deleted: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeRequest<'a> {
    subscription: &'a PushSubscription,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UnsubscribeRequest<'a> {
    endpoint: &'a str,
}

/// Client for the notification endpoints of the HR backend.
#[derive(Clone)]
pub struct NotificationApi {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl NotificationApi {
    const PREFIX: &'static str = "/api/v1/notifications";

    pub fn new(settings: &ApiSettings, tokens: Arc<dyn TokenProvider>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub async fn list(&self, page: u32, size: u32) -> ApiResult<Page<Notification>> {
        let request = self
            .request(Method::GET, "")?
            .query(&[("page", page), ("size", size)]);
        self.fetch(request).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Notification> {
        let path = format!("/{}", urlencoding::encode(id));
        self.fetch(self.request(Method::GET, &path)?).await
    }

    pub async fn unread_count(&self) -> ApiResult<usize> {
        let request = self.request(Method::GET, "/my/unread/count")?;
        let count: u64 = self.fetch(request).await?;
        Ok(count as usize)
    }

    pub async fn mark_read(&self, id: &str) -> ApiResult<()> {
        let path = format!("/{}/read", urlencoding::encode(id));
        self.execute(self.request(Method::POST, &path)?).await
    }

    pub async fn mark_all_read(&self) -> ApiResult<()> {
        self.execute(self.request(Method::PATCH, "/read-all")?).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let path = format!("/{}", urlencoding::encode(id));
        self.execute(self.request(Method::DELETE, &path)?).await
    }

    /// Deletes several notifications in one call and returns how many the
    /// backend removed.
    pub async fn bulk_delete(&self, ids: &[String]) -> ApiResult<u64> {
        let request = self
            .request(Method::POST, "/bulk-delete")?
            .json(&BulkDeleteRequest { ids });
        let result: BulkDeleteResult = self.fetch(request).await?;
        Ok(result.deleted)
    }

    pub async fn settings(&self) -> ApiResult<NotificationSettings> {
        self.fetch(self.request(Method::GET, "/settings")?).await
    }

    /// Saves the preferences and returns what the backend stored.
    pub async fn update_settings(
        &self,
        settings: &NotificationSettings,
    ) -> ApiResult<NotificationSettings> {
        let request = self.request(Method::PUT, "/settings")?.json(settings);
        self.fetch(request).await
    }

    /// Registers this browser's push endpoint for the signed-in user.
    pub async fn subscribe_push(
        &self,
        subscription: &PushSubscription,
        user_agent: Option<&str>,
    ) -> ApiResult<PushRegistration> {
        let request = self
            .request(Method::POST, "/push/subscribe")?
            .json(&SubscribeRequest {
                subscription,
                user_agent,
            });
        self.fetch(request).await
    }

    pub async fn unsubscribe_push(&self, endpoint: &str) -> ApiResult<()> {
        let request = self
            .request(Method::POST, "/push/unsubscribe")?
            .json(&UnsubscribeRequest { endpoint });
        self.execute(request).await
    }

    /// Dismissal telemetry. Sent without credentials when none are held.
    pub async fn report_dismissed(&self, notification_id: &str) -> ApiResult<()> {
        let request = self
            .request_optional_auth(Method::POST, "/analytics/dismissed")
            .json(&DismissedReport { notification_id });
        self.execute(request).await
    }

    /// Tells the backend the push endpoint for this browser changed.
    pub async fn resubscribe(
        &self,
        old_endpoint: Option<&str>,
        new_subscription: &PushSubscription,
    ) -> ApiResult<()> {
        let request = self
            .request_optional_auth(Method::POST, "/push/resubscribe")
            .json(&ResubscribeRequest {
                old_endpoint,
                new_subscription,
            });
        self.execute(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, Self::PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let token = self.tokens.access_token().ok_or(ApiError::Unauthorized)?;
        Ok(self.client.request(method, self.url(path)).bearer_auth(token))
    }

    fn request_optional_auth(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match self.tokens.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<()> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "Notification API call");
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "Notification API call");
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.success {
            return Err(ApiError::Envelope(
                envelope.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::Envelope("missing data".to_string()))
    }
}
