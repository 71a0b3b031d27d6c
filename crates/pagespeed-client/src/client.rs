//! HTTP client for the `PageSpeed` Insights `runPagespeed` endpoint.
//!
//! Wraps a single `reqwest::Client` so every fetch in a batch shares one
//! connection pool. The client holds no mutable state and is safe to call
//! concurrently for any number of targets.

use std::time::Duration;

use pagespeed_core::{AppConfig, Category, PageSpeedResult, Strategy, Target};
use reqwest::{Client, StatusCode, Url};

use crate::error::ClientError;
use crate::types::PageSpeedResponse;

/// Client for the `PageSpeed` Insights API.
///
/// Use [`PageSpeedClient::from_config`] in the binary or
/// [`PageSpeedClient::with_base_url`] to point at a mock server in tests.
pub struct PageSpeedClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl PageSpeedClient {
    /// Creates a client from the resolved application config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `api_url` does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_key,
            &config.api_url,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client against an explicit endpoint URL.
    ///
    /// A `timeout_secs` of `0` leaves requests without a total timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent);
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build()?;

        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Runs a Lighthouse audit for one target and flattens the report.
    ///
    /// Any status other than `200 OK` is not an error: the status and body are
    /// logged and the returned record has every metric absent. Missing keys in
    /// a `200` report leave the corresponding fields `None`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on connection failure, timeout, or body read failure.
    /// - [`ClientError::Deserialize`] if a `200` body is not the expected JSON shape.
    pub async fn fetch(
        &self,
        target: &Target,
        strategy: Strategy,
    ) -> Result<PageSpeedResult, ClientError> {
        tracing::info!(
            target_id = target.id,
            url = %target.url,
            %strategy,
            "fetching PageSpeed data"
        );

        let url = self.build_url(&target.url, strategy);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let detail = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<unreadable body: {e}>"),
            };
            tracing::warn!(
                target_id = target.id,
                url = %target.url,
                status = status.as_u16(),
                detail = %detail,
                "failed to fetch PageSpeed data"
            );
            return Ok(PageSpeedResult::empty(target, strategy));
        }

        let body = response.text().await?;
        let parsed: PageSpeedResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: format!("runPagespeed(id={}, url={})", target.id, target.url),
                source: e,
            })?;
        let result = parsed.into_result(target, strategy);

        tracing::info!(
            target_id = target.id,
            url = %target.url,
            performance = ?result.performance,
            accessibility = ?result.accessibility,
            seo = ?result.seo,
            "fetched PageSpeed data"
        );

        Ok(result)
    }

    /// Builds the request URL: `url`, `key`, `strategy`, then one `category`
    /// pair per requested category.
    fn build_url(&self, target_url: &str, strategy: Strategy) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("url", target_url);
            pairs.append_pair("key", &self.api_key);
            pairs.append_pair("strategy", strategy.as_str());
            for category in Category::ALL {
                pairs.append_pair("category", category.api_name());
            }
        }
        url
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
