//! Azure Resource Manager client implementation.
//!
//! This module provides the HTTP client for the ARM REST API, including
//! waiting for long-running operations. There is no retry: the first error
//! response aborts the call.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::SampleSettings;
use crate::error::{AzureError, Result, SampleError};

use super::auth::{AzureCredentials, ClientSecretCredential};
use super::types::{ArmErrorResponse, AsyncOperationStatus, is_success_state, is_terminal_state};

/// Timeout for ordinary requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for streamed responses. The read loop applies its own bound.
const STREAM_TIMEOUT: Duration = Duration::from_secs(3600);

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Header naming the async operation status URL.
const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Resource Manager client scoped to one subscription.
#[derive(Debug, Clone)]
pub struct ArmClient {
    /// HTTP client.
    client: Client,
    /// Token source.
    credential: ClientSecretCredential,
    /// Management endpoint without trailing slash.
    endpoint: String,
    /// Poll interval when the service sends no `Retry-After`.
    poll_interval: Duration,
    /// Maximum wait for a single long-running operation.
    operation_timeout: Duration,
}

impl ArmClient {
    /// Creates a client from credentials and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(credentials: AzureCredentials, settings: &SampleSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AzureError::network(format!("Failed to create HTTP client: {e}")))?;

        let credential =
            ClientSecretCredential::new(client.clone(), credentials, &settings.endpoints.authority);

        Ok(Self {
            client,
            credential,
            endpoint: settings.endpoints.management.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(settings.operations.poll_interval_secs),
            operation_timeout: Duration::from_secs(settings.operations.timeout_secs),
        })
    }

    /// Overrides the default poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Subscription the client is scoped to.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        self.credential.subscription_id()
    }

    /// Builds `/subscriptions/{id}{suffix}`.
    #[must_use]
    pub fn subscription_path(&self, suffix: &str) -> String {
        format!("/subscriptions/{}{suffix}", self.subscription_id())
    }

    /// Creates or replaces a resource and waits until it is provisioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the operation fails.
    pub async fn put_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self
            .send(Method::PUT, path, api_version, Some(body), REQUEST_TIMEOUT)
            .await?;
        let value = self.wait_for_completion(response, path, api_version).await?;
        serde_json::from_value(value)
            .map_err(|e| SampleError::Azure(AzureError::invalid_response(format!("{path}: {e}"))))
    }

    /// Reads a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be parsed.
    pub async fn get_resource<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T> {
        let response = self.send(Method::GET, path, api_version, None, REQUEST_TIMEOUT).await?;
        response.json().await.map_err(|e| {
            SampleError::Azure(AzureError::invalid_response(format!("{path}: {e}")))
        })
    }

    /// Deletes a resource and waits until it is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the operation fails.
    pub async fn delete_resource(&self, path: &str, api_version: &str) -> Result<()> {
        let response = self.send(Method::DELETE, path, api_version, None, REQUEST_TIMEOUT).await?;
        if response.status() == StatusCode::NO_CONTENT {
            debug!("{path} did not exist");
            return Ok(());
        }
        self.wait_for_operation(response, path).await?;
        Ok(())
    }

    /// Issues a POST and hands back the raw response for streaming. The body
    /// may stay open for as long as the caller keeps reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn post_for_stream(&self, path: &str, api_version: &str, body: &Value) -> Result<Response> {
        self.send(Method::POST, path, api_version, Some(body), STREAM_TIMEOUT)
            .await
    }

    /// Sends an authenticated request and maps error statuses.
    async fn send(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<Response> {
        let url = format!("{}{path}", self.endpoint);
        trace!("{method} {url}?api-version={api_version}");

        let mut request = self
            .authorized(self.client.request(method, &url))
            .await?
            .query(&[("api-version", api_version)])
            .timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AzureError::network(format!("Request to {path} failed: {e}")))?;

        Self::check_status(response, path).await
    }

    /// Attaches the bearer token.
    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.credential.token().await?;
        Ok(request.header(header::AUTHORIZATION, format!("Bearer {token}")))
    }

    /// Maps non-success statuses to errors.
    async fn check_status(response: Response, resource: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(SampleError::Azure(AzureError::ResourceNotFound {
                resource: resource.to_string(),
            }));
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = serde_json::from_str::<ArmErrorResponse>(&body)
            .map_or_else(|_| (String::from("Unknown"), body), |e| (e.error.code, e.error.message));

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SampleError::Azure(AzureError::authentication(format!(
                "{code}: {message}"
            ))));
        }

        Err(SampleError::Azure(AzureError::api_error(status.as_u16(), code, message)))
    }

    /// Waits for a PUT to finish and returns the final resource body.
    async fn wait_for_completion(&self, response: Response, path: &str, api_version: &str) -> Result<Value> {
        if header_url(&response, ASYNC_OPERATION_HEADER).is_some()
            || response.status() == StatusCode::ACCEPTED
        {
            self.wait_for_operation(response, path).await?;
            return self.get_resource(path, api_version).await;
        }

        let mut value: Value = response.json().await.unwrap_or(Value::Null);
        let started = Instant::now();

        while let Some(state) = provisioning_state(&value) {
            if is_terminal_state(&state) {
                if is_success_state(&state) {
                    break;
                }
                return Err(SampleError::Azure(AzureError::OperationFailed {
                    operation: format!("PUT {path}"),
                    status: state,
                }));
            }

            self.check_deadline(started, path)?;
            debug!("{path} is {state}, polling");
            tokio::time::sleep(self.poll_interval).await;
            value = self.get_resource(path, api_version).await?;
        }

        Ok(value)
    }

    /// Follows `Azure-AsyncOperation` or `Location` until the operation ends.
    async fn wait_for_operation(&self, response: Response, path: &str) -> Result<()> {
        let started = Instant::now();

        if let Some(status_url) = header_url(&response, ASYNC_OPERATION_HEADER) {
            let mut delay = retry_after(&response).unwrap_or(self.poll_interval);
            loop {
                self.check_deadline(started, path)?;
                tokio::time::sleep(delay).await;

                let poll = self.get_absolute(&status_url, path).await?;
                delay = retry_after(&poll).unwrap_or(self.poll_interval);
                let status: AsyncOperationStatus = poll.json().await.map_err(|e| {
                    AzureError::invalid_response(format!("operation status for {path}: {e}"))
                })?;

                if is_terminal_state(&status.status) {
                    if is_success_state(&status.status) {
                        return Ok(());
                    }
                    return Err(SampleError::Azure(AzureError::OperationFailed {
                        operation: path.to_string(),
                        status: status
                            .error
                            .map_or(status.status, |e| format!("{}: {}", e.code, e.message)),
                    }));
                }
                debug!("{path}: {}", status.status);
            }
        }

        if response.status() != StatusCode::ACCEPTED {
            return Ok(());
        }

        let Some(location) = header_url(&response, header::LOCATION.as_str()) else {
            return Ok(());
        };

        let mut delay = retry_after(&response).unwrap_or(self.poll_interval);
        loop {
            self.check_deadline(started, path)?;
            tokio::time::sleep(delay).await;

            let poll = match self.get_absolute(&location, path).await {
                Err(SampleError::Azure(AzureError::ResourceNotFound { .. })) => return Ok(()),
                other => other?,
            };
            if poll.status() != StatusCode::ACCEPTED {
                return Ok(());
            }
            delay = retry_after(&poll).unwrap_or(self.poll_interval);
            debug!("{path}: still in progress");
        }
    }

    /// GETs an absolute polling URL.
    async fn get_absolute(&self, url: &str, resource: &str) -> Result<Response> {
        let response = self
            .authorized(self.client.get(url))
            .await?
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AzureError::network(format!("Polling {resource} failed: {e}")))?;
        Self::check_status(response, resource).await
    }

    fn check_deadline(&self, started: Instant, path: &str) -> Result<()> {
        if started.elapsed() > self.operation_timeout {
            return Err(SampleError::Azure(AzureError::Timeout {
                operation: path.to_string(),
            }));
        }
        Ok(())
    }
}

/// Reads a header as a string.
fn header_url(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Parses `Retry-After` seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Extracts `properties.provisioningState`.
fn provisioning_state(value: &Value) -> Option<String> {
    value
        .get("properties")
        .and_then(|p| p.get("provisioningState"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
