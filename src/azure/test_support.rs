//! Shared fixtures for tests that talk to a mocked Resource Manager.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::SampleSettings;

use super::auth::AzureCredentials;
use super::client::ArmClient;

/// Builds a client whose management and authority endpoints point at
/// `server`, with a token endpoint already mounted.
pub(crate) async fn client_for(server: &MockServer) -> ArmClient {
    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "expires_in": 3600,
            "access_token": "token"
        })))
        .mount(server)
        .await;

    let mut settings = SampleSettings::default();
    settings.endpoints.management = server.uri();
    settings.endpoints.authority = server.uri();

    let credentials = AzureCredentials {
        client_id: String::from("client"),
        client_secret: String::from("secret"),
        tenant_id: String::from("tenant"),
        subscription_id: String::from("sub"),
    };

    ArmClient::new(credentials, &settings)
        .expect("client")
        .with_poll_interval(Duration::from_millis(10))
}
