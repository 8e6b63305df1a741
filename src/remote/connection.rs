use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value as JsonValue;

use crate::error::{decode_failure, transport_failure, StoreError, StoreResult};
use crate::remote::DEFAULT_DATABASE_ID;

const FIRESTORE_API_HOST: &str = "https://firestore.googleapis.com";
const FIRESTORE_API_VERSION: &str = "v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Thin wrapper over the HTTP client: resolves paths against the database
/// root, attaches the bearer token, and maps responses into the failure
/// taxonomy. Every request is bounded by a finite timeout; expiry surfaces
/// as `TransportFailure`.
#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    base_url: String,
}

#[derive(Clone, Debug)]
pub struct ConnectionBuilder {
    project_id: String,
    client: Option<Client>,
    emulator_host: Option<String>,
}

impl ConnectionBuilder {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            client: None,
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST").ok(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn build(self) -> StoreResult<Connection> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| transport_failure(err.to_string()))?,
        };
        let base_url = build_base_url(&self.project_id, self.emulator_host.as_deref());
        Ok(Connection { client, base_url })
    }
}

impl Connection {
    pub fn builder(project_id: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(project_id)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a request and decodes the JSON body of a 2xx response.
    ///
    /// Every non-2xx status, 404 included, carries the raw response body
    /// into `RemoteRejected`.
    pub async fn invoke_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&JsonValue>,
        token: &str,
    ) -> StoreResult<JsonValue> {
        let (status, text) = self.dispatch(method, path, query, body, token).await?;
        if status.is_success() {
            parse_success_body(&text)
        } else {
            Err(StoreError::RemoteRejected {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    /// Like [`Connection::invoke_json`], but maps a 404 response to `None`.
    pub async fn invoke_json_optional(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&JsonValue>,
        token: &str,
    ) -> StoreResult<Option<JsonValue>> {
        let (status, text) = self.dispatch(method, path, query, body, token).await?;
        if status.is_success() {
            parse_success_body(&text).map(Some)
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(StoreError::RemoteRejected {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&JsonValue>,
        token: &str,
    ) -> StoreResult<(StatusCode, String)> {
        let mut request = self.build_request(method.clone(), path, query, token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        log::debug!("{method} {path} -> {status}");

        Ok((status, text))
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
    ) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut builder = self.client.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder.header("Content-Type", "application/json")
    }
}

// A response arrived, so a garbled body is a decode problem rather than a
// transport one.
fn parse_success_body(text: &str) -> StoreResult<JsonValue> {
    if text.is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(text)
        .map_err(|err| decode_failure(format!("Unreadable response body: {err}")))
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        transport_failure(format!("Request timed out: {err}"))
    } else {
        transport_failure(err.to_string())
    }
}

fn build_base_url(project_id: &str, emulator_host: Option<&str>) -> String {
    match emulator_host {
        Some(host) => format!(
            "http://{host}/{FIRESTORE_API_VERSION}/projects/{project_id}/databases/{DEFAULT_DATABASE_ID}"
        ),
        None => format!(
            "{FIRESTORE_API_HOST}/{FIRESTORE_API_VERSION}/projects/{project_id}/databases/{DEFAULT_DATABASE_ID}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_production_base_url() {
        let url = build_base_url("demo-project", None);
        assert_eq!(
            url,
            "https://firestore.googleapis.com/v1/projects/demo-project/databases/(default)"
        );
    }

    #[test]
    fn emulator_host_switches_to_plain_http() {
        let url = build_base_url("demo-project", Some("localhost:8080"));
        assert_eq!(
            url,
            "http://localhost:8080/v1/projects/demo-project/databases/(default)"
        );
    }
}
