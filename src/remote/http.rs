use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::model::Item;
use crate::remote::{Directory, classify};

/// REST client for the component directory.
///
/// Every request carries `Authorization: Bearer <token>`. The token is held
/// only in memory and is redacted from `Debug` output.
pub struct HttpDirectory {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectory")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateComponent<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    project: &'a str,
    assignee_type: &'static str,
    is_assignee_type_valid: bool,
}

impl HttpDirectory {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("component-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MigrateError::Transport {
                status: None,
                message: format!("cannot build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the status with the full body text.
    fn send(&self, method: &str, path: &str, request: RequestBuilder) -> Result<(StatusCode, String)> {
        debug!(method, path, "request");
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
            .send()
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().map_err(transport)?;
        debug!(method, path, status = status.as_u16(), "response");
        Ok((status, body))
    }
}

fn transport(err: reqwest::Error) -> MigrateError {
    MigrateError::Transport {
        status: err.status().map(|s| s.as_u16()),
        message: err.without_url().to_string(),
    }
}

fn parse<T: serde::de::DeserializeOwned>(what: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| MigrateError::InvalidResponse(format!("{what}: {e}")))
}

impl Directory for HttpDirectory {
    fn project_exists(&self, project: &str) -> Result<()> {
        let path = format!("/project/{project}");
        let (status, body) = self.send("GET", &path, self.client.get(self.url(&path)))?;
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(classify(status.as_u16(), &body))
        }
    }

    fn list(&self, project: &str) -> Result<Vec<Item>> {
        let path = format!("/project/{project}/components");
        let (status, body) = self.send("GET", &path, self.client.get(self.url(&path)))?;
        if status != StatusCode::OK {
            return Err(classify(status.as_u16(), &body));
        }
        parse("component list", &body)
    }

    fn create(&self, project: &str, name: &str, description: Option<&str>) -> Result<Item> {
        let path = "/component";
        let payload = CreateComponent {
            name,
            description,
            project,
            assignee_type: "PROJECT_DEFAULT",
            is_assignee_type_valid: true,
        };
        let request = self.client.post(self.url(path)).json(&payload);
        let (status, body) = self.send("POST", path, request)?;
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(classify(status.as_u16(), &body));
        }
        // The component exists remotely at this point, so the failure text must say so.
        serde_json::from_str(&body).map_err(|e| {
            MigrateError::InvalidResponse(format!(
                "created (HTTP {}), but response unreadable: {e}",
                status.as_u16()
            ))
        })
    }
}
