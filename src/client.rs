use crate::error::PanelError;
use crate::model::{CommandResult, PanelConfig, StatusSnapshot, Verb};
use anyhow::{Context, Result};
use reqwest::Url;

/// HTTP client for the service manager's status and control API.
#[derive(Debug, Clone)]
pub struct ControlClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ControlClient {
    pub fn new(cfg: &PanelConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid base url {}", cfg.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!("base url {} cannot carry a path", cfg.base_url));
        }

        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Validated in `new`; a base URL always accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn status_url(&self) -> Url {
        self.url(&["status"])
    }

    pub fn command_url(&self, verb: Verb, service: &str) -> Url {
        self.url(&[verb.as_path(), service])
    }

    /// `GET /status`. Unreachable or non-2xx is `Fetch`, malformed JSON is `Parse`.
    pub async fn fetch_status(&self) -> Result<StatusSnapshot, PanelError> {
        let resp = self
            .http
            .get(self.status_url())
            .send()
            .await
            .map_err(|e| PanelError::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PanelError::Fetch(format!("status endpoint returned {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| PanelError::Fetch(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| PanelError::Parse(e.to_string()))
    }

    /// `GET /start/{name}` or `GET /stop/{name}`. Never fails: every outcome is a
    /// `CommandResult`.
    pub async fn send_command(&self, verb: Verb, service: &str) -> CommandResult {
        let resp = match self.http.get(self.command_url(verb, service)).send().await {
            Ok(r) => r,
            Err(e) => {
                return CommandResult::NetworkError {
                    message: e.to_string(),
                }
            }
        };

        let status = resp.status();
        if status.is_success() {
            return CommandResult::Success;
        }

        // Error bodies are plain text with a trailing newline.
        let body = resp.text().await.unwrap_or_default();
        CommandResult::Failure {
            http_status: status.as_u16(),
            body: body.trim_end().to_string(),
        }
    }
}
