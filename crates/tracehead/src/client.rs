use std::time::Duration;

use anyhow::Context;
use tracehead_core::ask::{AskRequest, AskResponse};

/// Something that can answer a question about a trace.
pub trait QuestionAnswerer {
    async fn ask(&self, request: &AskRequest) -> anyhow::Result<AskResponse>;
}

/// Posts questions as JSON to an HTTP answering endpoint.
pub struct HttpAnswerer {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpAnswerer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build ask http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl QuestionAnswerer for HttpAnswerer {
    async fn ask(&self, request: &AskRequest) -> anyhow::Result<AskResponse> {
        tracing::debug!(endpoint = %self.endpoint, hop = request.hop, "sending question");
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .with_context(|| format!("send question to {}", self.endpoint))?;

        if !response.status().is_success() {
            anyhow::bail!("ask request failed with status {}", response.status());
        }

        response
            .json::<AskResponse>()
            .await
            .context("decode ask response")
    }
}
