//! `Transport` backed by `ureq`.
//!
//! Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
//! responses come back as data and the client can classify them.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Largest response body read before giving up. ureq's default is 10 MB.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(request: &HttpRequest) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.timeout)
            .build()
            .new_agent()
    }
}

/// Response bodies are JSON text; anything else is undecodable, not a
/// transport failure.
fn body_text(bytes: Vec<u8>) -> Result<String, ApiError> {
    String::from_utf8(bytes)
        .map_err(|e| ApiError::DeserializationError(format!("response body is not UTF-8: {e}")))
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = Self::agent(&request);
        let url = request.url.as_str();
        let headers = request.headers.as_slice();

        tracing::debug!(method = request.method.as_str(), url, "executing request");

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(agent.put(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = body_text(bytes)?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}
