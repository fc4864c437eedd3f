//! Anthropic `ModelGateway` implementation.

use reqwest::header::{HeaderMap, HeaderValue};
use tooluse::error::GatewayError;
use tooluse::gateway::{GatewayMetadata, ModelGateway, ModelTurn, TurnRequest};
use tracing::{debug, instrument};

use crate::config::AnthropicConfig;
use crate::convert;

/// Anthropic Claude gateway implementing [`ModelGateway`].
///
/// Each [`send`](ModelGateway::send) is one non-streaming call to the
/// Messages API. The gateway never retries: a failed call surfaces as a
/// [`GatewayError`] and the caller decides what to do.
///
/// # Example
///
/// ```rust,no_run
/// use tooluse_anthropic::{AnthropicConfig, AnthropicGateway};
///
/// # fn example() -> Result<(), tooluse::GatewayError> {
/// let gateway = AnthropicGateway::new(AnthropicConfig {
///     api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
///     ..Default::default()
/// })?;
/// # let _ = gateway;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AnthropicGateway {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicGateway {
    /// Creates a gateway from configuration.
    ///
    /// If `config.client` is `Some`, that client is reused for connection
    /// pooling. Otherwise a new client is built with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        let client = match config.client.clone() {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|e| GatewayError::Http {
                    status: None,
                    message: format!("failed to build HTTP client: {e}"),
                    retryable: false,
                })?
            }
        };
        Ok(Self { config, client })
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn default_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.config.api_key).map_err(|_| {
                GatewayError::Auth("API key contains invalid header characters".into())
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&self.config.api_version).map_err(|_| {
                GatewayError::InvalidRequest(
                    "API version contains invalid header characters".into(),
                )
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn messages_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/v1/messages")
    }

    /// Posts the turn and returns the raw response once the HTTP status
    /// has been checked.
    async fn send_request(
        &self,
        request: &TurnRequest<'_>,
    ) -> Result<reqwest::Response, GatewayError> {
        let body = convert::build_request(request, &self.config);
        let headers = self.default_headers()?;

        let response = self
            .client
            .post(self.messages_url())
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        elapsed_ms: self
                            .config
                            .timeout
                            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                    }
                } else {
                    GatewayError::Http {
                        status: e.status().map(|s| {
                            http::StatusCode::from_u16(s.as_u16())
                                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
                        }),
                        message: e.to_string(),
                        retryable: e.is_connect(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let http_status = http::StatusCode::from_u16(status.as_u16())
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
            return Err(convert::convert_error(http_status, &body));
        }

        Ok(response)
    }
}

impl ModelGateway for AnthropicGateway {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn send(&self, request: &TurnRequest<'_>) -> Result<ModelTurn, GatewayError> {
        let response = self.send_request(request).await?;

        let raw = response.text().await.map_err(|e| GatewayError::Http {
            status: None,
            message: format!("Failed to read Anthropic response: {e}"),
            retryable: false,
        })?;
        let turn = convert::parse_response(raw)?;
        debug!(
            stop_reason = turn.stop_reason.as_str(),
            blocks = turn.message.content.len(),
            "anthropic turn received"
        );
        Ok(turn)
    }

    fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            name: "anthropic".into(),
            model: self.config.model.clone(),
        }
    }
}
