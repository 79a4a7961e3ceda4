//! LLM API interaction with exponential backoff retry logic.
//!
//! This module provides a robust interface for communicating with an
//! OpenAI-compatible chat completions API. Responses are requested in
//! strict structured-output mode against a schema derived from the target
//! type, with automatic retry logic to handle transient failures gracefully.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`OpenAiAsk`]: Sends one chat completion request with a response schema
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! On top of that, [`ask_structured`] re-asks exactly once when a response
//! parses as truncated JSON, which is what hitting the completion token cap
//! looks like.

use crate::schema;
use crate::utils::{looks_truncated, truncate_for_log};
use anyhow::{Context, Result, anyhow};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use rand::{Rng, rng};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{error, info, instrument, warn};

/// Hard ceiling on a single completion call, over and above retries.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(120);

/// Build a chat completions client, optionally against a non-default base URL.
pub fn make_client(api_key: &str, api_base: Option<&str>) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    Client::with_config(config)
}

/// Everything fixed about one kind of ask: the model, the optional system
/// prompt, and the schema the response must satisfy. The per-article user
/// text is supplied at call time.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub model: String,
    pub system: Option<String>,
    pub schema_name: String,
    pub schema: serde_json::Value,
    pub max_completion_tokens: Option<u32>,
}

impl AskRequest {
    /// Create a request whose responses are validated against the schema
    /// derived from `T`.
    pub fn structured<T: JsonSchema>(model: &str, schema_name: &str) -> Self {
        Self {
            model: model.to_string(),
            system: None,
            schema_name: schema_name.to_string(),
            schema: schema::strict::<T>(),
            max_completion_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_completion_tokens(mut self, max: u32) -> Self {
        self.max_completion_tokens = Some(max);
        self
    }
}

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send text to an LLM and receive a response.
/// This abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response>;
}

/// One chat completion call in strict structured-output mode.
///
/// Borrows the shared client and the fixed request parameters; [`ask`]
/// supplies the user message. Returns the raw message content, which the
/// caller parses against the request's schema type.
///
/// [`ask`]: AskAsync::ask
pub struct OpenAiAsk<'a> {
    pub client: &'a Client<OpenAIConfig>,
    pub request: &'a AskRequest,
}

impl fmt::Debug for OpenAiAsk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAsk")
            .field("model", &self.request.model)
            .field("schema_name", &self.request.schema_name)
            .finish()
    }
}

impl AskAsync for OpenAiAsk<'_> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let t0 = Instant::now();

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        if let Some(system) = &self.request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(text.to_string())
                .build()?
                .into(),
        );

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.request.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: self.request.schema_name.clone(),
                    schema: Some(self.request.schema.clone()),
                    strict: Some(true),
                },
            });
        if let Some(max) = self.request.max_completion_tokens {
            builder.max_completion_tokens(max);
        }
        let chat_request = builder.build()?;

        let response = timeout(REQUEST_TIMEOUT, self.client.chat().create(chat_request))
            .await
            .map_err(|_| anyhow!("LLM request timed out after {:?}", REQUEST_TIMEOUT))?;

        let dt = t0.elapsed();
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed");
                return Err(e.into());
            }
        };

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(anyhow!("model returned an empty message"));
        }
        Ok(content)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// This decorator transparently adds retry logic with exponential backoff
/// and jitter to handle transient API failures. It's designed to be resilient
/// against rate limiting, network issues, and temporary server errors.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Call the LLM with exponential backoff retry logic, returning the raw
/// response content.
#[instrument(level = "info", skip_all, fields(model = %request.model, schema = %request.schema_name))]
pub async fn ask_with_backoff(
    client: &Client<OpenAIConfig>,
    request: &AskRequest,
    text: &str,
) -> Result<String> {
    let t0 = Instant::now();
    let api = RetryAsk::new(OpenAiAsk { client, request }, 5, StdDuration::from_secs(1));
    let res = api.ask(text).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u128,
            "ask_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "ask_with_backoff failed")
        }
    }
    res
}

/// Call the LLM and parse the structured response into `T`.
///
/// A response that fails to parse because the JSON ends mid-document usually
/// means the completion token cap cut it off; such responses get exactly one
/// fresh ask before the error is surfaced.
#[instrument(level = "info", skip_all, fields(model = %request.model, schema = %request.schema_name))]
pub async fn ask_structured<T: DeserializeOwned>(
    client: &Client<OpenAIConfig>,
    request: &AskRequest,
    text: &str,
) -> Result<T> {
    let raw = ask_with_backoff(client, request, text).await?;
    match serde_json::from_str::<T>(&raw) {
        Ok(parsed) => Ok(parsed),
        Err(e) if looks_truncated(&e) => {
            warn!(error = %e, raw = %truncate_for_log(&raw, 240), "response looks truncated; asking once more");
            let raw = ask_with_backoff(client, request, text).await?;
            serde_json::from_str::<T>(&raw).with_context(|| {
                format!("parsing re-asked response: {}", truncate_for_log(&raw, 240))
            })
        }
        Err(e) => Err(anyhow::Error::new(e))
            .with_context(|| format!("parsing model response: {}", truncate_for_log(&raw, 240))),
    }
}
