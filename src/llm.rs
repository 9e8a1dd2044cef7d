// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE LLM (ORÁCULO DE SCORING)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para interação com modelos de linguagem.
// Provedores: OpenRouter (API compatível com OpenAI) e Anthropic.
// O decorator ResilientLlmClient aplica rate limit, timeout e retry.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{NewsletterConfig, PipelineConfig};
use crate::utils::{retry_with_backoff, RateLimiter, RetryPolicy, Transient};

/// Erros do cliente LLM
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitError,

    #[error("Invalid response format: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Empty response from model")]
    EmptyResponse,
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitError | Self::NetworkError(_) | Self::Timeout(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::ParseError(_) | Self::EmptyResponse => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(0)
        } else if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}

/// Mensagem no formato chat (role + content)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" ou "assistant"
    pub role: String,
    /// Conteúdo da mensagem
    pub content: String,
}

impl ChatMessage {
    /// Mensagem de sistema
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    /// Mensagem do usuário
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Trait principal para clientes LLM
///
/// Recebe uma lista ordenada de mensagens e devolve um único texto livre.
/// Nenhum schema é imposto à resposta: quem chama deve fazer parse defensivo.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Executa um completion
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Identificador do modelo usado
    fn model(&self) -> &str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DECORATOR: RATE LIMIT + TIMEOUT + RETRY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Envolve qualquer [`LlmClient`] com rate limit, timeout rígido e retry.
///
/// Cada tentativa passa pelo rate limiter antes de ir à rede, então
/// retries também contam para o limite de chamadas.
pub struct ResilientLlmClient {
    inner: Arc<dyn LlmClient>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ResilientLlmClient {
    /// Cria o decorator com os limites explícitos
    pub fn new(
        inner: Arc<dyn LlmClient>,
        limiter: RateLimiter,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            inner,
            limiter,
            retry,
            timeout,
        }
    }

    /// Cria o decorator a partir da configuração do pipeline
    pub fn from_config(inner: Arc<dyn LlmClient>, config: &PipelineConfig) -> Self {
        Self::new(
            inner,
            RateLimiter::new(config.rate_limit.max_calls, config.rate_limit.period()),
            config.oracle_retry.clone(),
            config.oracle_timeout(),
        )
    }

    /// Cria o decorator para o gerador da newsletter
    pub fn from_newsletter_config(inner: Arc<dyn LlmClient>, config: &NewsletterConfig) -> Self {
        Self::new(
            inner,
            RateLimiter::new(config.rate_limit.max_calls, config.rate_limit.period()),
            config.retry.clone(),
            config.timeout(),
        )
    }
}

#[async_trait]
impl LlmClient for ResilientLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let label = format!("LLM {}", self.inner.model());
        retry_with_backoff(&self.retry, &label, |_attempt| async move {
            self.limiter.acquire().await;
            match tokio::time::timeout(self.timeout, self.inner.complete(messages)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.timeout.as_secs())),
            }
        })
        .await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

type ReplyFn = dyn Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync;

/// Cliente mock para testes unitários.
///
/// Respostas roteirizadas são consumidas em ordem; depois delas, vale a
/// função de resposta (ou a resposta padrão).
pub struct MockLlmClient {
    scripted: Mutex<VecDeque<Result<String, LlmError>>>,
    reply_fn: Option<Box<ReplyFn>>,
    default_reply: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            reply_fn: None,
            default_reply: "Mock reply".to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockLlmClient {
    /// Mock que sempre responde "Mock reply"
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock que sempre responde `reply`
    pub fn with_reply(reply: &str) -> Self {
        Self {
            default_reply: reply.to_string(),
            ..Self::default()
        }
    }

    /// Mock que responde com as respostas dadas, em ordem
    pub fn with_script(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            scripted: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Mock que calcula a resposta a partir das mensagens
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            reply_fn: Some(Box::new(f)),
            ..Self::default()
        }
    }

    /// Atrasa cada resposta (para simular timeout)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Número de chamadas recebidas
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Mensagens recebidas em cada chamada
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.scripted.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(reply) = scripted {
            return reply;
        }

        match &self.reply_fn {
            Some(f) => f(messages),
            None => Ok(self.default_reply.clone()),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO OPENROUTER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Endpoint padrão do OpenRouter
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Cliente para OpenRouter (chat completions compatível com OpenAI)
pub struct OpenRouterClient {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    /// Cria cliente para o modelo dado
    pub fn new(api_key: String, model: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            max_tokens: None,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Limita o tamanho da resposta
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Aponta o cliente para outro endpoint compatível
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimitError);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("OpenRouter API error ({}): {}", status, body);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO ANTHROPIC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Endpoint da Messages API
pub const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Cliente para a Messages API da Anthropic.
///
/// Mensagens com role "system" viram o campo `system` da requisição.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// Cria cliente para o modelo dado
    pub fn new(api_key: String, model: &str, max_tokens: u32) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            max_tokens,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> AnthropicRequest<'a> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();

        AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            messages: messages.iter().filter(|m| m.role != "system").collect(),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = self.build_request(messages);

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimitError);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Anthropic API error ({}): {}", status, body);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let payload: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        payload
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
