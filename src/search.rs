// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE BUSCA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para a API de busca web.
// Implementação real: Exa (busca neural com conteúdo da página).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::types::{DateWindow, RawHit};
use crate::utils::Transient;

/// Erros do cliente de busca
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("Search API error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitError,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response format: {0}")]
    ParseError(String),
}

impl Transient for SearchError {
    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitError | Self::Timeout | Self::NetworkError(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::ParseError(_) => false,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}

/// Trait principal para clientes de busca
///
/// Dada uma query e uma janela de datas de publicação, retorna os hits
/// brutos na ordem da fonte.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Executa uma única busca
    async fn search(
        &self,
        query: &str,
        window: &DateWindow,
        max_results: usize,
    ) -> Result<Vec<RawHit>, SearchError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resposta roteirizada de uma query no mock
#[derive(Debug, Clone)]
struct Scripted {
    failures_before_success: usize,
    failure: SearchError,
    hits: Vec<RawHit>,
}

/// Cliente mock para testes: respostas roteirizadas por query.
///
/// Queries sem roteiro retornam lista vazia.
#[derive(Debug, Default)]
pub struct MockSearchClient {
    scripts: HashMap<String, Scripted>,
    attempts: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
}

impl MockSearchClient {
    /// Mock sem nenhum roteiro
    pub fn new() -> Self {
        Self::default()
    }

    /// A query retorna `hits`
    pub fn with_hits(mut self, query: &str, hits: Vec<RawHit>) -> Self {
        self.scripts.insert(
            query.to_string(),
            Scripted {
                failures_before_success: 0,
                failure: SearchError::Timeout,
                hits,
            },
        );
        self
    }

    /// A query falha sempre com `error`
    pub fn with_error(mut self, query: &str, error: SearchError) -> Self {
        self.scripts.insert(
            query.to_string(),
            Scripted {
                failures_before_success: usize::MAX,
                failure: error,
                hits: Vec::new(),
            },
        );
        self
    }

    /// A query falha `failures` vezes com `error` e depois retorna `hits`
    pub fn with_flaky(mut self, query: &str, failures: usize, error: SearchError, hits: Vec<RawHit>) -> Self {
        self.scripts.insert(
            query.to_string(),
            Scripted {
                failures_before_success: failures,
                failure: error,
                hits,
            },
        );
        self
    }

    /// Total de chamadas recebidas
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Chamadas recebidas para uma query
    pub fn calls_for(&self, query: &str) -> usize {
        self.attempts
            .lock()
            .map(|a| a.get(query).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(
        &self,
        query: &str,
        _window: &DateWindow,
        max_results: usize,
    ) -> Result<Vec<RawHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = match self.attempts.lock() {
            Ok(mut attempts) => {
                let counter = attempts.entry(query.to_string()).or_insert(0);
                *counter += 1;
                *counter
            }
            Err(_) => 1,
        };

        match self.scripts.get(query) {
            Some(script) if attempt <= script.failures_before_success => {
                Err(script.failure.clone())
            }
            Some(script) => Ok(script.hits.iter().take(max_results).cloned().collect()),
            None => Ok(Vec::new()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO EXA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Endpoint padrão da API Exa
pub const EXA_BASE_URL: &str = "https://api.exa.ai";

/// Cliente para a API de busca Exa
pub struct ExaClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: &'static str,
    use_autoprompt: bool,
    num_results: usize,
    start_published_date: String,
    end_published_date: String,
    contents: ExaContents,
}

#[derive(Serialize)]
struct ExaContents {
    text: bool,
}

#[derive(Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaHit>,
}

#[derive(Deserialize)]
struct ExaHit {
    title: Option<String>,
    url: Option<String>,
    text: Option<String>,
}

impl ExaClient {
    /// Cria um cliente com timeout de 60s
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: EXA_BASE_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Aponta o cliente para outro endpoint (proxy, testes)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchClient for ExaClient {
    async fn search(
        &self,
        query: &str,
        window: &DateWindow,
        max_results: usize,
    ) -> Result<Vec<RawHit>, SearchError> {
        let request = ExaSearchRequest {
            query,
            search_type: "neural",
            use_autoprompt: false,
            num_results: max_results,
            start_published_date: window.start_iso(),
            end_published_date: window.end_iso(),
            contents: ExaContents { text: true },
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimitError);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ExaSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        Ok(payload
            .results
            .into_iter()
            .map(|hit| RawHit {
                title: hit.title,
                url: hit.url,
                text: hit.text,
            })
            .collect())
    }
}
