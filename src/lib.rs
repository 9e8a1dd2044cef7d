//! # AI Safety Events - Descoberta de eventos de AI safety
//!
//! Este crate encontra eventos futuros, programas de treinamento e chamadas
//! abertas ligados a AI safety, pontua cada candidato com um LLM e publica
//! os relevantes em JSON e Markdown.
//!
//! ## Fluxo de uma execução
//!
//! ```text
//! queries ─► busca (pool limitado) ─► normalização ─► scoring em batches
//!         ─► filtro (score >= 6) ─► dedup por URL ─► export JSON + Markdown
//! ```
//!
//! 1. **Busca** (`runner`): cada query vai à API de busca com retry e
//!    backoff; no máximo `pool_size` queries em voo.
//! 2. **Scoring** (`scoring`): todos os registros num pool único, batches
//!    de tamanho fixo, uma chamada ao oráculo por batch, parse defensivo
//!    da resposta em texto livre.
//! 3. **Pós-processamento** (`filter`, `dedup`): mantém score >= 6 e
//!    remove URLs repetidas (a primeira ocorrência vence).
//! 4. **Export** (`export`): JSON agrupado por query e relatório Markdown
//!    ordenado por score.
//!
//! Falhas de busca, scoring ou escrita degradam (grupo vazio, score 0,
//! log); só credenciais ausentes e o preflight são fatais.
//!
//! ## Variante semanal
//!
//! O módulo `newsletter` lê eventos curados de um calendário no Airtable
//! e gera a newsletter e o post social da semana ISO.
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use ai_safety_events::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PipelineConfig::default();
//!     let pipeline = EventSearchPipeline::new(config, search_client, oracle);
//!     pipeline.preflight().await.unwrap();
//!     let outcome = pipeline.run(&default_queries()).await;
//!     println!("{} eventos relevantes", outcome.report.final_records);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Tipos fundamentais compartilhados por todo o sistema.
///
/// - [`Record`]: Candidato a evento (título, URL, resumo, score)
/// - [`QueryResult`]: Registros retornados por uma query
/// - [`ScoreLevel`]: Níveis válidos de score (0, 6..=10)
/// - [`DateWindow`]: Janela de datas de publicação
pub mod types;

/// Configuração do pipeline, da newsletter e do runtime.
///
/// Valores padrão sobrescritos por variáveis de ambiente e pela CLI:
///
/// **Pipeline:**
/// - `SEARCH_DAYS`, `SEARCH_RESULTS`, `ORACLE_MODEL`
/// - `SCORING_BATCH_SIZE`, `QUERY_POOL_SIZE`, `RESULTS_FOLDER`
///
/// **Runtime Tokio:**
/// - `TOKIO_THREADS`: Número de threads do runtime (padrão: dinâmico)
/// - `TOKIO_MAX_THREADS`: Máximo de threads (padrão: 8)
///
/// **Credenciais:** `EXA_API_KEY`, `OPENROUTER_API_KEY` e, na newsletter,
/// `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID`, `CLAUDE_API_KEY`.
pub mod config;

/// Clientes para Large Language Models (LLMs).
///
/// Define a trait `LlmClient` e implementações para:
/// - OpenRouter (oráculo de scoring)
/// - Anthropic (gerador da newsletter)
/// - Mock para testes
///
/// `ResilientLlmClient` envolve qualquer cliente com rate limit,
/// timeout por chamada e retry.
pub mod llm;

/// Clientes para busca web.
///
/// Define a trait `SearchClient` e implementações para:
/// - Exa (busca neural com texto da página)
/// - Mock para testes
pub mod search;

/// Normalização de hits brutos em [`Record`].
pub mod normalize;

/// Queries padrão de eventos de AI safety.
pub mod queries;

/// Execução concorrente das queries com pool limitado.
pub mod runner;

/// Scoring em batches pelo oráculo e parse da resposta.
pub mod scoring;

/// Filtro por score mínimo.
pub mod filter;

/// Deduplicação global por URL.
pub mod dedup;

/// Export em JSON e Markdown.
pub mod export;

/// Orquestração de uma execução completa.
pub mod pipeline;

/// Job semanal de newsletter a partir do calendário no Airtable.
pub mod newsletter;

/// Utilitários diversos.
///
/// - Retry com backoff exponencial
/// - Rate limiting por janela deslizante
/// - Formatação de texto (truncagem, escape HTML)
/// - Timers de estágio
pub mod utils;

// Re-exports principais
pub use config::{create_tokio_runtime, load_runtime_config, PipelineConfig, RuntimeConfig};
pub use pipeline::{EventSearchPipeline, PipelineError, PipelineOutcome};
pub use types::*;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// Importar tudo de uma vez:
/// ```rust,ignore
/// use ai_safety_events::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Credentials, PipelineConfig};
    pub use crate::export::Exporter;
    pub use crate::llm::{ChatMessage, LlmClient, LlmError, ResilientLlmClient};
    pub use crate::pipeline::{EventSearchPipeline, PipelineError, PipelineOutcome, PipelineReport};
    pub use crate::queries::default_queries;
    pub use crate::scoring::BatchScorer;
    pub use crate::search::{SearchClient, SearchError};
    pub use crate::types::*;
}
