// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PIPELINE DE BUSCA DE EVENTOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Orquestra uma execução completa:
//
//   queries ─► runner ─► scorer ─► filtro ─► dedup ─► dedup ─► export
//
// Cada estágio consome a saída completa do anterior. Nenhuma falha de
// busca, scoring ou escrita interrompe a execução; só o preflight é fatal.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::dedup::remove_duplicates;
use crate::export::{ExportReport, Exporter};
use crate::filter::retain_relevant;
use crate::llm::{ChatMessage, LlmClient, LlmError};
use crate::runner::{QueryRunner, RunnerReport};
use crate::scoring::{BatchScorer, ScoringReport};
use crate::search::{SearchClient, SearchError};
use crate::types::{DateWindow, QueryResult};
use crate::utils::{ActionTimer, StageTimings};

/// Query usada na verificação de conectividade da busca
pub const PREFLIGHT_QUERY: &str = "test";
/// Mensagem usada na verificação de conectividade do oráculo
pub const PREFLIGHT_PROMPT: &str = "Hello, this is a test.";

/// Erros fatais de setup
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Search API check failed: {0}")]
    SearchUnavailable(#[from] SearchError),

    #[error("Scoring oracle check failed: {0}")]
    OracleUnavailable(#[from] LlmError),
}

/// Resumo de uma execução
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Identificador da execução (aparece nos logs)
    pub run_id: Uuid,
    /// Contadores da fase de busca
    pub runner: RunnerReport,
    /// Contadores da fase de scoring
    pub scoring: ScoringReport,
    /// Registros que sobreviveram a filtro e dedup
    pub final_records: usize,
    /// Arquivos escritos (None quando a busca não trouxe nada)
    pub exported: Option<ExportReport>,
    /// Tempo por estágio
    pub timings: StageTimings,
}

/// Saída de uma execução: grupos finais + resumo
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Grupos filtrados e deduplicados (na ordem da busca)
    pub results: Vec<QueryResult>,
    /// Resumo da execução
    pub report: PipelineReport,
}

/// Pipeline completo de descoberta de eventos de AI safety
pub struct EventSearchPipeline {
    config: PipelineConfig,
    search: Arc<dyn SearchClient>,
    oracle: Arc<dyn LlmClient>,
    preflight_oracle: Arc<dyn LlmClient>,
}

impl EventSearchPipeline {
    /// Monta o pipeline com os clientes dados.
    ///
    /// O oráculo já deve vir com rate limit e retry aplicados
    /// (ver [`crate::llm::ResilientLlmClient`]).
    pub fn new(config: PipelineConfig, search: Arc<dyn SearchClient>, oracle: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            search,
            preflight_oracle: oracle.clone(),
            oracle,
        }
    }

    /// Cliente usado no preflight (padrão: o próprio oráculo de scoring).
    ///
    /// O binário passa o cliente cru: uma chamada, sem retry nem rate limit.
    pub fn with_preflight_oracle(mut self, oracle: Arc<dyn LlmClient>) -> Self {
        self.preflight_oracle = oracle;
        self
    }

    /// Configuração em uso
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Verifica que as duas APIs respondem antes de começar
    pub async fn preflight(&self) -> Result<(), PipelineError> {
        let window = DateWindow::last_days(self.config.days);

        self.search.search(PREFLIGHT_QUERY, &window, 1).await?;
        log::info!("✅ API de busca acessível");

        self.preflight_oracle
            .complete(&[ChatMessage::user(PREFLIGHT_PROMPT)])
            .await?;
        log::info!("✅ Oráculo de scoring acessível ({})", self.preflight_oracle.model());

        Ok(())
    }

    /// Executa o pipeline usando o horário atual
    pub async fn run(&self, queries: &[String]) -> PipelineOutcome {
        self.run_at(queries, Local::now()).await
    }

    /// Executa o pipeline para um instante fixo.
    ///
    /// O instante define a janela de busca, a data do prompt e o nome dos
    /// arquivos; mesma entrada + mesmo instante = mesmos bytes exportados.
    pub async fn run_at(&self, queries: &[String], timestamp: DateTime<Local>) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let mut timings = StageTimings::default();
        log::info!("🔍 Iniciando execução {} com {} queries", run_id, queries.len());

        let window = DateWindow::ending_at(timestamp.with_timezone(&Utc), self.config.days);
        log::info!("📅 Janela de busca: {} → {}", window.start_iso(), window.end_iso());

        // Busca
        let timer = ActionTimer::start("Busca");
        let runner = QueryRunner::new(self.search.clone(), &self.config);
        let (groups, runner_report) = runner.run(queries, &window, self.config.results_per_query).await;
        timings.search_ms = timer.stop_and_log();

        if groups.is_empty() {
            log::warn!("⚠️  Nenhum resultado encontrado para as queries");
            return PipelineOutcome {
                results: Vec::new(),
                report: PipelineReport {
                    run_id,
                    runner: runner_report,
                    scoring: ScoringReport::default(),
                    final_records: 0,
                    exported: None,
                    timings,
                },
            };
        }

        // Scoring
        let timer = ActionTimer::start("Scoring");
        let scorer = BatchScorer::from_config(self.oracle.clone(), &self.config)
            .with_today(timestamp.date_naive());
        let (scored, scoring_report) = scorer.score(groups).await;
        timings.scoring_ms = timer.stop_and_log();

        // Filtro + dedup (duas passadas)
        let timer = ActionTimer::start("Filtro e dedup");
        let relevant = retain_relevant(scored, self.config.relevance_threshold);
        let unique = remove_duplicates(remove_duplicates(relevant));
        timings.postprocess_ms = timer.stop_and_log();

        let final_records = unique.iter().map(QueryResult::len).sum();
        log::info!("📋 {} registro(s) relevante(s) após filtro e dedup", final_records);

        // Export
        let timer = ActionTimer::start("Export");
        let exported = Exporter::new(&self.config.results_dir).export(&unique, &timestamp);
        timings.export_ms = timer.stop_and_log();

        log::debug!("{}", timings.summary());
        log::info!("🏁 Execução {} concluída", run_id);

        PipelineOutcome {
            results: unique,
            report: PipelineReport {
                run_id,
                runner: runner_report,
                scoring: scoring_report,
                final_records,
                exported: Some(exported),
                timings,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLlmClient, ResilientLlmClient};
    use crate::search::MockSearchClient;
    use crate::types::RawHit;
    use crate::utils::{RateLimiter, RetryPolicy};
    use std::time::Duration;

    fn config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            results_dir: dir.to_path_buf(),
            search_retry: RetryPolicy::immediate(1),
            oracle_retry: RetryPolicy::immediate(1),
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_preflight_ok() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = EventSearchPipeline::new(
            config(dir.path()),
            Arc::new(MockSearchClient::new()),
            Arc::new(MockLlmClient::new()),
        );
        assert!(pipeline.preflight().await.is_ok());
    }

    #[tokio::test]
    async fn test_preflight_search_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let search = MockSearchClient::new().with_error(
            PREFLIGHT_QUERY,
            SearchError::HttpStatus {
                status: 401,
                body: "invalid key".into(),
            },
        );
        let oracle = Arc::new(MockLlmClient::new());
        let pipeline = EventSearchPipeline::new(config(dir.path()), Arc::new(search), oracle.clone());

        let err = pipeline.preflight().await.unwrap_err();
        assert!(matches!(err, PipelineError::SearchUnavailable(_)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_preflight_oracle_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = MockLlmClient::with_script(vec![Err(LlmError::ApiError {
            status: 401,
            body: "bad key".into(),
        })]);
        let pipeline = EventSearchPipeline::new(
            config(dir.path()),
            Arc::new(MockSearchClient::new()),
            Arc::new(oracle),
        );

        assert!(matches!(
            pipeline.preflight().await,
            Err(PipelineError::OracleUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_preflight_oracle_call_is_single_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let raw = Arc::new(MockLlmClient::with_script(vec![Err(LlmError::NetworkError(
            "connection refused".into(),
        ))]));
        let scoring = Arc::new(ResilientLlmClient::new(
            raw.clone(),
            RateLimiter::new(5, Duration::from_secs(60)),
            RetryPolicy::immediate(5),
            Duration::from_secs(5),
        ));
        let pipeline = EventSearchPipeline::new(config(dir.path()), Arc::new(MockSearchClient::new()), scoring)
            .with_preflight_oracle(raw.clone());

        assert!(matches!(
            pipeline.preflight().await,
            Err(PipelineError::OracleUnavailable(LlmError::NetworkError(_)))
        ));
        assert_eq!(raw.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_results_skips_scoring_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Arc::new(MockLlmClient::new());
        let pipeline = EventSearchPipeline::new(
            config(&dir.path().join("results")),
            Arc::new(MockSearchClient::new()),
            oracle.clone(),
        );

        let outcome = pipeline.run(&["nothing".to_string()]).await;
        assert!(outcome.results.is_empty());
        assert!(outcome.report.exported.is_none());
        assert_eq!(oracle.call_count(), 0);
        assert!(!dir.path().join("results").exists());
    }

    #[tokio::test]
    async fn test_run_filters_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let search = MockSearchClient::new().with_hits(
            "q",
            vec![
                RawHit::new("Keep", "https://keep.org", "event"),
                RawHit::new("Drop", "https://drop.org", "article"),
            ],
        );
        let oracle = MockLlmClient::with_reply(
            "Item 1:\nScore: 8\nExplanation: Upcoming.\n\nItem 2:\nScore: 0\nExplanation: Past.",
        );
        let pipeline = EventSearchPipeline::new(config(dir.path()), Arc::new(search), Arc::new(oracle));

        let outcome = pipeline.run(&["q".to_string()]).await;

        assert_eq!(outcome.report.final_records, 1);
        assert_eq!(outcome.results[0].results[0].title, "Keep");
        let exported = outcome.report.exported.unwrap();
        assert!(exported.is_complete());
        assert!(exported.paths.json.exists());
        assert!(exported.paths.markdown.exists());
    }
}
