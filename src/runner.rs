// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EXECUÇÃO CONCORRENTE DE QUERIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Fan-out das queries num pool limitado:
//
//   queries ──► buffer_unordered(pool_size) ──► normalize ──► QueryResult
//                     │
//                     └─ retry por query; esgotou → grupo vazio
//
// A saída segue a ordem de conclusão. Grupos vazios são descartados.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::normalize::normalize_hits;
use crate::search::SearchClient;
use crate::types::{DateWindow, QueryResult};
use crate::utils::{retry_with_backoff, RetryPolicy};

/// Contadores de uma rodada de buscas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerReport {
    /// Queries submetidas
    pub submitted: usize,
    /// Queries com pelo menos um resultado
    pub successful: usize,
    /// Queries sem resultados (erro definitivo ou busca vazia)
    pub failed: usize,
}

/// Executa queries de busca com concorrência limitada
pub struct QueryRunner {
    client: Arc<dyn SearchClient>,
    pool_size: usize,
    retry: RetryPolicy,
    max_summary_length: usize,
}

impl QueryRunner {
    /// Cria runner a partir da configuração do pipeline
    pub fn new(client: Arc<dyn SearchClient>, config: &PipelineConfig) -> Self {
        Self {
            client,
            pool_size: config.pool_size.max(1),
            retry: config.search_retry.clone(),
            max_summary_length: config.max_summary_length,
        }
    }

    /// Executa uma query com retry; falha definitiva vira grupo vazio
    pub async fn execute_query(&self, query: &str, window: &DateWindow, cap: usize) -> QueryResult {
        let label = format!("busca \"{}\"", query);
        let response = retry_with_backoff(&self.retry, &label, |_attempt| {
            self.client.search(query, window, cap)
        })
        .await;

        match response {
            Ok(hits) => {
                let result = normalize_hits(query, hits, self.max_summary_length);
                if result.is_empty() {
                    log::warn!("⚠️  Query sem resultados: {}", query);
                } else {
                    log::info!("✅ Query processada: {} ({} resultados)", query, result.len());
                }
                result
            }
            Err(e) => {
                log::error!("❌ Erro na query '{}': {}", query, e);
                QueryResult::empty(query)
            }
        }
    }

    /// Executa todas as queries com no máximo `pool_size` em voo.
    ///
    /// Retorna apenas os grupos não vazios, na ordem em que terminaram.
    pub async fn run(
        &self,
        queries: &[String],
        window: &DateWindow,
        cap: usize,
    ) -> (Vec<QueryResult>, RunnerReport) {
        log::info!(
            "🚀 Executando {} queries (pool de {})",
            queries.len(),
            self.pool_size
        );

        let groups: Vec<QueryResult> = stream::iter(queries)
            .map(|query| self.execute_query(query, window, cap))
            .buffer_unordered(self.pool_size)
            .filter(|group| futures::future::ready(!group.is_empty()))
            .collect()
            .await;

        let report = RunnerReport {
            submitted: queries.len(),
            successful: groups.len(),
            failed: queries.len() - groups.len(),
        };

        log::info!(
            "📊 Queries: {} com sucesso, {} falharam (de {})",
            report.successful,
            report.failed,
            report.submitted
        );

        (groups, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{MockSearchClient, SearchError};
    use crate::types::RawHit;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    mockall::mock! {
        Searcher {}

        #[async_trait]
        impl SearchClient for Searcher {
            async fn search(
                &self,
                query: &str,
                window: &DateWindow,
                max_results: usize,
            ) -> Result<Vec<RawHit>, SearchError>;
        }
    }

    fn config(pool_size: usize) -> PipelineConfig {
        PipelineConfig {
            pool_size,
            search_retry: RetryPolicy::immediate(3),
            ..PipelineConfig::default()
        }
    }

    fn window() -> DateWindow {
        DateWindow::last_days(30)
    }

    fn queries(list: &[&str]) -> Vec<String> {
        list.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_run_counts_empty_and_errored_queries_as_failed() {
        let client = MockSearchClient::new()
            .with_hits("q1", vec![RawHit::new("A", "https://a.org", "text")])
            .with_hits("q2", Vec::new())
            .with_error("q3", SearchError::HttpStatus { status: 401, body: "no".into() });
        let runner = QueryRunner::new(Arc::new(client), &config(5));

        let (groups, report) = runner.run(&queries(&["q1", "q2", "q3"]), &window(), 10).await;

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].query, "q1");
        assert_eq!(
            report,
            RunnerReport {
                submitted: 3,
                successful: 1,
                failed: 2
            }
        );
    }

    #[tokio::test]
    async fn test_zero_hit_query_is_failed_without_error() {
        let client = MockSearchClient::new()
            .with_hits("q1", vec![RawHit::new("A", "https://a.org", "text")])
            .with_hits("q2", Vec::new());
        let runner = QueryRunner::new(Arc::new(client), &config(2));

        let (groups, report) = runner.run(&queries(&["q1", "q2"]), &window(), 10).await;

        assert_eq!(groups.len(), 1);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.successful + report.failed, report.submitted);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let client = Arc::new(MockSearchClient::new().with_flaky(
            "q",
            2,
            SearchError::Timeout,
            vec![RawHit::new("A", "https://a.org", "text")],
        ));
        let runner = QueryRunner::new(client.clone(), &config(2));

        let result = runner.execute_query("q", &window(), 10).await;
        assert_eq!(result.len(), 1);
        assert_eq!(client.calls_for("q"), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_yield_empty_group() {
        let client = Arc::new(MockSearchClient::new().with_error("q", SearchError::RateLimitError));
        let runner = QueryRunner::new(client.clone(), &config(2));

        let result = runner.execute_query("q", &window(), 10).await;
        assert!(result.is_empty());
        assert_eq!(result.query, "q");
        assert_eq!(client.calls_for("q"), 3);
    }

    #[tokio::test]
    async fn test_results_are_normalized_and_capped() {
        let mut mock = MockSearcher::new();
        mock.expect_search()
            .withf(|query, _, max_results| query.to_string() == "events" && *max_results == 2)
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    RawHit {
                        title: None,
                        url: Some("https://a.org".into()),
                        text: None,
                    },
                    RawHit::new("B", "https://b.org", "body"),
                ])
            });
        let runner = QueryRunner::new(Arc::new(mock), &config(1));

        let (groups, _) = runner.run(&queries(&["events"]), &window(), 2).await;

        let records = &groups[0].results;
        assert_eq!(records[0].title, "No title available");
        assert_eq!(records[0].summary, "No summary available...");
        assert_eq!(records[1].summary, "body...");
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let mut mock = MockSearcher::new();
        mock.expect_search().times(1).returning(|_, _, _| {
            Err(SearchError::ParseError("unexpected body".into()))
        });
        let runner = QueryRunner::new(Arc::new(mock), &config(1));

        let (groups, report) = runner.run(&queries(&["q"]), &window(), 10).await;
        assert!(groups.is_empty());
        assert_eq!(report.failed, 1);
    }

    struct SlowClient {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SearchClient for SlowClient {
        async fn search(
            &self,
            query: &str,
            _window: &DateWindow,
            _max_results: usize,
        ) -> Result<Vec<RawHit>, SearchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![RawHit::new(query, &format!("https://x.org/{}", query), "t")])
        }
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let client = Arc::new(SlowClient {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let runner = QueryRunner::new(client.clone(), &config(3));
        let list: Vec<String> = (0..10).map(|i| format!("q{}", i)).collect();

        let (groups, report) = runner.run(&list, &window(), 10).await;

        assert_eq!(groups.len(), 10);
        assert_eq!(report.successful, 10);
        assert!(client.peak.load(Ordering::SeqCst) <= 3);
        assert!(client.peak.load(Ordering::SeqCst) >= 2);
    }
}
