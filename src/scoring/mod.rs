// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SCORING EM BATCHES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Achata todos os grupos num pool único, divide em batches fixos, faz uma
// chamada ao oráculo por batch e anexa (score, explicação) a cada Record.
// Falhas degradam para score 0; nada aqui aborta o pipeline.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse defensivo da resposta do oráculo.
pub mod parser;
/// Rubrica e montagem das mensagens de scoring.
pub mod prompts;

use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::llm::LlmClient;
use crate::types::{QueryResult, Record, ScoreLevel};

pub use parser::{parse_batch_reply, ParseFailure, ParsedScore};
pub use prompts::build_scoring_messages;

/// Explicação usada quando o item não pôde ser interpretado
pub const PARSE_FAILURE_EXPLANATION: &str = "Failed to parse score and explanation.";
/// Explicação usada quando a chamada do batch falhou
pub const BATCH_FAILURE_EXPLANATION: &str = "Error occurred during batch scoring.";
/// Explicação usada quando o oráculo devolveu texto vazio
pub const EMPTY_REPLY_EXPLANATION: &str = "Empty response from scoring oracle.";

/// Contadores de uma rodada de scoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringReport {
    /// Registros no pool
    pub records: usize,
    /// Chamadas ao oráculo (= batches)
    pub batches: usize,
    /// Batches cuja chamada falhou ou voltou vazia
    pub failed_batches: usize,
    /// Itens que caíram no fallback de parse
    pub parse_failures: usize,
}

/// Registro achatado com referência explícita ao grupo de origem
struct PooledRecord {
    group: usize,
    record: Record,
}

/// Scorer que agrupa registros em batches para o oráculo
pub struct BatchScorer {
    oracle: Arc<dyn LlmClient>,
    batch_size: usize,
    today: Option<NaiveDate>,
}

impl BatchScorer {
    /// Cria scorer com tamanho de batch explícito
    pub fn new(oracle: Arc<dyn LlmClient>, batch_size: usize) -> Self {
        Self {
            oracle,
            batch_size: batch_size.max(1),
            today: None,
        }
    }

    /// Cria scorer a partir da configuração do pipeline
    pub fn from_config(oracle: Arc<dyn LlmClient>, config: &PipelineConfig) -> Self {
        Self::new(oracle, config.batch_size)
    }

    /// Fixa a data usada no prompt
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Número de chamadas necessárias para `pool_size` registros
    pub fn batch_count(&self, pool_size: usize) -> usize {
        pool_size.div_ceil(self.batch_size)
    }

    /// Pontua todos os registros e os devolve aos seus grupos originais.
    ///
    /// A ordem dos grupos e a ordem interna de cada grupo são preservadas.
    /// Todo registro sai com score e explicação definidos.
    pub async fn score(&self, groups: Vec<QueryResult>) -> (Vec<QueryResult>, ScoringReport) {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());

        let mut queries = Vec::with_capacity(groups.len());
        let mut pool = Vec::new();
        for (group, query_result) in groups.into_iter().enumerate() {
            queries.push(query_result.query);
            pool.extend(
                query_result
                    .results
                    .into_iter()
                    .map(|record| PooledRecord { group, record }),
            );
        }

        let mut report = ScoringReport {
            records: pool.len(),
            ..Default::default()
        };

        log::info!(
            "🧮 Pontuando {} registros em {} batch(es) de até {}",
            pool.len(),
            self.batch_count(pool.len()),
            self.batch_size
        );

        for (batch_index, batch) in pool.chunks_mut(self.batch_size).enumerate() {
            report.batches += 1;
            self.score_batch(today, batch_index, batch, &mut report).await;
        }

        // Reagrupa pela referência de grupo, sem depender de tamanhos
        let mut regrouped: Vec<QueryResult> = queries.into_iter().map(QueryResult::empty).collect();
        for pooled in pool {
            regrouped[pooled.group].results.push(pooled.record);
        }

        (regrouped, report)
    }

    async fn score_batch(
        &self,
        today: NaiveDate,
        batch_index: usize,
        batch: &mut [PooledRecord],
        report: &mut ScoringReport,
    ) {
        let messages = {
            let records: Vec<&Record> = batch.iter().map(|p| &p.record).collect();
            build_scoring_messages(today, &records)
        };

        let reply = match self.oracle.complete(&messages).await {
            Ok(reply) if reply.trim().is_empty() => {
                log::warn!("⚠️  Batch {}: resposta vazia do oráculo", batch_index + 1);
                report.failed_batches += 1;
                fill_batch(batch, EMPTY_REPLY_EXPLANATION);
                return;
            }
            Ok(reply) => reply,
            Err(e) => {
                log::error!("❌ Erro no scoring do batch {}: {}", batch_index + 1, e);
                report.failed_batches += 1;
                fill_batch(batch, BATCH_FAILURE_EXPLANATION);
                return;
            }
        };

        let parsed = parse_batch_reply(&reply, batch.len());
        for (pooled, outcome) in batch.iter_mut().zip(parsed) {
            match outcome {
                Ok(ParsedScore { level, explanation }) => {
                    pooled.record.apply_score(level, explanation);
                }
                Err(failure) => {
                    log::warn!(
                        "⚠️  Falha ao interpretar score de \"{}\": {}",
                        pooled.record.title,
                        failure
                    );
                    report.parse_failures += 1;
                    pooled.record.apply_score(ScoreLevel::Irrelevant, PARSE_FAILURE_EXPLANATION);
                }
            }
        }
    }
}

fn fill_batch(batch: &mut [PooledRecord], explanation: &str) {
    for pooled in batch {
        pooled.record.apply_score(ScoreLevel::Irrelevant, explanation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};

    fn record(n: usize) -> Record {
        Record::new(format!("Event {}", n), format!("https://e.org/{}", n), "summary")
    }

    fn groups(sizes: &[usize]) -> Vec<QueryResult> {
        let mut n = 0;
        sizes
            .iter()
            .enumerate()
            .map(|(g, &size)| {
                let results = (0..size)
                    .map(|_| {
                        n += 1;
                        record(n)
                    })
                    .collect();
                QueryResult::new(format!("query {}", g), results)
            })
            .collect()
    }

    /// Resposta bem formada com o mesmo score para `count` itens
    fn scripted_reply(count: usize, score: u8) -> String {
        (1..=count)
            .map(|i| format!("Item {}:\nScore: {}\nExplanation: item {} explained.", i, score, i))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 15).unwrap()
    }

    #[tokio::test]
    async fn test_one_call_per_batch() {
        let oracle = Arc::new(MockLlmClient::from_fn(|messages| {
            let count = messages[1].content.matches(":\n{\"title\"").count();
            Ok(scripted_reply(count, 8))
        }));
        let scorer = BatchScorer::new(oracle.clone(), 10).with_today(today());

        let (scored, report) = scorer.score(groups(&[7, 9, 9])).await;

        assert_eq!(oracle.call_count(), 3);
        assert_eq!(report.batches, 3);
        assert_eq!(report.records, 25);
        assert_eq!(report.parse_failures, 0);
        assert!(scored.iter().flat_map(|g| &g.results).all(|r| r.score() == 8));
    }

    #[tokio::test]
    async fn test_regrouping_preserves_groups_and_order() {
        let oracle = Arc::new(MockLlmClient::from_fn(|messages| {
            let count = messages[1].content.matches(":\n{\"title\"").count();
            Ok(scripted_reply(count, 7))
        }));
        let scorer = BatchScorer::new(oracle, 4).with_today(today());

        let input = groups(&[3, 0, 5, 2]);
        let (scored, _) = scorer.score(input.clone()).await;

        assert_eq!(scored.len(), 4);
        for (before, after) in input.iter().zip(&scored) {
            assert_eq!(before.query, after.query);
            let urls_before: Vec<_> = before.results.iter().map(|r| &r.url).collect();
            let urls_after: Vec<_> = after.results.iter().map(|r| &r.url).collect();
            assert_eq!(urls_before, urls_after);
        }
    }

    #[tokio::test]
    async fn test_oracle_failure_degrades_batch_to_zero() {
        let oracle = Arc::new(MockLlmClient::with_script(vec![
            Err(LlmError::Timeout(30)),
            Ok(scripted_reply(2, 9)),
        ]));
        let scorer = BatchScorer::new(oracle, 3).with_today(today());

        let (scored, report) = scorer.score(groups(&[5])).await;
        let records = &scored[0].results;

        assert_eq!(report.failed_batches, 1);
        for r in &records[..3] {
            assert_eq!(r.ai_safety_score, Some(0));
            assert_eq!(r.score_explanation.as_deref(), Some(BATCH_FAILURE_EXPLANATION));
        }
        for r in &records[3..] {
            assert_eq!(r.ai_safety_score, Some(9));
        }
    }

    #[tokio::test]
    async fn test_empty_reply_degrades_batch() {
        let oracle = Arc::new(MockLlmClient::with_reply("   \n"));
        let scorer = BatchScorer::new(oracle, 10).with_today(today());

        let (scored, report) = scorer.score(groups(&[2])).await;
        assert_eq!(report.failed_batches, 1);
        assert!(scored[0].results.iter().all(|r| {
            r.score() == 0 && r.score_explanation.as_deref() == Some(EMPTY_REPLY_EXPLANATION)
        }));
    }

    #[tokio::test]
    async fn test_partial_reply_falls_back_per_item() {
        let oracle = Arc::new(MockLlmClient::with_reply(
            "Item 1:\nScore: 10\nExplanation: Great.\n\nItem 2:\nScore: maybe\nExplanation: ?",
        ));
        let scorer = BatchScorer::new(oracle, 10).with_today(today());

        let (scored, report) = scorer.score(groups(&[3])).await;
        let records = &scored[0].results;

        assert_eq!(records[0].score(), 10);
        assert_eq!(records[0].score_explanation.as_deref(), Some("Great."));
        assert_eq!(records[1].score(), 0);
        assert_eq!(records[1].score_explanation.as_deref(), Some(PARSE_FAILURE_EXPLANATION));
        assert_eq!(records[2].score(), 0);
        assert_eq!(report.parse_failures, 2);
        assert!(records.iter().all(Record::is_scored));
    }

    #[tokio::test]
    async fn test_prompt_contains_date_and_items() {
        let oracle = Arc::new(MockLlmClient::with_reply(&scripted_reply(2, 6)));
        let scorer = BatchScorer::new(oracle.clone(), 10).with_today(today());

        scorer.score(groups(&[2])).await;

        let requests = oracle.requests();
        assert_eq!(requests.len(), 1);
        let user = &requests[0][1].content;
        assert!(user.contains("Today's date: 2024-11-15"));
        assert!(user.contains("Item 1:\n{\"title\":\"Event 1\""));
        assert!(user.contains("Item 2:\n{\"title\":\"Event 2\""));
    }

    #[tokio::test]
    async fn test_empty_pool_makes_no_calls() {
        let oracle = Arc::new(MockLlmClient::new());
        let scorer = BatchScorer::new(oracle.clone(), 10);

        let (scored, report) = scorer.score(vec![QueryResult::empty("q")]).await;
        assert_eq!(oracle.call_count(), 0);
        assert_eq!(report.batches, 0);
        assert_eq!(scored, vec![QueryResult::empty("q")]);
    }

    #[test]
    fn test_batch_count() {
        let scorer = BatchScorer::new(Arc::new(MockLlmClient::new()), 10);
        assert_eq!(scorer.batch_count(0), 0);
        assert_eq!(scorer.batch_count(10), 1);
        assert_eq!(scorer.batch_count(11), 2);
        assert_eq!(BatchScorer::new(Arc::new(MockLlmClient::new()), 0).batch_count(3), 3);
    }
}
