// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIMING UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para medir tempo de execução dos estágios do pipeline.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::time::Instant;

/// Timer para medir duração de operações
pub struct ActionTimer {
    start: Instant,
    action_name: String,
}

impl ActionTimer {
    /// Inicia um novo timer para uma ação
    pub fn start(action_name: &str) -> Self {
        Self {
            start: Instant::now(),
            action_name: action_name.to_string(),
        }
    }

    /// Retorna o tempo decorrido em milissegundos
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Para o timer e loga o tempo decorrido
    pub fn stop_and_log(self) -> u128 {
        let elapsed = self.elapsed_ms();
        log::info!("⏱️  {} completado em {}ms", self.action_name, elapsed);
        elapsed
    }
}

/// Tempo gasto em cada estágio de uma execução
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    /// Fan-out das queries de busca (ms)
    pub search_ms: u128,
    /// Scoring em batches (ms)
    pub scoring_ms: u128,
    /// Filtragem + deduplicação (ms)
    pub postprocess_ms: u128,
    /// Escrita dos arquivos (ms)
    pub export_ms: u128,
}

impl StageTimings {
    /// Tempo total somado
    pub fn total_ms(&self) -> u128 {
        self.search_ms + self.scoring_ms + self.postprocess_ms + self.export_ms
    }

    /// Formata um resumo das estatísticas
    pub fn summary(&self) -> String {
        format!(
            "Timing Stats:\n\
             - Search: {}ms\n\
             - Scoring: {}ms\n\
             - Filter/Dedup: {}ms\n\
             - Export: {}ms\n\
             - Total: {}ms",
            self.search_ms,
            self.scoring_ms,
            self.postprocess_ms,
            self.export_ms,
            self.total_ms()
        )
    }
}
