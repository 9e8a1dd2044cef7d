// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FILTRO DE RELEVÂNCIA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::types::{QueryResult, Record};

/// Registro passa se o score for >= `threshold`. Sem score conta como 0.
pub fn is_relevant(record: &Record, threshold: u8) -> bool {
    record.score() >= threshold
}

/// Mantém apenas os registros relevantes, preservando a ordem.
///
/// Grupos que ficam vazios continuam na saída.
pub fn retain_relevant(groups: Vec<QueryResult>, threshold: u8) -> Vec<QueryResult> {
    let mut dropped = 0usize;
    let filtered = groups
        .into_iter()
        .map(|mut group| {
            let before = group.results.len();
            group.results.retain(|r| is_relevant(r, threshold));
            dropped += before - group.results.len();
            group
        })
        .collect();

    log::info!("🔎 Filtro (score >= {}): {} registro(s) descartado(s)", threshold, dropped);
    filtered
}
