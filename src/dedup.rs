// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEDUPLICAÇÃO POR URL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Um único conjunto de URLs vistas é compartilhado entre todos os grupos:
// a primeira ocorrência (na ordem dos grupos, depois na ordem interna)
// vence. Comparação exata, sem normalização de URL.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::HashSet;

use crate::types::QueryResult;

/// Remove registros cuja URL já apareceu em qualquer grupo anterior.
///
/// Grupos que ficam vazios são mantidos. Aplicar duas vezes não muda nada.
pub fn remove_duplicates(groups: Vec<QueryResult>) -> Vec<QueryResult> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut removed = 0usize;

    let deduped = groups
        .into_iter()
        .map(|mut group| {
            let before = group.results.len();
            group.results.retain(|record| seen.insert(record.url.clone()));
            removed += before - group.results.len();
            group
        })
        .collect();

    if removed > 0 {
        log::info!("🧹 {} registro(s) duplicado(s) removido(s)", removed);
    }
    deduped
}

/// Conta URLs repetidas entre todos os grupos
pub fn count_duplicates(groups: &[QueryResult]) -> usize {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flat_map(|g| &g.results)
        .filter(|r| !seen.insert(r.url.as_str()))
        .count()
}
