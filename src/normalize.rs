// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// NORMALIZAÇÃO DE RESULTADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Converte hits brutos da API de busca no formato canônico de Record.
// Campos ausentes viram placeholders explícitos, nunca nulos.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::types::{QueryResult, RawHit, Record};
use crate::utils::truncate_with_ellipsis;

/// Placeholder para hits sem título
pub const NO_TITLE: &str = "No title available";
/// Placeholder para hits sem URL
pub const NO_URL: &str = "No URL available";
/// Placeholder para hits sem texto
pub const NO_SUMMARY: &str = "No summary available";

/// Normaliza um único hit.
///
/// O resumo é sempre truncado em `max_summary_length` caracteres e
/// recebe o marcador `...`.
pub fn normalize_hit(hit: RawHit, max_summary_length: usize) -> Record {
    let title = non_blank(hit.title).unwrap_or_else(|| NO_TITLE.to_string());
    let url = non_blank(hit.url).unwrap_or_else(|| NO_URL.to_string());
    let text = non_blank(hit.text).unwrap_or_else(|| NO_SUMMARY.to_string());

    Record::new(title, url, truncate_with_ellipsis(&text, max_summary_length))
}

/// Normaliza todos os hits de uma query, preservando a ordem da fonte
pub fn normalize_hits(query: &str, hits: Vec<RawHit>, max_summary_length: usize) -> QueryResult {
    let results = hits
        .into_iter()
        .map(|hit| normalize_hit(hit, max_summary_length))
        .collect();
    QueryResult::new(query, results)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_hit() {
        let record = normalize_hit(
            RawHit::new("AI Safety Camp", "https://aisafety.camp", "Apply by March 1."),
            500,
        );
        assert_eq!(record.title, "AI Safety Camp");
        assert_eq!(record.url, "https://aisafety.camp");
        assert_eq!(record.summary, "Apply by March 1....");
        assert!(record.ai_safety_score.is_none());
    }

    #[test]
    fn test_missing_fields_become_placeholders() {
        let record = normalize_hit(RawHit::default(), 500);
        assert_eq!(record.title, NO_TITLE);
        assert_eq!(record.url, NO_URL);
        assert_eq!(record.summary, format!("{}...", NO_SUMMARY));
    }

    #[test]
    fn test_blank_fields_become_placeholders() {
        let hit = RawHit {
            title: Some("   ".into()),
            url: Some(String::new()),
            text: Some("body".into()),
        };
        let record = normalize_hit(hit, 500);
        assert_eq!(record.title, NO_TITLE);
        assert_eq!(record.url, NO_URL);
        assert_eq!(record.summary, "body...");
    }

    #[test]
    fn test_summary_is_truncated() {
        let long = "x".repeat(1200);
        let record = normalize_hit(RawHit::new("t", "https://a.org", &long), 500);
        assert_eq!(record.summary.chars().count(), 503);
        assert!(record.summary.ends_with("..."));
    }

    #[test]
    fn test_normalize_hits_preserves_order() {
        let hits = vec![
            RawHit::new("first", "https://a.org/1", "a"),
            RawHit::new("second", "https://a.org/2", "b"),
            RawHit::new("third", "https://a.org/3", "c"),
        ];
        let group = normalize_hits("q", hits, 500);
        assert_eq!(group.query, "q");
        let titles: Vec<_> = group.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
