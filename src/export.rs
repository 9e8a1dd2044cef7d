// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EXPORTAÇÃO (JSON + MARKDOWN)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Dois artefatos por execução, nomeados pelo timestamp:
//   results/ai_safety_events_YYYYmmdd_HHMMSS.json   (agrupado por query)
//   results/ai_safety_events_YYYYmmdd_HHMMSS.md     (lista única, score desc)
//
// Falhas de escrita são logadas e engolidas: a execução termina mesmo assim.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{DateTime, TimeZone};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::types::{QueryResult, Record};
use crate::utils::escape_html;

/// Título do relatório Markdown
pub const REPORT_TITLE: &str = "# AI Safety Event Search Results";
/// Linha escrita quando não sobrou nenhum registro
pub const NO_RESULTS_LINE: &str = "No relevant AI safety events found.";

const FILE_PREFIX: &str = "ai_safety_events";

/// Erros de exportação
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Error writing {kind} file {path}: {source}")]
    Io {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error serializing results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Todos os registros num único vetor, ordenado por score decrescente.
///
/// A ordenação é estável: empates mantêm a ordem original (grupo, posição).
pub fn sorted_records(groups: &[QueryResult]) -> Vec<&Record> {
    let mut records: Vec<&Record> = groups.iter().flat_map(|g| &g.results).collect();
    records.sort_by(|a, b| b.score().cmp(&a.score()));
    records
}

/// JSON agrupado por query, indentação de 2 espaços, UTF-8 sem escapes
pub fn to_json(groups: &[QueryResult]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(groups)?)
}

/// Relatório Markdown com todo texto do usuário escapado
pub fn to_markdown(groups: &[QueryResult]) -> String {
    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push_str("\n\n");

    let records = sorted_records(groups);
    if records.is_empty() {
        out.push_str(NO_RESULTS_LINE);
        out.push('\n');
        return out;
    }

    for record in records {
        // write! numa String não falha
        let _ = writeln!(out, "## {} (Score: {})", escape_html(&record.title), record.score());
        let _ = writeln!(out, "- URL: {}", escape_html(&record.url));
        let _ = writeln!(out, "- Summary: {}", escape_html(&record.summary));
        let _ = writeln!(
            out,
            "- Explanation: {}\n",
            escape_html(record.score_explanation.as_deref().unwrap_or_default())
        );
    }
    out
}

/// Caminhos dos dois arquivos de uma execução
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// Arquivo JSON
    pub json: PathBuf,
    /// Arquivo Markdown
    pub markdown: PathBuf,
}

impl ExportPaths {
    /// Monta os nomes a partir do timestamp local da execução
    pub fn for_timestamp<Tz>(dir: &Path, timestamp: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let stamp = timestamp.format("%Y%m%d_%H%M%S").to_string();
        Self {
            json: dir.join(format!("{}_{}.json", FILE_PREFIX, stamp)),
            markdown: dir.join(format!("{}_{}.md", FILE_PREFIX, stamp)),
        }
    }
}

/// Resultado da exportação
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Caminhos calculados
    pub paths: ExportPaths,
    /// JSON escrito com sucesso
    pub json_written: bool,
    /// Markdown escrito com sucesso
    pub markdown_written: bool,
}

impl ExportReport {
    /// Os dois arquivos foram escritos
    pub fn is_complete(&self) -> bool {
        self.json_written && self.markdown_written
    }
}

/// Escreve os artefatos numa pasta de resultados
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    /// Exportador para a pasta dada
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Pasta de destino
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cria a pasta se necessário
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        if self.dir.is_dir() {
            log::info!("📁 Pasta de resultados já existe: {}", self.dir.display());
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        log::info!("📁 Pasta de resultados criada: {}", self.dir.display());
        Ok(())
    }

    /// Escreve JSON e Markdown. Nunca falha: erros viram log.
    pub fn export<Tz>(&self, groups: &[QueryResult], timestamp: &DateTime<Tz>) -> ExportReport
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if let Err(e) = self.ensure_dir() {
            log::error!("❌ Não foi possível criar {}: {}", self.dir.display(), e);
        }

        let paths = ExportPaths::for_timestamp(&self.dir, timestamp);

        let json_written = match write_json(&paths.json, groups) {
            Ok(()) => true,
            Err(e) => {
                log::error!("❌ {}", e);
                false
            }
        };
        let markdown_written = match write_markdown(&paths.markdown, groups) {
            Ok(()) => true,
            Err(e) => {
                log::error!("❌ {}", e);
                false
            }
        };

        if json_written && markdown_written {
            log::info!(
                "💾 Resultados exportados para {} e {}",
                paths.json.display(),
                paths.markdown.display()
            );
        }

        ExportReport {
            paths,
            json_written,
            markdown_written,
        }
    }
}

fn write_json(path: &Path, groups: &[QueryResult]) -> Result<(), ExportError> {
    let json = to_json(groups)?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        kind: "JSON",
        path: path.to_path_buf(),
        source,
    })
}

fn write_markdown(path: &Path, groups: &[QueryResult]) -> Result<(), ExportError> {
    std::fs::write(path, to_markdown(groups)).map_err(|source| ExportError::Io {
        kind: "Markdown",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreLevel;
    use chrono::{Local, Utc};

    fn scored(title: &str, url: &str, level: ScoreLevel) -> Record {
        let mut r = Record::new(title, url, format!("about {}", title));
        r.apply_score(level, format!("{} explained", title));
        r
    }

    #[test]
    fn test_sorted_records_is_stable_descending() {
        let groups = vec![
            QueryResult::new(
                "q1",
                vec![scored("7a", "u1", ScoreLevel::Seven), scored("9", "u2", ScoreLevel::Nine)],
            ),
            QueryResult::new(
                "q2",
                vec![scored("7b", "u3", ScoreLevel::Seven), scored("10", "u4", ScoreLevel::Ten)],
            ),
        ];

        let titles: Vec<_> = sorted_records(&groups).iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["10", "9", "7a", "7b"]);
    }

    #[test]
    fn test_markdown_layout() {
        let groups = vec![QueryResult::new("q", vec![scored("Workshop", "https://w.org", ScoreLevel::Eight)])];
        let md = to_markdown(&groups);

        let expected = "# AI Safety Event Search Results\n\n\
                        ## Workshop (Score: 8)\n\
                        - URL: https://w.org\n\
                        - Summary: about Workshop\n\
                        - Explanation: Workshop explained\n\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_markdown_escapes_user_text() {
        let mut r = Record::new("<script>x</script> & \"co\"", "https://a.org/?a=1&b=2", "it's");
        r.apply_score(ScoreLevel::Nine, "a < b");
        let md = to_markdown(&[QueryResult::new("q", vec![r])]);

        assert!(md.contains("## &lt;script&gt;x&lt;/script&gt; &amp; &quot;co&quot; (Score: 9)"));
        assert!(md.contains("- URL: https://a.org/?a=1&amp;b=2"));
        assert!(md.contains("- Summary: it&#x27;s"));
        assert!(md.contains("- Explanation: a &lt; b"));
        assert!(!md.contains("<script>"));
    }

    #[test]
    fn test_markdown_empty() {
        let md = to_markdown(&[QueryResult::empty("q")]);
        assert_eq!(md, "# AI Safety Event Search Results\n\nNo relevant AI safety events found.\n");
    }

    #[test]
    fn test_json_keeps_grouping_and_unicode() {
        let groups = vec![QueryResult::new("q", vec![scored("Café São Paulo", "u", ScoreLevel::Six)])];
        let json = to_json(&groups).unwrap();

        assert!(json.contains("Café São Paulo"));
        assert!(json.starts_with("[\n  {\n    \"query\": \"q\""));
        assert!(json.contains("\"ai_safety_score\": 6"));

        let back: Vec<QueryResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, groups);
    }

    #[test]
    fn test_export_paths_from_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 11, 15, 9, 5, 3).unwrap();
        let paths = ExportPaths::for_timestamp(Path::new("results"), &ts);
        assert_eq!(paths.json, PathBuf::from("results/ai_safety_events_20241115_090503.json"));
        assert_eq!(paths.markdown, PathBuf::from("results/ai_safety_events_20241115_090503.md"));
    }

    #[test]
    fn test_export_writes_both_files_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("nested"));
        let groups = vec![QueryResult::new("q", vec![scored("A", "u1", ScoreLevel::Ten)])];
        let ts = Local::now();

        let first = exporter.export(&groups, &ts);
        assert!(first.is_complete());
        let json_a = std::fs::read(&first.paths.json).unwrap();
        let md_a = std::fs::read(&first.paths.markdown).unwrap();

        let second = exporter.export(&groups, &ts);
        assert_eq!(first.paths, second.paths);
        assert_eq!(json_a, std::fs::read(&second.paths.json).unwrap());
        assert_eq!(md_a, std::fs::read(&second.paths.markdown).unwrap());
    }

    #[test]
    fn test_export_swallows_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let report = Exporter::new(&blocker).export(&[QueryResult::empty("q")], &Local::now());
        assert!(!report.json_written);
        assert!(!report.markdown_written);
    }
}
