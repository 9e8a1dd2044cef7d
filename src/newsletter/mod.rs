// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// NEWSLETTER SEMANAL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Variante semanal: lê eventos novos do calendário curado no Airtable e
// gera dois textos (newsletter e post social) para a semana ISO corrente.
//
//   Airtable ─► filtra (criados nos últimos N dias + Publish?) ─► LLM ─► output/
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente Airtable e seleção de eventos.
pub mod airtable;
/// Geração dos textos via LLM.
pub mod generator;

use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::NewsletterConfig;
use crate::llm::LlmClient;

pub use airtable::{AirtableClient, AirtableError, CalendarEvent, EventSource};
pub use generator::{ContentGenerator, GeneratedContent};

/// Semana ISO no formato `YYYYWww` (ex.: `2024W46`)
pub fn iso_week_str(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}W{:02}", week.year(), week.week())
}

/// Caminhos dos arquivos de uma semana
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterPaths {
    /// Newsletter detalhada
    pub newsletter: PathBuf,
    /// Post social
    pub social: PathBuf,
}

impl NewsletterPaths {
    /// `{dir}/newsletter_{semana}.md` e `{dir}/social_{semana}.md`
    pub fn for_week(dir: &Path, week: &str) -> Self {
        Self {
            newsletter: dir.join(format!("newsletter_{}.md", week)),
            social: dir.join(format!("social_{}.md", week)),
        }
    }
}

/// Escreve os dois textos. Falhas são logadas e retornam false.
pub fn write_outputs(dir: &Path, paths: &NewsletterPaths, content: &GeneratedContent) -> bool {
    let result = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&paths.newsletter, &content.newsletter))
        .and_then(|_| std::fs::write(&paths.social, &content.social));

    match result {
        Ok(()) => {
            log::info!(
                "💾 Conteúdo escrito em {} e {}",
                paths.newsletter.display(),
                paths.social.display()
            );
            true
        }
        Err(e) => {
            log::error!("❌ Erro escrevendo arquivos: {}", e);
            false
        }
    }
}

/// Resultado de uma execução do job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsletterOutcome {
    /// Nenhum evento novo; nada foi escrito
    NoEvents,
    /// Conteúdo gerado (e, se `written`, salvo em `paths`)
    Generated {
        /// Eventos usados
        events: usize,
        /// Arquivos de destino
        paths: NewsletterPaths,
        /// Escrita concluída
        written: bool,
    },
}

/// Job semanal: fonte de eventos + gerador + configuração
pub struct NewsletterJob {
    source: Arc<dyn EventSource>,
    generator: ContentGenerator,
    config: NewsletterConfig,
}

impl NewsletterJob {
    /// Monta o job
    pub fn new(source: Arc<dyn EventSource>, oracle: Arc<dyn LlmClient>, config: NewsletterConfig) -> Self {
        Self {
            source,
            generator: ContentGenerator::new(oracle),
            config,
        }
    }

    /// Executa o job para a data `today`
    pub async fn run(&self, today: NaiveDate) -> NewsletterOutcome {
        log::info!("📰 Newsletter da semana {}", iso_week_str(today));

        let events = self
            .source
            .recent_publishable_events(self.config.lookback_days, today)
            .await;

        if events.is_empty() {
            log::info!("Nenhum evento novo para publicar");
            return NewsletterOutcome::NoEvents;
        }
        log::info!("📅 {} evento(s) novo(s)", events.len());

        let content = self.generator.generate(&events, today).await;
        let paths = NewsletterPaths::for_week(&self.config.output_dir, &iso_week_str(today));
        let written = write_outputs(&self.config.output_dir, &paths, &content);

        NewsletterOutcome::Generated {
            events: events.len(),
            paths,
            written,
        }
    }
}
