// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GERADOR DE CONTEÚDO (NEWSLETTER + POST SOCIAL)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use super::airtable::CalendarEvent;
use crate::llm::{ChatMessage, LlmClient};

/// Texto usado quando não há eventos
pub const NO_EVENTS_TEXT: &str = "No events to display";
/// Texto usado quando a geração falha
pub const GENERATION_ERROR_TEXT: &str = "Error generating content";

/// Prompt de sistema compartilhado pelas duas gerações
pub const SYSTEM_PROMPT: &str = "You are a formatter for AI safety events. Your task is to generate two types of content:
1. A detailed newsletter post
2. A concise social media post

For both formats:
- Sort events chronologically
- Use consistent date formatting
- Ensure proper location formatting (city names, not countries)
- Format URLs as markdown links
- Maintain consistent spacing and structure
";

/// Estrutura da newsletter (`{YEAR}` e `{WEEK}` são substituídos)
pub const NEWSLETTER_PROMPT: &str = "Create a newsletter post with this structure:

# AI Safety Events and Training: {YEAR} Week {WEEK} update
[AISafety Events & Training Newsletter](https://www.aisafety.com/events-and-training)

This is a weekly newsletter listing newly announced AI safety events and training programs. Visit [AISafety.com/events-and-training](https://www.aisafety.com/events-and-training) for the full list of upcoming events and programs.

## Events
- [Event Name](URL) *Month DD* (Location).
  <-- Two spaces here for description indent -->Description goes here with two space indent.

## Training opportunities
- [Program Name](URL) *Month DD – Month DD* (Location).
  <-- Two spaces here for description indent -->Description goes here with two space indent.

Rules:
1. Dates use full month names (e.g., \"November\" not \"Nov\")
2. Date ranges use en dash (–) with spaces: \"Month DD – Month DD\"
3. Descriptions MUST be indented with two spaces on a new line
4. Locations end with period
5. Two blank lines between sections
6. Events must be sorted chronologically
7. No HTML comments in final output
";

/// Estrutura do post social (`{YEAR}` e `{WEEK}` são substituídos)
pub const SOCIAL_PROMPT: &str = "Create a social media post with this structure:

# AI Safety Events and Training: {YEAR} Week {WEEK} update
[AISafety Events & Training Newsletter](https://www.aisafety.com/events-and-training)

Events
- Event: MMM DD (City)
- Multi-day: MMM DD-DD (City)

Training opportunities
- Program: MMM DD-MMM DD (City)

Notes
• Visit [AISafety.com/events-and-training](https://www.aisafety.com/events-and-training)

Rules:
1. Use EXACTLY 3-letter capitalized months (e.g., \"NOV\" not \"November\")
2. Use hyphen WITHOUT spaces for date ranges (e.g., \"NOV 15-17\" not \"NOV 15 - 17\")
3. One blank line between sections (no double lines)
4. Use specific cities only, never countries (e.g., \"London\" not \"UK\")
5. Events must be sorted chronologically
6. Keep descriptions very brief - one line per event
";

/// Substitui `{YEAR}` e `{WEEK}` pela semana ISO da data
pub fn render_prompt(template: &str, date: NaiveDate) -> String {
    let week = date.iso_week();
    template
        .replace("{YEAR}", &week.year().to_string())
        .replace("{WEEK}", &week.week().to_string())
}

/// Serializa os eventos num formato de texto simples para o modelo
pub fn prepare_events_data(events: &[CalendarEvent]) -> String {
    events
        .iter()
        .map(|e| {
            let kind = if e.event_type.is_empty() {
                "Event".to_string()
            } else {
                e.event_type.join(", ")
            };
            format!(
                "Name: \"{}\"\nDates: \"{}\" to \"{}\"\nLocation: \"{}\"\nDescription: \"{}\"\nType: \"{}\"\nURL: \"{}\"",
                e.name, e.start_date, e.end_date, e.location, e.description, kind, e.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Os dois textos gerados numa execução
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    /// Post detalhado da newsletter
    pub newsletter: String,
    /// Post curto para redes sociais
    pub social: String,
}

impl GeneratedContent {
    fn uniform(text: &str) -> Self {
        Self {
            newsletter: text.to_string(),
            social: text.to_string(),
        }
    }
}

/// Gera newsletter e post social via LLM
pub struct ContentGenerator {
    oracle: Arc<dyn LlmClient>,
}

impl ContentGenerator {
    /// Gerador usando o cliente dado
    pub fn new(oracle: Arc<dyn LlmClient>) -> Self {
        Self { oracle }
    }

    /// Duas chamadas (newsletter, social) com o mesmo prompt de sistema.
    ///
    /// Qualquer falha substitui os dois textos por [`GENERATION_ERROR_TEXT`].
    pub async fn generate(&self, events: &[CalendarEvent], today: NaiveDate) -> GeneratedContent {
        if events.is_empty() {
            return GeneratedContent::uniform(NO_EVENTS_TEXT);
        }

        let events_data = prepare_events_data(events);
        let request = |template: &str| {
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "{}\n\nEvents:\n{}",
                    render_prompt(template, today),
                    events_data
                )),
            ]
        };

        let newsletter = match self.oracle.complete(&request(NEWSLETTER_PROMPT)).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("❌ Erro gerando conteúdo: {}", e);
                return GeneratedContent::uniform(GENERATION_ERROR_TEXT);
            }
        };

        match self.oracle.complete(&request(SOCIAL_PROMPT)).await {
            Ok(social) => GeneratedContent { newsletter, social },
            Err(e) => {
                log::error!("❌ Erro gerando conteúdo: {}", e);
                GeneratedContent::uniform(GENERATION_ERROR_TEXT)
            }
        }
    }
}
