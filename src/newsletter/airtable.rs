// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE AIRTABLE (CALENDÁRIO DE EVENTOS)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Lê todos os registros da tabela do calendário (paginação por `offset`)
// e seleciona os publicáveis criados dentro da janela de lookback.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Endpoint padrão da API REST do Airtable
pub const AIRTABLE_BASE_URL: &str = "https://api.airtable.com/v0";

/// Nomes das colunas da tabela do calendário
pub mod columns {
    /// Nome do evento
    pub const NAME: &str = "Name";
    /// Data de criação (YYYY-MM-DD)
    pub const CREATED_DATE: &str = "Created date";
    /// Checkbox de publicação
    pub const PUBLISH: &str = "Publish?";
    /// Descrição
    pub const DESCRIPTION: &str = "Description";
    /// Data de início
    pub const START_DATE: &str = "Start date";
    /// Data de término
    pub const END_DATE: &str = "End date";
    /// Tipo (multi-select)
    pub const TYPE: &str = "Type";
    /// Local
    pub const LOCATION: &str = "Location";
    /// Link do evento
    pub const URL: &str = "URL";
}

/// Erros do cliente Airtable
#[derive(Debug, thiserror::Error)]
pub enum AirtableError {
    #[error("Airtable API error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response format: {0}")]
    ParseError(String),

    #[error("Invalid Airtable URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for AirtableError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}

/// Um evento do calendário. Campos ausentes viram string vazia.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Nome
    pub name: String,
    /// Data de criação (YYYY-MM-DD)
    pub created_date: String,
    /// Marcado para publicação
    pub publish: bool,
    /// Descrição
    pub description: String,
    /// Início
    pub start_date: String,
    /// Término
    pub end_date: String,
    /// Tipos (ex.: "Event", "Training")
    pub event_type: Vec<String>,
    /// Local
    pub location: String,
    /// Link
    pub url: String,
}

impl CalendarEvent {
    /// Constrói a partir do mapa `fields` de um registro
    pub fn from_fields(fields: &HashMap<String, Value>) -> Self {
        Self {
            name: field_text(fields, columns::NAME),
            created_date: field_text(fields, columns::CREATED_DATE),
            publish: fields
                .get(columns::PUBLISH)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            description: field_text(fields, columns::DESCRIPTION),
            start_date: field_text(fields, columns::START_DATE),
            end_date: field_text(fields, columns::END_DATE),
            event_type: field_list(fields, columns::TYPE),
            location: field_text(fields, columns::LOCATION),
            url: field_text(fields, columns::URL),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn field_text(fields: &HashMap<String, Value>, name: &str) -> String {
    fields.get(name).map(value_text).unwrap_or_default()
}

fn field_list(fields: &HashMap<String, Value>, name: &str) -> Vec<String> {
    match fields.get(name) {
        Some(Value::Array(items)) => items.iter().map(value_text).filter(|s| !s.is_empty()).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![value_text(other)],
    }
}

/// Eventos publicáveis criados em `cutoff` ou depois, ordenados por início.
///
/// Datas são comparadas como texto `YYYY-MM-DD`; registro sem data de
/// criação nunca passa.
pub fn select_recent_publishable(events: Vec<CalendarEvent>, cutoff: NaiveDate) -> Vec<CalendarEvent> {
    let cutoff = cutoff.format("%Y-%m-%d").to_string();
    let mut selected: Vec<CalendarEvent> = events
        .into_iter()
        .filter(|e| e.publish && e.created_date.as_str() >= cutoff.as_str())
        .collect();
    selected.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    selected
}

/// Fonte de eventos do calendário
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Eventos novos e publicáveis dos últimos `lookback_days` dias até `today`.
    ///
    /// Falhas de leitura resultam em lista vazia.
    async fn recent_publishable_events(&self, lookback_days: i64, today: NaiveDate) -> Vec<CalendarEvent>;
}

#[derive(Deserialize)]
struct AirtablePage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Deserialize)]
struct AirtableRecord {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

/// Cliente da API REST do Airtable para uma tabela
pub struct AirtableClient {
    api_key: String,
    base_id: String,
    table: String,
    base_url: String,
    client: reqwest::Client,
}

impl AirtableClient {
    /// Cliente para `base_id`/`table`
    pub fn new(api_key: String, base_id: String, table: &str) -> Self {
        Self {
            api_key,
            base_id,
            table: table.to_string(),
            base_url: AIRTABLE_BASE_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Aponta para outro endpoint (testes)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn page_url(&self, offset: Option<&str>) -> Result<url::Url, AirtableError> {
        let mut url = url::Url::parse(&format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(&self.base_id),
            urlencoding::encode(&self.table)
        ))?;
        if let Some(offset) = offset {
            url.query_pairs_mut().append_pair("offset", offset);
        }
        Ok(url)
    }

    /// Lê todas as páginas da tabela
    pub async fn fetch_all(&self) -> Result<Vec<CalendarEvent>, AirtableError> {
        log::info!("📥 Lendo base {}, tabela {}", self.base_id, self.table);

        let mut events = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let url = self.page_url(offset.as_deref())?;
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AirtableError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            let page: AirtablePage = response
                .json()
                .await
                .map_err(|e| AirtableError::ParseError(e.to_string()))?;

            events.extend(page.records.iter().map(|r| CalendarEvent::from_fields(&r.fields)));

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        log::debug!("Airtable: {} registro(s) lidos", events.len());
        Ok(events)
    }
}

#[async_trait]
impl EventSource for AirtableClient {
    async fn recent_publishable_events(&self, lookback_days: i64, today: NaiveDate) -> Vec<CalendarEvent> {
        let cutoff = today - Duration::days(lookback_days);
        match self.fetch_all().await {
            Ok(events) => select_recent_publishable(events, cutoff),
            Err(e) => {
                log::error!("❌ Erro ao ler registros do Airtable: {}", e);
                Vec::new()
            }
        }
    }
}
