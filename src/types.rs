// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Tipo de URL (alias para String)
pub type Url = String;

/// Tamanho máximo (em caracteres) do resumo de um [`Record`]
pub const MAX_SUMMARY_LENGTH: usize = 500;

/// Score mínimo para um [`Record`] sobreviver à filtragem
pub const RELEVANCE_THRESHOLD: u8 = 6;

/// Níveis discretos de relevância atribuídos pelo oráculo.
///
/// Os valores 1-5 não existem de propósito: ou o item é um evento
/// futuro de AI safety (6+), ou é irrelevante (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScoreLevel {
    /// Não é um evento/treinamento/chamada futura de AI safety
    Irrelevant,
    /// Relacionado, mas faltam detalhes importantes
    Six,
    /// Relacionado, foco mais amplo
    Seven,
    /// Relevante, detalhes menores ausentes
    Eight,
    /// Relevante e bem detalhado
    Nine,
    /// Altamente relevante, datas e participação claras
    Ten,
}

impl ScoreLevel {
    /// Todos os níveis válidos, em ordem crescente
    pub const ALL: [ScoreLevel; 6] = [
        Self::Irrelevant,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
    ];

    /// Converte um inteiro para nível, se pertencer ao conjunto {0, 6..=10}
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Irrelevant),
            6 => Some(Self::Six),
            7 => Some(Self::Seven),
            8 => Some(Self::Eight),
            9 => Some(Self::Nine),
            10 => Some(Self::Ten),
            _ => None,
        }
    }

    /// Valor numérico do nível
    pub fn value(self) -> u8 {
        match self {
            Self::Irrelevant => 0,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten => 10,
        }
    }
}

/// Um candidato a evento, treinamento ou chamada aberta.
///
/// Criado pelo normalizador, enriquecido pelo scorer e consumido pelo
/// exportador. A identidade do registro é a `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Título da página
    pub title: String,
    /// URL (chave de identidade)
    pub url: Url,
    /// Resumo truncado do corpo do resultado
    pub summary: String,
    /// Score atribuído pelo oráculo (0, 6, 7, 8, 9 ou 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_safety_score: Option<u8>,
    /// Justificativa do score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_explanation: Option<String>,
}

impl Record {
    /// Cria um registro ainda sem score
    pub fn new(title: impl Into<String>, url: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            summary: summary.into(),
            ai_safety_score: None,
            score_explanation: None,
        }
    }

    /// Anexa score e explicação
    pub fn apply_score(&mut self, level: ScoreLevel, explanation: impl Into<String>) {
        self.ai_safety_score = Some(level.value());
        self.score_explanation = Some(explanation.into());
    }

    /// Score efetivo (registros sem score contam como 0)
    pub fn score(&self) -> u8 {
        self.ai_safety_score.unwrap_or(0)
    }

    /// Retorna true se o scorer já passou por este registro
    pub fn is_scored(&self) -> bool {
        self.ai_safety_score.is_some() && self.score_explanation.is_some()
    }
}

/// Grupo de registros retornado por uma query de busca
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Texto da query
    pub query: String,
    /// Registros na ordem da fonte
    pub results: Vec<Record>,
}

impl QueryResult {
    /// Cria um grupo
    pub fn new(query: impl Into<String>, results: Vec<Record>) -> Self {
        Self {
            query: query.into(),
            results,
        }
    }

    /// Grupo vazio (query que falhou ou não retornou nada)
    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new())
    }

    /// Número de registros no grupo
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Retorna true se o grupo não tem registros
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Hit bruto devolvido pela API de busca, antes da normalização.
///
/// Todos os campos são opcionais: a API pode omitir qualquer um deles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    /// Título da página
    pub title: Option<String>,
    /// URL do resultado
    pub url: Option<String>,
    /// Texto extraído da página
    pub text: Option<String>,
}

impl RawHit {
    /// Hit com todos os campos presentes
    pub fn new(title: &str, url: &str, text: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            text: Some(text.to_string()),
        }
    }
}

/// Janela de datas de publicação usada em todas as queries de uma execução
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Início da janela (inclusivo)
    pub start: DateTime<Utc>,
    /// Fim da janela
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Janela dos últimos `days` dias até `end`
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// Janela dos últimos `days` dias até agora
    pub fn last_days(days: i64) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    /// Início em ISO-8601
    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Fim em ISO-8601
    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
