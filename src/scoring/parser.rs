// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PARSER DA RESPOSTA DO ORÁCULO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// A resposta é texto livre no formato:
//
//   Item 1:
//   Score: 8
//   Explanation: Workshop on March 3, applications open.
//
//   Item 2:
//   ...
//
// O parse é defensivo: cada item resolve para um ParsedScore ou para um
// ParseFailure tipado, e nenhum erro escapa daqui.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ScoreLevel;

static ITEM_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[#*\s]*item\s*#?\s*(\d+)\s*[:.)]?").expect("valid item header regex")
});

static SCORE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[-*#\s]*score\**\s*:\**\s*(.*)$").expect("valid score regex")
});

static EXPLANATION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[-*#\s]*explanation\**\s*:\**\s*(.*)$").expect("valid explanation regex")
});

/// Score e explicação extraídos para um item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScore {
    /// Nível atribuído
    pub level: ScoreLevel,
    /// Justificativa (linhas de continuação unidas por espaço)
    pub explanation: String,
}

/// Motivo pelo qual um item não pôde ser interpretado
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("no reply block for item {0}")]
    MissingBlock(usize),

    #[error("missing Score line")]
    MissingScore,

    #[error("non-integer score {0:?}")]
    InvalidScore(String),

    #[error("score {0} is not one of 0, 6, 7, 8, 9, 10")]
    ScoreOutOfRange(i64),

    #[error("missing Explanation line")]
    MissingExplanation,
}

/// Resultado do parse de um item
pub type ItemParse = Result<ParsedScore, ParseFailure>;

/// Bloco de linhas não-vazias consecutivas
struct Block<'a> {
    item_number: Option<usize>,
    lines: Vec<&'a str>,
}

impl<'a> Block<'a> {
    fn new(lines: Vec<&'a str>) -> Self {
        let item_number = lines
            .first()
            .and_then(|first| ITEM_HEADER.captures(first))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok());
        Self { item_number, lines }
    }

    fn has_fields(&self) -> bool {
        self.lines
            .iter()
            .any(|l| SCORE_LINE.is_match(l) || EXPLANATION_LINE.is_match(l))
    }
}

fn split_blocks(reply: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in reply.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(Block::new(std::mem::take(&mut current)));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(Block::new(current));
    }

    blocks
}

/// Interpreta a resposta de um batch com `expected` itens.
///
/// Sempre retorna exatamente `expected` entradas, na ordem dos itens.
/// Blocos com cabeçalho `Item N` vão para o item N; blocos sem cabeçalho
/// ocupam a próxima posição. Blocos sem nenhuma linha Score/Explanation
/// (preâmbulo, comentários) são ignorados, e um cabeçalho isolado vale
/// para o bloco seguinte.
pub fn parse_batch_reply(reply: &str, expected: usize) -> Vec<ItemParse> {
    let mut slots: Vec<Option<Block<'_>>> = (0..expected).map(|_| None).collect();
    let mut next_position = 0usize;
    let mut pending_header: Option<usize> = None;

    for block in split_blocks(reply) {
        let index = match (block.item_number, block.has_fields()) {
            (Some(n), false) => {
                pending_header = Some(n);
                continue;
            }
            (Some(n), true) => n.checked_sub(1),
            (None, true) => match pending_header.take() {
                Some(n) => n.checked_sub(1),
                None => Some(next_position),
            },
            (None, false) => continue,
        };
        pending_header = None;

        let Some(index) = index else { continue };
        if let Some(slot) = slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(block);
            }
        }
        next_position = index + 1;
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| match slot {
            Some(block) => parse_block_lines(&block.lines),
            None => Err(ParseFailure::MissingBlock(i + 1)),
        })
        .collect()
}

/// Interpreta as linhas de um único bloco
pub fn parse_block_lines(lines: &[&str]) -> ItemParse {
    let raw_score = lines
        .iter()
        .find_map(|l| SCORE_LINE.captures(l))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(ParseFailure::MissingScore)?;

    let level = parse_score_value(raw_score)?;

    let explanation_start = lines
        .iter()
        .position(|l| EXPLANATION_LINE.is_match(l))
        .ok_or(ParseFailure::MissingExplanation)?;

    let mut parts: Vec<&str> = Vec::new();
    if let Some(first) = EXPLANATION_LINE
        .captures(lines[explanation_start])
        .and_then(|caps| caps.get(1))
    {
        parts.push(first.as_str().trim());
    }
    parts.extend(
        lines[explanation_start + 1..]
            .iter()
            .filter(|l| !SCORE_LINE.is_match(l))
            .map(|l| l.trim()),
    );

    let explanation = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if explanation.is_empty() {
        return Err(ParseFailure::MissingExplanation);
    }

    Ok(ParsedScore { level, explanation })
}

fn parse_score_value(raw: &str) -> Result<ScoreLevel, ParseFailure> {
    let cleaned = raw.trim().trim_matches('*').trim();
    let value: i64 = cleaned
        .parse()
        .map_err(|_| ParseFailure::InvalidScore(cleaned.to_string()))?;
    ScoreLevel::from_value(value).ok_or(ParseFailure::ScoreOutOfRange(value))
}
