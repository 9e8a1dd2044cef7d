// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROMPTS DE SCORING
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Rubrica enviada ao oráculo. A resposta esperada segue o formato
// "Item N: / Score: / Explanation:" interpretado por `parser`.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::NaiveDate;

use crate::llm::ChatMessage;
use crate::types::Record;

/// Prompt de sistema do scorer
pub const SCORING_SYSTEM_PROMPT: &str = "You are an AI safety expert.";

const SCORING_RUBRIC: &str = r#"You are an AI expert tasked with evaluating potential AI safety events, training opportunities, and open calls.
This is for the AI Safety Events and Training newsletter.
This newsletter ONLY includes upcoming events, training programs, and open calls related to AI safety.

Given the following information about search results, rate each on a scale of 0-10 based on the following STRICT criteria:

Scoring guidelines:
10: Highly relevant upcoming event, training program, or open call specifically focused on AI safety, with clear future dates and detailed participation information.
8-9: Relevant upcoming opportunity in AI safety, but may lack some minor details or have a slightly broader focus.
6-7: Upcoming AI safety related event or opportunity, but missing some important details or not exclusively focused on safety.
1-5: DO NOT USE THESE SCORES.
0: Anything that is not a specific upcoming event, training program, or open call related to AI safety. This includes past events, general articles, resources without participation options, or topics not directly tied to AI safety.

Key points:
- If it's not an upcoming event, training, or open call, it MUST be scored 0.
- If the date/deadline is in the past or not clearly specified as a future date, it MUST be scored 0.
- If it lacks a specific date or clear participation information, it should be scored 6 or lower.
- Only score 8 or above if it's highly relevant to AI safety AND provides clear details for future participation.
- Pay close attention to avoid duplicate events. If you suspect an event is a duplicate, mention it in the explanation.

Provide your response in the following format for each item, with a blank line between items:
Item [number]:
Score: [0, 6, 7, 8, 9, or 10]
Explanation: [2-3 sentence justification, including the specific date of the event/deadline if available. Mention if it appears to be a duplicate.]

Search results:
"#;

/// Instruções de scoring com a data de hoje
pub fn scoring_instructions(today: NaiveDate) -> String {
    format!("Today's date: {}\n\n{}", today.format("%Y-%m-%d"), SCORING_RUBRIC)
}

/// Serializa os itens do batch como `Item N:` + JSON (1-based)
pub fn format_batch_items(batch: &[&Record]) -> String {
    batch
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let json = serde_json::to_string(record).unwrap_or_else(|_| {
                format!("{{\"title\":{:?},\"url\":{:?}}}", record.title, record.url)
            });
            format!("Item {}:\n{}", i + 1, json)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Monta as mensagens de uma única chamada ao oráculo para o batch
pub fn build_scoring_messages(today: NaiveDate, batch: &[&Record]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SCORING_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "{}{}",
            scoring_instructions(today),
            format_batch_items(batch)
        )),
    ]
}
