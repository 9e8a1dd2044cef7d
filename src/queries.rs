// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// QUERIES PADRÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Conjunto de queries cobrindo eventos, treinamentos e chamadas de AI safety
const DEFAULT_QUERIES: [&str; 15] = [
    "AI safety OR alignment conference OR workshop",
    "AI governance OR policy symposium OR forum",
    "Machine learning safety OR robustness event OR seminar",
    "AI ethics OR responsible AI development seminar OR workshop",
    "Explainable AI OR interpretable machine learning conference OR workshop",
    "AI safety research summit OR symposium",
    "AI safety OR alignment career workshop OR fair",
    "AI security evaluation OR testing competition OR challenge",
    "AI safety course OR training program OR bootcamp",
    "Effective altruism AI safety event OR meetup",
    "Large language model OR LLM safety workshop OR seminar",
    "AI existential risk OR long-term AI safety symposium OR conference",
    "AI cooperation OR coordination strategies workshop OR forum",
    "AI value alignment OR ethics panel OR discussion",
    "Transformative AI impact OR risk assessment seminar OR workshop",
];

/// Queries usadas quando nenhuma lista é fornecida
pub fn default_queries() -> Vec<String> {
    DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
}
