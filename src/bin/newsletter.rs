// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI SAFETY NEWSLETTER (JOB SEMANAL)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Lê os eventos novos do calendário no Airtable e escreve a newsletter e o
// post social da semana ISO corrente em output/.
//
// Uso:
//   ai-safety-newsletter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use ai_safety_events::config::{
    create_tokio_runtime, load_newsletter_config, load_runtime_config, NewsletterCredentials,
};
use ai_safety_events::llm::{AnthropicClient, LlmClient, ResilientLlmClient};
use ai_safety_events::newsletter::{AirtableClient, EventSource, NewsletterJob, NewsletterOutcome};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        eprintln!("⚠ Nenhum arquivo .env encontrado. Certifique-se de que AIRTABLE_API_KEY, AIRTABLE_BASE_ID e CLAUDE_API_KEY estão definidas.");
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_newsletter_config();
    let credentials = NewsletterCredentials::from_env()?;

    log::info!("Usando base do Airtable: {}", credentials.airtable_base_id);
    log::info!("Usando tabela: {}", config.table_name);

    let runtime = create_tokio_runtime(&load_runtime_config())?;
    runtime.block_on(async move {
        let source: Arc<dyn EventSource> = Arc::new(AirtableClient::new(
            credentials.airtable_api_key,
            credentials.airtable_base_id,
            &config.table_name,
        ));
        let model: Arc<dyn LlmClient> = Arc::new(AnthropicClient::new(
            credentials.claude_api_key,
            &config.model,
            config.max_tokens,
        ));
        let oracle: Arc<dyn LlmClient> =
            Arc::new(ResilientLlmClient::from_newsletter_config(model, &config));

        let job = NewsletterJob::new(source, oracle, config);
        match job.run(chrono::Local::now().date_naive()).await {
            NewsletterOutcome::NoEvents => println!("Nenhum evento novo encontrado."),
            NewsletterOutcome::Generated { events, paths, written } => {
                println!("📅 Eventos: {}", events);
                if written {
                    println!("💾 Newsletter: {}", paths.newsletter.display());
                    println!("💾 Social:     {}", paths.social.display());
                } else {
                    println!("⚠️  Falha ao escrever os arquivos (ver log)");
                }
            }
        }
    });

    Ok(())
}
