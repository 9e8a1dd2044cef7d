// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI SAFETY EVENTS CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Busca eventos, treinamentos e chamadas abertas de AI safety, pontua com
// um LLM e exporta os relevantes em JSON e Markdown.
//
// Uso:
//   ai-safety-events
//   ai-safety-events --days 14 --results 5
//   ai-safety-events --model anthropic/claude-3.5-haiku
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use ai_safety_events::config::{
    create_tokio_runtime, load_pipeline_config, load_runtime_config, parse_cli_args, Credentials,
};
use ai_safety_events::export::Exporter;
use ai_safety_events::llm::{LlmClient, OpenRouterClient, ResilientLlmClient};
use ai_safety_events::pipeline::EventSearchPipeline;
use ai_safety_events::queries::default_queries;
use ai_safety_events::search::{ExaClient, SearchClient};
use std::path::PathBuf;
use std::sync::Arc;

/// Tenta carregar o arquivo .env de múltiplos locais possíveis
fn load_dotenv() {
    let possible_paths = [
        // Diretório atual
        PathBuf::from(".env"),
        // Diretório pai
        PathBuf::from("../.env"),
        // Raiz do crate em tempo de compilação (fallback)
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env"),
    ];

    for path in &possible_paths {
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => {
                    eprintln!(
                        "✓ Carregado .env de: {:?}",
                        path.canonicalize().unwrap_or(path.clone())
                    );
                    return;
                }
                Err(e) => {
                    eprintln!("⚠ Erro ao carregar {:?}: {}", path, e);
                }
            }
        }
    }

    if dotenvy::dotenv().is_ok() {
        eprintln!("✓ Carregado .env do diretório atual");
    } else {
        eprintln!("⚠ Nenhum arquivo .env encontrado. Certifique-se de que EXA_API_KEY e OPENROUTER_API_KEY estão definidas.");
    }
}

fn print_usage(program: &str) {
    eprintln!("AI Safety Events v{}", ai_safety_events::VERSION);
    eprintln!();
    eprintln!("Uso: {} [opções]", program);
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --days <n>       Dias para trás na busca (padrão: 30)");
    eprintln!("  --results <n>    Resultados por query (padrão: 10)");
    eprintln!("  --model <id>     Modelo do oráculo no OpenRouter (padrão: openai/gpt-4o-mini)");
    eprintln!("  -h, --help       Mostra esta ajuda");
}

fn main() -> anyhow::Result<()> {
    // Carregar .env PRIMEIRO, antes de qualquer coisa
    load_dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "ai-safety-events".into());
    let cli = match parse_cli_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!();
            print_usage(&program);
            std::process::exit(2);
        }
    };
    if cli.help {
        print_usage(&program);
        return Ok(());
    }

    let config = load_pipeline_config().apply_cli(&cli);
    let credentials = Credentials::from_env()?;

    let runtime = create_tokio_runtime(&load_runtime_config())?;
    runtime.block_on(async move {
        let search: Arc<dyn SearchClient> = Arc::new(ExaClient::new(credentials.exa_api_key));
        let model: Arc<dyn LlmClient> =
            Arc::new(OpenRouterClient::new(credentials.openrouter_api_key, &config.model));
        let oracle: Arc<dyn LlmClient> =
            Arc::new(ResilientLlmClient::from_config(model.clone(), &config));

        Exporter::new(&config.results_dir).ensure_dir()?;

        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!(" AI SAFETY EVENTS v{}", ai_safety_events::VERSION);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!();
        println!("Janela: últimos {} dias", config.days);
        println!("Resultados por query: {}", config.results_per_query);
        println!("Modelo: {}", config.model);
        println!();

        let pipeline = EventSearchPipeline::new(config, search, oracle).with_preflight_oracle(model);
        pipeline.preflight().await?;

        let outcome = pipeline.run(&default_queries()).await;
        let report = &outcome.report;

        println!();
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!(" RESULTADO");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!();
        println!(
            "🔍 Queries: {} ({} com resultados, {} falharam)",
            report.runner.submitted, report.runner.successful, report.runner.failed
        );
        println!(
            "🧮 Scoring: {} registros, {} batches, {} falhas de parse",
            report.scoring.records, report.scoring.batches, report.scoring.parse_failures
        );
        println!("📋 Eventos relevantes: {}", report.final_records);
        match &report.exported {
            Some(export) => {
                println!("💾 JSON:     {}", export.paths.json.display());
                println!("💾 Markdown: {}", export.paths.markdown.display());
            }
            None => println!("⚠️  Nada exportado"),
        }
        println!();
        println!("⏱️  Tempo total: {:.2}s", report.timings.total_ms() as f64 / 1000.0);

        Ok::<(), anyhow::Error>(())
    })
}
