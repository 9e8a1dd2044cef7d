// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO PIPELINE E DO RUNTIME
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Configuração imutável passada para cada componente na construção.
// Valores padrão podem ser sobrescritos via .env e via argumentos da CLI.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::PathBuf;
use std::time::Duration;

use crate::types::{MAX_SUMMARY_LENGTH, RELEVANCE_THRESHOLD};
use crate::utils::RetryPolicy;

/// Janela de busca padrão (dias)
pub const DEFAULT_DAYS: i64 = 30;
/// Resultados por query padrão
pub const DEFAULT_RESULTS_PER_QUERY: usize = 10;
/// Modelo do oráculo padrão (OpenRouter)
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
/// Itens por chamada ao oráculo
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Queries executadas em paralelo
pub const DEFAULT_POOL_SIZE: usize = 5;
/// Pasta dos arquivos de saída
pub const DEFAULT_RESULTS_FOLDER: &str = "results";
/// Timeout rígido por chamada ao oráculo (segundos)
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

/// Erros de configuração. Todos são fatais na inicialização.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingCredential(String),

    #[error("missing value for argument {0}")]
    MissingValue(String),

    #[error("invalid value {value:?} for argument {flag}")]
    InvalidArgument { flag: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Limite de chamadas ao oráculo por janela de tempo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Chamadas permitidas por janela
    pub max_calls: u32,
    /// Tamanho da janela (segundos)
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 5,
            period_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Janela como Duration
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

/// Configuração completa de uma execução do pipeline de busca.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Dias para trás na janela de publicação
    pub days: i64,
    /// Limite de resultados por query
    pub results_per_query: usize,
    /// Identificador do modelo do oráculo
    pub model: String,
    /// Tamanho de cada batch de scoring
    pub batch_size: usize,
    /// Tamanho do pool de queries concorrentes
    pub pool_size: usize,
    /// Tamanho máximo do resumo (caracteres)
    pub max_summary_length: usize,
    /// Score mínimo mantido pela filtragem
    pub relevance_threshold: u8,
    /// Pasta onde os arquivos são escritos
    pub results_dir: PathBuf,
    /// Timeout por chamada ao oráculo (segundos)
    pub oracle_timeout_secs: u64,
    /// Retry das queries de busca
    pub search_retry: RetryPolicy,
    /// Retry das chamadas ao oráculo
    pub oracle_retry: RetryPolicy,
    /// Rate limit do oráculo
    pub rate_limit: RateLimitConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
            model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            max_summary_length: MAX_SUMMARY_LENGTH,
            relevance_threshold: RELEVANCE_THRESHOLD,
            results_dir: PathBuf::from(DEFAULT_RESULTS_FOLDER),
            oracle_timeout_secs: DEFAULT_ORACLE_TIMEOUT_SECS,
            search_retry: RetryPolicy::default(),
            oracle_retry: RetryPolicy::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Cria configuração padrão.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout por chamada ao oráculo
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Aplica os overrides passados na linha de comando
    pub fn apply_cli(mut self, args: &CliArgs) -> Self {
        if let Some(days) = args.days {
            self.days = days;
        }
        if let Some(results) = args.results {
            self.results_per_query = results;
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        self
    }
}

/// Carrega configuração do pipeline a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `SEARCH_DAYS`: Dias da janela de busca (padrão: 30)
/// - `SEARCH_RESULTS`: Resultados por query (padrão: 10)
/// - `ORACLE_MODEL`: Modelo do oráculo (padrão: "openai/gpt-4o-mini")
/// - `SCORING_BATCH_SIZE`: Itens por batch (padrão: 10)
/// - `QUERY_POOL_SIZE`: Queries em paralelo (padrão: 5)
/// - `RESULTS_FOLDER`: Pasta de saída (padrão: "results")
pub fn load_pipeline_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();

    if let Some(days) = env_positive::<i64>("SEARCH_DAYS") {
        config.days = days;
        log::info!("📦 SEARCH_DAYS={}", days);
    }

    if let Some(results) = env_positive::<usize>("SEARCH_RESULTS") {
        config.results_per_query = results;
        log::info!("📦 SEARCH_RESULTS={}", results);
    }

    if let Ok(model) = std::env::var("ORACLE_MODEL") {
        if !model.trim().is_empty() {
            config.model = model.trim().to_string();
            log::info!("📦 ORACLE_MODEL={}", config.model);
        }
    }

    if let Some(batch) = env_positive::<usize>("SCORING_BATCH_SIZE") {
        config.batch_size = batch;
        log::info!("📦 SCORING_BATCH_SIZE={}", batch);
    }

    if let Some(pool) = env_positive::<usize>("QUERY_POOL_SIZE") {
        config.pool_size = pool;
        log::info!("📦 QUERY_POOL_SIZE={}", pool);
    }

    if let Ok(folder) = std::env::var("RESULTS_FOLDER") {
        if !folder.trim().is_empty() {
            config.results_dir = PathBuf::from(folder.trim());
            log::info!("📦 RESULTS_FOLDER={}", folder.trim());
        }
    }

    config
}

fn env_positive<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

/// Lê uma variável obrigatória; ausente ou vazia é erro fatal
pub fn require_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingCredential(name.to_string())),
    }
}

/// Credenciais do pipeline de busca
#[derive(Clone)]
pub struct Credentials {
    /// Chave da API de busca (Exa)
    pub exa_api_key: String,
    /// Chave do oráculo (OpenRouter)
    pub openrouter_api_key: String,
}

impl Credentials {
    /// Lê `EXA_API_KEY` e `OPENROUTER_API_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            exa_api_key: require_env("EXA_API_KEY")?,
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("exa_api_key", &"***")
            .field("openrouter_api_key", &"***")
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// NEWSLETTER SEMANAL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Modelo padrão do gerador da newsletter
pub const DEFAULT_NEWSLETTER_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Configuração do job semanal de newsletter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterConfig {
    /// Tabela do Airtable com o calendário
    pub table_name: String,
    /// Dias para trás considerados "novos"
    pub lookback_days: i64,
    /// Pasta dos arquivos gerados
    pub output_dir: PathBuf,
    /// Modelo do gerador
    pub model: String,
    /// Limite de tokens por resposta
    pub max_tokens: u32,
    /// Timeout por chamada ao gerador (segundos)
    pub timeout_secs: u64,
    /// Retry das chamadas ao gerador
    pub retry: RetryPolicy,
    /// Rate limit do gerador
    pub rate_limit: RateLimitConfig,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            table_name: "Calendar".to_string(),
            lookback_days: 7,
            output_dir: PathBuf::from("output"),
            model: DEFAULT_NEWSLETTER_MODEL.to_string(),
            max_tokens: 2000,
            timeout_secs: 120,
            retry: RetryPolicy::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl NewsletterConfig {
    /// Timeout por chamada ao gerador
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Carrega configuração da newsletter.
///
/// Variáveis suportadas:
/// - `NEWSLETTER_LOOKBACK_DAYS`: Dias considerados novos (padrão: 7)
/// - `NEWSLETTER_OUTPUT_DIR`: Pasta de saída (padrão: "output")
/// - `NEWSLETTER_MODEL`: Modelo do gerador
pub fn load_newsletter_config() -> NewsletterConfig {
    let mut config = NewsletterConfig::default();

    if let Some(days) = env_positive::<i64>("NEWSLETTER_LOOKBACK_DAYS") {
        config.lookback_days = days;
        log::info!("📦 NEWSLETTER_LOOKBACK_DAYS={}", days);
    }

    if let Ok(dir) = std::env::var("NEWSLETTER_OUTPUT_DIR") {
        if !dir.trim().is_empty() {
            config.output_dir = PathBuf::from(dir.trim());
            log::info!("📦 NEWSLETTER_OUTPUT_DIR={}", dir.trim());
        }
    }

    if let Ok(model) = std::env::var("NEWSLETTER_MODEL") {
        if !model.trim().is_empty() {
            config.model = model.trim().to_string();
            log::info!("📦 NEWSLETTER_MODEL={}", config.model);
        }
    }

    config
}

/// Credenciais do job de newsletter
#[derive(Clone)]
pub struct NewsletterCredentials {
    /// Token do Airtable
    pub airtable_api_key: String,
    /// Base do Airtable
    pub airtable_base_id: String,
    /// Chave da API Anthropic
    pub claude_api_key: String,
}

impl NewsletterCredentials {
    /// Lê `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID` e `CLAUDE_API_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            airtable_api_key: require_env("AIRTABLE_API_KEY")?,
            airtable_base_id: require_env("AIRTABLE_BASE_ID")?,
            claude_api_key: require_env("CLAUDE_API_KEY")?,
        })
    }
}

impl std::fmt::Debug for NewsletterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsletterCredentials")
            .field("airtable_api_key", &"***")
            .field("airtable_base_id", &self.airtable_base_id)
            .field("claude_api_key", &"***")
            .finish()
    }
}

/// Argumentos da CLI de busca
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--days`
    pub days: Option<i64>,
    /// `--results`
    pub results: Option<usize>,
    /// `--model`
    pub model: Option<String>,
    /// `--help` / `-h`
    pub help: bool,
}

/// Faz o parse de `--days N --results N --model ID` (o primeiro item é o binário).
pub fn parse_cli_args<I>(args: I) -> Result<CliArgs, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut iter = args.into_iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--days" => {
                let value = next_value(&mut iter, &arg)?;
                parsed.days = Some(parse_positive(&arg, &value)?);
            }
            "--results" => {
                let value = next_value(&mut iter, &arg)?;
                parsed.results = Some(parse_positive(&arg, &value)?);
            }
            "--model" => {
                let value = next_value(&mut iter, &arg)?;
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidArgument { flag: arg, value });
                }
                parsed.model = Some(value);
            }
            _ => return Err(ConfigError::UnknownArgument(arg)),
        }
    }

    Ok(parsed)
}

fn next_value<I: Iterator<Item = String>>(iter: &mut I, flag: &str) -> Result<String, ConfigError> {
    iter.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_positive<T>(flag: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|v| *v > T::default())
        .ok_or_else(|| ConfigError::InvalidArgument {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

/// Configuração do runtime Tokio.
///
/// Controla número de threads do async runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 8
    pub max_threads: usize,

    /// Nome das threads do runtime.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_threads: 8,
            thread_name: "ai-safety-events".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Calcula número efetivo de worker threads.
    pub fn effective_worker_threads(&self) -> usize {
        if let Some(threads) = self.worker_threads {
            threads
        } else {
            std::cmp::min(num_cpus::get(), self.max_threads).max(1)
        }
    }
}

/// Carrega configuração do runtime (`TOKIO_THREADS`, `TOKIO_MAX_THREADS`).
pub fn load_runtime_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    if let Some(threads) = env_positive::<usize>("TOKIO_THREADS") {
        config.worker_threads = Some(threads);
        log::info!("📦 TOKIO_THREADS={} (fixo)", threads);
    }

    if let Some(max) = env_positive::<usize>("TOKIO_MAX_THREADS") {
        config.max_threads = max;
        log::info!("📦 TOKIO_MAX_THREADS={}", max);
    }

    config
}

/// Cria o runtime Tokio com configuração customizada.
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();
    log::debug!("🚀 Criando runtime Tokio: {} workers", worker_threads);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}
