// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTILITÁRIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários compartilhados por todo o sistema:
// - Retry com backoff exponencial
// - Rate limiting por janela deslizante
// - Text processing
// - Timing e performance
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rate limiting assíncrono para chamadas externas.
pub mod rate_limit;
/// Retry com backoff exponencial para erros transitórios.
pub mod retry;
mod text;
mod timing;

pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy, Transient, DEFAULT_RETRY_ATTEMPTS};
pub use text::*;
pub use timing::{ActionTimer, StageTimings};
