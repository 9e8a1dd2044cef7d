// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RETRY COM BACKOFF EXPONENCIAL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Helper reutilizável aplicado às duas fronteiras externas (busca e oráculo).
// Só erros transitórios são repetidos; o resto retorna na hora.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Número padrão de tentativas por chamada externa
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

/// Erros que sabem dizer se vale a pena tentar de novo
pub trait Transient {
    /// Falha de rede, timeout, rate limit ou 5xx
    fn is_transient(&self) -> bool;
}

/// Política de retry: tentativas e curva de backoff.
///
/// O atraso da tentativa `n` (0-based) é `multiplier * 2^n`, limitado a
/// `[min_delay, max_delay]`, mais um jitter aleatório de até `jitter_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Tentativas totais (inclui a primeira)
    pub max_attempts: u32,
    /// Base da curva exponencial (ms)
    pub multiplier_ms: u64,
    /// Atraso mínimo entre tentativas (ms)
    pub min_delay_ms: u64,
    /// Atraso máximo entre tentativas (ms)
    pub max_delay_ms: u64,
    /// Jitter máximo somado ao atraso (ms)
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            multiplier_ms: 1_000,
            min_delay_ms: 4_000,
            max_delay_ms: 10_000,
            jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Política sem espera entre tentativas (testes)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier_ms: 0,
            min_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Atraso determinístico (sem jitter) antes da tentativa seguinte a `attempt`
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(63)).unwrap_or(u64::MAX);
        let raw = self.multiplier_ms.saturating_mul(factor);
        let clamped = raw.max(self.min_delay_ms).min(self.max_delay_ms);
        Duration::from_millis(clamped)
    }

    fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

/// Executa `op` repetindo falhas transitórias segundo `policy`.
///
/// `op` recebe o índice da tentativa (0-based). Retorna o último erro
/// quando as tentativas se esgotam ou quando o erro não é transitório.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Transient + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let is_last = attempt + 1 >= max_attempts;
                if !e.is_transient() || is_last {
                    if attempt > 0 {
                        log::warn!(
                            "🔁 {} falhou após {} tentativa(s): {}",
                            label,
                            attempt + 1,
                            e
                        );
                    }
                    return Err(e);
                }

                let delay = policy.delay_with_jitter(attempt);
                log::warn!(
                    "🔁 {} tentativa {}/{} falhou ({}), nova tentativa em {}ms",
                    label,
                    attempt + 1,
                    max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient={})", self.transient)
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    #[test]
    fn test_default_policy_curve() {
        let policy = RetryPolicy::default();
        // 1s, 2s, 4s ficam abaixo do mínimo de 4s
        assert_eq!(policy.base_delay(0), Duration::from_secs(4));
        assert_eq!(policy.base_delay(1), Duration::from_secs(4));
        assert_eq!(policy.base_delay(2), Duration::from_secs(4));
        assert_eq!(policy.base_delay(3), Duration::from_secs(8));
        // teto de 10s
        assert_eq!(policy.base_delay(4), Duration::from_secs(10));
        assert_eq!(policy.base_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(u32::MAX), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, TestError> =
            retry_with_backoff(&RetryPolicy::immediate(5), "op", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(TestError { transient: true })
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> =
            retry_with_backoff(&RetryPolicy::immediate(3), "op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> =
            retry_with_backoff(&RetryPolicy::immediate(5), "op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), TestError> = retry_with_backoff(&RetryPolicy::immediate(0), "op", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError { transient: true }) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
