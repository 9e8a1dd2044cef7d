// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RATE LIMITER (JANELA DESLIZANTE)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Limita chamadas por janela de tempo. Quem excede o limite dorme até
// a chamada mais antiga sair da janela, em vez de receber erro.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiter assíncrono com janela deslizante
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: u32,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Permite `max_calls` chamadas a cada `period`
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            period,
            window: Mutex::new(VecDeque::with_capacity(max_calls as usize)),
        }
    }

    /// Aguarda até haver capacidade e registra a chamada
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                Self::prune(&mut window, now, self.period);

                if window.len() < self.max_calls as usize {
                    window.push_back(now);
                    return;
                }

                // Capacidade volta quando a chamada mais antiga expirar
                match window.front() {
                    Some(&oldest) => (oldest + self.period).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            log::debug!(
                "🚦 Rate limit atingido ({} chamadas/{:?}), aguardando {}ms",
                self.max_calls,
                self.period,
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Chamadas ainda disponíveis na janela atual
    pub async fn remaining(&self) -> u32 {
        let mut window = self.window.lock().await;
        Self::prune(&mut window, Instant::now(), self.period);
        self.max_calls.saturating_sub(window.len() as u32)
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant, period: Duration) {
        while let Some(&first) = window.front() {
            if now.duration_since(first) >= period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}
