#[cfg(test)]
#[path = "lora_poller_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::LoraStatusResponse;
use crate::domain::models::LoraStatusSource;

/// Polls a persona's LoRA training status until it settles. Only one poll
/// runs at a time; starting another cancels the previous one.
pub struct LoraPoller {
    interval: Duration,
    current: Option<CancellationToken>,
}

impl Default for LoraPoller {
    fn default() -> LoraPoller {
        let interval_ms = Config::get(ConfigKey::LoraPollInterval)
            .parse::<u64>()
            .unwrap_or(10_000);

        return LoraPoller::new(Duration::from_millis(interval_ms));
    }
}

impl LoraPoller {
    pub fn new(interval: Duration) -> LoraPoller {
        return LoraPoller {
            interval,
            current: None,
        };
    }

    pub fn is_polling(&self) -> bool {
        return self
            .current
            .as_ref()
            .map(|token| return !token.is_cancelled())
            .unwrap_or(false);
    }

    /// Starts polling. Every successful poll is delivered on the returned
    /// channel, which closes once the status is `ready` or `failed` or the
    /// poll is cancelled. Failed polls are logged and retried on the next
    /// tick.
    pub fn watch(
        &mut self,
        source: Arc<dyn LoraStatusSource>,
        persona_id: &str,
    ) -> mpsc::UnboundedReceiver<LoraStatusResponse> {
        self.cancel();

        let (tx, rx) = mpsc::unbounded_channel::<LoraStatusResponse>();
        let token = CancellationToken::new();
        self.current = Some(token.clone());

        let interval = self.interval;
        let persona_id = persona_id.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let res = tokio::select! {
                    _ = token.cancelled() => break,
                    res = source.lora_status(&persona_id) => res,
                };

                match res {
                    Ok(status) => {
                        let settled = status.lora_status.is_terminal();
                        tracing::debug!(persona_id = %persona_id, status = %status.lora_status, "LoRA status polled");
                        if tx.send(status).is_err() || settled {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(persona_id = %persona_id, error = ?err, "Polling LoRA status failed");
                    }
                }
            }

            token.cancel();
        });

        return rx;
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for LoraPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}
