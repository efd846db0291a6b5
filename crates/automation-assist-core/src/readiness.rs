/// Bounded wait for the signing SDK to become available.
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_ATTEMPTS: u32 = 50;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// Whether on-chain signing can be offered. CLI command generation works either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Ready,
    Unavailable(String),
}

impl Capability {
    pub fn can_sign(&self) -> bool {
        matches!(self, Capability::Ready)
    }
}

/// Polls `probe` at a fixed interval until it succeeds or `max_attempts` is used up.
pub async fn wait_until_ready<F, Fut>(
    mut probe: F,
    max_attempts: u32,
    interval: Duration,
) -> Capability
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    let mut last_error = String::from("never probed");

    for attempt in 1..=max_attempts {
        match probe().await {
            Ok(()) => {
                info!(attempt, "signing SDK ready");
                return Capability::Ready;
            }
            Err(e) => {
                last_error = e;
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    warn!(
        attempts = max_attempts,
        error = %last_error,
        "signing SDK unavailable, transaction signing disabled"
    );
    Capability::Unavailable(format!(
        "not available after {} attempts: {}",
        max_attempts, last_error
    ))
}
