//! Operator interrupt handling for the cycle loop.

use std::future::Future;

use tokio::sync::watch;
use tracing::{info, warn};

/// Relay interrupts from `next_signal` to a cycle loop.
///
/// The first interrupt flips `shutdown` so the loop stops after the current
/// cycle. A second one runs `force` and returns. Returns without calling
/// `force` once `next_signal` yields `false`.
pub async fn relay_interrupts<F, Fut, G>(
    mut next_signal: F,
    shutdown: watch::Sender<bool>,
    force: G,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
    G: FnOnce(),
{
    let mut graceful_requested = false;
    while next_signal().await {
        if !graceful_requested {
            graceful_requested = true;
            info!("interrupt received, finishing current cycle");
            let _ = shutdown.send(true);
            continue;
        }
        warn!("second interrupt, exiting now");
        force();
        return;
    }
}
