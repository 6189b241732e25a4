// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process shutdown signaling.
//!
//! SIGINT and SIGTERM cancel a shared token. The router stops pumping
//! gateway events on cancellation and closes every tenant actor, which
//! drains its playback sender (deleting the status message on the way)
//! and persists tenant config before the process exits.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawns a task that waits for a termination signal and cancels the
/// returned token. Cancellation is the start of the graceful drain,
/// not the exit itself.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal, "shutting down, draining tenant actors");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, watching Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
