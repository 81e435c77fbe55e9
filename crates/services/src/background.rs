use std::fmt::Display;
use std::future::Future;
use tokio::task::JoinHandle;

/// Runs a non-critical side effect in the background. Failure is logged
/// and otherwise ignored; there is no retry.
pub fn best_effort<F, E>(label: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => {
                tracing::debug!(task = label, "Best-effort call completed");
            }
            Err(error) => {
                tracing::warn!(task = label, %error, "Best-effort call failed");
            }
        }
    })
}
