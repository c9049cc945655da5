use std::future::Future;

use crate::error::VoteError;

/// Dispatch a non-critical side effect off the request path.
///
/// The task gets its own error channel: failures are logged and never reach
/// the triggering request.
pub fn spawn_notify<F>(label: &'static str, fut: F)
where
    F: Future<Output = Result<(), VoteError>> + 'static,
{
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = fut.await {
            worker::console_log!("{label} failed (ignored): {e}");
        }
    });
}
