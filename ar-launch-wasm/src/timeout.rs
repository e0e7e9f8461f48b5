//! Caller-side bound for prompts and session negotiation.
//!
//! Nothing in the crate times out on its own: a native permission prompt is
//! left to the user. Callers that need a bounded wait race the operation
//! against a timer of their choice.

use futures::future::{Either, select};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out")]
pub struct Elapsed;

/// Resolve with `operation`, or `Elapsed` if `timer` finishes first.
/// The operation wins when both are ready on the same poll.
pub async fn with_timeout<F, T>(operation: F, timer: T) -> Result<F::Output, Elapsed>
where
    F: Future,
    T: Future<Output = ()>,
{
    let operation = std::pin::pin!(operation);
    let timer = std::pin::pin!(timer);
    match select(operation, timer).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(((), _)) => Err(Elapsed),
    }
}

/// `setTimeout` as a future. Never resolves outside a window context.
#[cfg(target_arch = "wasm32")]
pub async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            if let Err(e) =
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            {
                tracing::warn!("setTimeout failed: {e:?}");
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
