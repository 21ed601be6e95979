//! The future returned by `define`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use super::component::Component;
use crate::error::{Result, ZephError};

/// Resolves to the defined [`Component`], or to the error that stopped it.
///
/// The definition runs on the local task set whether or not this handle is
/// awaited. Synchronous failures (bad name, duplicate) resolve immediately.
#[must_use = "dropping the handle does not cancel the definition, but hides its result"]
pub struct DefineHandle(State);

enum State {
    Running(JoinHandle<Result<Component>>),
    Failed(Option<ZephError>),
}

impl DefineHandle {
    pub(crate) fn running(handle: JoinHandle<Result<Component>>) -> Self {
        Self(State::Running(handle))
    }

    pub(crate) fn failed(err: ZephError) -> Self {
        Self(State::Failed(Some(err)))
    }
}

impl Future for DefineHandle {
    type Output = Result<Component>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().0 {
            State::Running(handle) => Pin::new(handle)
                .poll(cx)
                .map(|joined| joined.unwrap_or_else(|err| Err(ZephError::Task(err.to_string())))),
            State::Failed(err) => Poll::Ready(Err(err
                .take()
                .unwrap_or_else(|| ZephError::Task("define handle polled after completion".to_owned())))),
        }
    }
}
