//! Composed startup/shutdown of the mounted tool servers.
//!
//! Every mount is a [`SessionScope`]. A [`SessionStack`] enters scopes in
//! order and exits them in reverse. Teardown always visits every entered
//! scope: a failing `exit` is recorded and the walk continues. A stack that
//! is dropped without [`SessionStack::close`] aborts whatever is still
//! entered.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{error, info, warn};

/// Boxed future returned by scope transitions.
pub type ScopeFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A resource with an explicit enter/exit lifecycle.
pub trait SessionScope: Send + Sync {
    fn name(&self) -> &str;

    /// Start the scope. A scope whose `enter` fails is never exited.
    fn enter(&self) -> ScopeFuture<'_>;

    /// Orderly teardown.
    fn exit(&self) -> ScopeFuture<'_>;

    /// Best-effort synchronous teardown used when the stack is dropped
    /// before it was closed.
    fn abort(&self);
}

/// A scope that failed to exit cleanly.
#[derive(Debug)]
pub struct ExitFailure {
    pub scope: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start session scope '{scope}': {error:#}")]
    Enter {
        scope: String,
        error: anyhow::Error,
        /// Teardown failures of the scopes unwound after the failed start.
        unwound: Vec<ExitFailure>,
    },

    #[error("{} session scope(s) failed to stop: {}", .0.len(), DisplayFailures(.0))]
    Exit(Vec<ExitFailure>),
}

struct DisplayFailures<'a>(&'a [ExitFailure]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {:#}", failure.scope, failure.error)?;
        }
        Ok(())
    }
}

/// Stack of entered scopes, unwound in reverse.
#[derive(Default)]
pub struct SessionStack {
    entered: Vec<Arc<dyn SessionScope>>,
}

impl SessionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter every scope in order. If one fails, the scopes entered so far
    /// are exited in reverse and the start error is returned.
    pub async fn enter_all(
        scopes: impl IntoIterator<Item = Arc<dyn SessionScope>>,
    ) -> Result<Self, SessionError> {
        let mut stack = Self::new();
        for scope in scopes {
            if let Err(error) = stack.enter(scope.clone()).await {
                error!(scope = scope.name(), "Session scope failed to start: {:#}", error);
                let unwound = stack.unwind().await;
                return Err(SessionError::Enter {
                    scope: scope.name().to_string(),
                    error,
                    unwound,
                });
            }
        }
        Ok(stack)
    }

    /// Enter one scope and push it on the stack.
    pub async fn enter(&mut self, scope: Arc<dyn SessionScope>) -> Result<()> {
        scope.enter().await?;
        info!(scope = scope.name(), "Session scope started");
        self.entered.push(scope);
        Ok(())
    }

    /// Names of the currently entered scopes, in entry order.
    pub fn names(&self) -> Vec<String> {
        self.entered.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entered.is_empty()
    }

    /// Exit every entered scope in reverse order.
    pub async fn close(mut self) -> Result<(), SessionError> {
        let failures = self.unwind().await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SessionError::Exit(failures))
        }
    }

    async fn unwind(&mut self) -> Vec<ExitFailure> {
        let mut failures = Vec::new();
        while let Some(scope) = self.entered.pop() {
            match scope.exit().await {
                Ok(()) => info!(scope = scope.name(), "Session scope stopped"),
                Err(error) => {
                    error!(scope = scope.name(), "Session scope failed to stop: {:#}", error);
                    failures.push(ExitFailure {
                        scope: scope.name().to_string(),
                        error,
                    });
                }
            }
        }
        failures
    }
}

impl Drop for SessionStack {
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }
        warn!(
            remaining = self.entered.len(),
            "Session stack dropped without close; aborting scopes"
        );
        while let Some(scope) = self.entered.pop() {
            scope.abort();
        }
    }
}
