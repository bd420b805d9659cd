use std::fmt;
use std::sync::Arc;

use crate::error::PgKeenError;
use crate::types::RowValues;

/// Emitted before a statement is sent.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent<'a> {
    /// Positional query text, after named placeholders were rewritten.
    pub text: &'a str,
    pub values: &'a [RowValues],
}

/// Emitted after a statement succeeded.
#[derive(Debug, Clone, Copy)]
pub struct ResultEvent<'a> {
    pub text: &'a str,
    pub values: &'a [RowValues],
    /// Rows returned, or rows affected for statements without a result set.
    pub row_count: usize,
}

pub type QueryHook = Arc<dyn Fn(&QueryEvent<'_>) + Send + Sync>;
pub type ResultHook = Arc<dyn Fn(&ResultEvent<'_>) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&PgKeenError) + Send + Sync>;
pub type DestroyHook = Arc<dyn Fn(Option<&PgKeenError>) + Send + Sync>;

/// Named callbacks for query and pool activity.
///
/// Every event is also logged through `tracing`; hooks are for callers that want the
/// events themselves.
/// ```rust
/// use pg_keen::events::EventListeners;
///
/// let listeners = EventListeners::new()
///     .on_query(|event| eprintln!("sql: {}", event.text))
///     .on_result(|event| eprintln!("rows: {}", event.row_count));
/// # let _ = listeners;
/// ```
#[derive(Clone, Default)]
pub struct EventListeners {
    query: Option<QueryHook>,
    result: Option<ResultHook>,
    connect_error: Option<ErrorHook>,
    destroy: Option<DestroyHook>,
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("query", &self.query.is_some())
            .field("result", &self.result.is_some())
            .field("connect_error", &self.connect_error.is_some())
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

impl EventListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_query(mut self, hook: impl Fn(&QueryEvent<'_>) + Send + Sync + 'static) -> Self {
        self.query = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_result(mut self, hook: impl Fn(&ResultEvent<'_>) + Send + Sync + 'static) -> Self {
        self.result = Some(Arc::new(hook));
        self
    }

    /// Called when the pool fails to hand out a connection.
    #[must_use]
    pub fn on_connect_error(mut self, hook: impl Fn(&PgKeenError) + Send + Sync + 'static) -> Self {
        self.connect_error = Some(Arc::new(hook));
        self
    }

    /// Called when a connection is closed instead of going back to the pool. The argument
    /// is the error that caused it, or `None` for an explicit destroy or a connection
    /// dropped with an open transaction or advisory lock.
    #[must_use]
    pub fn on_destroy(
        mut self,
        hook: impl Fn(Option<&PgKeenError>) + Send + Sync + 'static,
    ) -> Self {
        self.destroy = Some(Arc::new(hook));
        self
    }

    pub(crate) fn emit_query(&self, event: &QueryEvent<'_>) {
        tracing::debug!(sql = event.text, params = event.values.len(), "query");
        if let Some(hook) = &self.query {
            hook(event);
        }
    }

    pub(crate) fn emit_result(&self, event: &ResultEvent<'_>) {
        tracing::trace!(sql = event.text, rows = event.row_count, "result");
        if let Some(hook) = &self.result {
            hook(event);
        }
    }

    pub(crate) fn emit_connect_error(&self, error: &PgKeenError) {
        tracing::warn!(%error, "failed to acquire connection");
        if let Some(hook) = &self.connect_error {
            hook(error);
        }
    }

    pub(crate) fn emit_destroy(&self, cause: Option<&PgKeenError>) {
        match cause {
            Some(error) => tracing::debug!(%error, "connection destroyed"),
            None => tracing::debug!("connection destroyed"),
        }
        if let Some(hook) = &self.destroy {
            hook(cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn hooks_receive_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let on_query = Arc::clone(&seen);
        let on_result = Arc::clone(&seen);
        let listeners = EventListeners::new()
            .on_query(move |e| on_query.lock().unwrap().push(format!("q:{}", e.text)))
            .on_result(move |e| on_result.lock().unwrap().push(format!("r:{}", e.row_count)));

        let values = [RowValues::Int(1)];
        listeners.emit_query(&QueryEvent {
            text: "SELECT $1",
            values: &values,
        });
        listeners.emit_result(&ResultEvent {
            text: "SELECT $1",
            values: &values,
            row_count: 1,
        });

        assert_eq!(*seen.lock().unwrap(), vec!["q:SELECT $1", "r:1"]);
    }

    #[test]
    fn destroy_hook_sees_the_cause() {
        let causes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&causes);
        let listeners = EventListeners::new().on_destroy(move |cause| {
            seen.lock()
                .unwrap()
                .push(cause.map(ToString::to_string));
        });

        listeners.emit_destroy(Some(&PgKeenError::Other("boom".into())));
        listeners.emit_destroy(None);

        assert_eq!(
            *causes.lock().unwrap(),
            vec![Some("Other database error: boom".to_string()), None]
        );
    }

    #[test]
    fn empty_listeners_are_silent() {
        let listeners = EventListeners::default();
        listeners.emit_connect_error(&PgKeenError::Other("boom".into()));
        assert_eq!(
            format!("{listeners:?}"),
            "EventListeners { query: false, result: false, connect_error: false, destroy: false }"
        );
    }
}
