use std::sync::Arc;

use crate::error::{CozyError, CozyResult};

/// State of data a view depends on.
#[derive(Debug, Clone)]
pub enum Loadable<T> {
    Pending,
    Failed(Arc<CozyError>),
    Ready(T),
}

impl<T> Loadable<T> {
    pub fn from_result(result: CozyResult<T>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => Loadable::Failed(Arc::new(err)),
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Loadable::Pending)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Pending => Loadable::Pending,
            Loadable::Failed(err) => Loadable::Failed(err),
            Loadable::Ready(value) => Loadable::Ready(f(value)),
        }
    }
}

impl<T> From<CozyResult<T>> for Loadable<T> {
    fn from(result: CozyResult<T>) -> Self {
        Loadable::from_result(result)
    }
}
