//! Reducer abstraction: `(record, state) -> next state`.

use async_trait::async_trait;
use std::marker::PhantomData;

use crate::error::ReducerResult;
use crate::messaging::AgentRecord;

/// User-supplied transition function driven by the processing loop
///
/// Returning `Err` leaves the state untouched and is counted as a failure;
/// the error never reaches the sender of the record.
#[async_trait]
pub trait Reducer<S>: Send + Sync + 'static {
    async fn reduce(&self, record: &AgentRecord, state: &S) -> ReducerResult<S>;
}

/// Adapter turning a synchronous closure into a [`Reducer`]
pub struct FnReducer<S, F> {
    f: F,
    _state: PhantomData<fn(&S) -> S>,
}

/// Wrap a synchronous closure as a reducer
///
/// ```rust
/// use effector::{reducer_fn, AgentRecord};
///
/// let reducer = reducer_fn(|record: &AgentRecord, count: &u64| {
///     Ok(if record.command_type() == Some("INCREMENT") { count + 1 } else { *count })
/// });
/// # let _ = reducer;
/// ```
pub fn reducer_fn<S, F>(f: F) -> FnReducer<S, F>
where
    F: Fn(&AgentRecord, &S) -> ReducerResult<S> + Send + Sync + 'static,
{
    FnReducer {
        f,
        _state: PhantomData,
    }
}

#[async_trait]
impl<S, F> Reducer<S> for FnReducer<S, F>
where
    S: Send + Sync + 'static,
    F: Fn(&AgentRecord, &S) -> ReducerResult<S> + Send + Sync + 'static,
{
    async fn reduce(&self, record: &AgentRecord, state: &S) -> ReducerResult<S> {
        (self.f)(record, state)
    }
}

/// Reducer that accepts every record and keeps the state unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReducer;

#[async_trait]
impl<S> Reducer<S> for IdentityReducer
where
    S: Clone + Send + Sync + 'static,
{
    async fn reduce(&self, _record: &AgentRecord, state: &S) -> ReducerResult<S> {
        Ok(state.clone())
    }
}
