use std::future::Future;

use super::data::FetchOptions;
use crate::{ArcStr, net::TransportError};

/// The remote collaborator a [`PollingChannel`](super::PollingChannel) polls.
///
/// Implementations turn `(endpoint, options)` into a sequence of records or a
/// [`TransportError`]; they are expected to enforce their own timeout.
pub trait Fetch: Send + Sync + 'static {
    type Record: Clone + Send + Sync + 'static;

    fn fetch(
        &self,
        endpoint: ArcStr,
        options: FetchOptions,
    ) -> impl Future<Output = Result<Vec<Self::Record>, TransportError>> + Send;
}

/// A [`Fetch`] implementation backed by an async closure. See [`fetch_fn`].
#[derive(Clone)]
pub struct FetchFn<F>(F);

/// Wraps an async closure as a fetch collaborator.
///
/// # Examples
/// ```ignore
/// let fetcher = fetch_fn(|endpoint, _options| async move {
///     Ok(vec![format!("hello from {endpoint}")])
/// });
/// ```
pub fn fetch_fn<F>(f: F) -> FetchFn<F> {
    FetchFn(f)
}

impl<F, Fut, R> Fetch for FetchFn<F>
where
    F: Fn(ArcStr, FetchOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<R>, TransportError>> + Send,
    R: Clone + Send + Sync + 'static,
{
    type Record = R;

    fn fetch(
        &self,
        endpoint: ArcStr,
        options: FetchOptions,
    ) -> impl Future<Output = Result<Vec<R>, TransportError>> + Send {
        (self.0)(endpoint, options)
    }
}
