//! The resolvable response type.
//!
//! A mock response is one of three concrete variants, each implementing
//! [`Responder`] once. Callers only ever see `MockResponse::resolve`.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Produce an output `O` from request facts `I`.
///
/// Errors raised by user resolvers are not interpreted by the core; they
/// propagate up to the transport.
#[async_trait]
pub trait Responder<I, O>: Send + Sync {
    async fn respond(&self, input: I) -> anyhow::Result<O>;
}

/// A literal value, returned as-is for every request
pub struct Literal<O>(pub O);

#[async_trait]
impl<I, O> Responder<I, O> for Literal<O>
where
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    async fn respond(&self, _input: I) -> anyhow::Result<O> {
        Ok(self.0.clone())
    }
}

/// A synchronous function of the request facts
pub struct SyncFn<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

#[async_trait]
impl<F, I, O> Responder<I, O> for SyncFn<F, I>
where
    F: Fn(I) -> anyhow::Result<O> + Send + Sync,
    I: Send + 'static,
    O: Send + 'static,
{
    async fn respond(&self, input: I) -> anyhow::Result<O> {
        (self.f)(input)
    }
}

/// A function of the request facts returning a deferred value
pub struct AsyncFn<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

#[async_trait]
impl<F, I, O> Responder<I, O> for AsyncFn<F, I>
where
    F: Fn(I) -> BoxFuture<'static, anyhow::Result<O>> + Send + Sync,
    I: Send + 'static,
    O: Send + 'static,
{
    async fn respond(&self, input: I) -> anyhow::Result<O> {
        (self.f)(input).await
    }
}

/// Shared handle to any responder
pub struct MockResponse<I, O> {
    inner: Arc<dyn Responder<I, O>>,
}

impl<I, O> Clone for MockResponse<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O> fmt::Debug for MockResponse<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MockResponse(..)")
    }
}

impl<I, O> MockResponse<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(responder: impl Responder<I, O> + 'static) -> Self {
        Self {
            inner: Arc::new(responder),
        }
    }

    pub fn literal(value: O) -> Self
    where
        O: Clone + Sync,
    {
        Self::new(Literal(value))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        Self::try_from_fn(move |input| Ok(f(input)))
    }

    pub fn try_from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        Self::new(SyncFn {
            f,
            _input: PhantomData,
        })
    }

    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        Self::try_from_async_fn(move |input| f(input).map(Ok::<O, anyhow::Error>))
    }

    pub fn try_from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
    {
        Self::new(AsyncFn {
            f: move |input: I| -> BoxFuture<'static, anyhow::Result<O>> { f(input).boxed() },
            _input: PhantomData,
        })
    }

    /// Resolve to a concrete value for this request
    pub async fn resolve(&self, input: I) -> anyhow::Result<O> {
        self.inner.respond(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_literal_is_returned_unchanged() {
        let response: MockResponse<u32, String> = MockResponse::literal("fixed".to_string());
        assert_eq!(response.resolve(1).await.unwrap(), "fixed");
        assert_eq!(response.resolve(2).await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn test_sync_fn_receives_input() {
        let response: MockResponse<u32, u32> = MockResponse::from_fn(|n| n * 2);
        assert_eq!(response.resolve(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_async_fn_is_awaited() {
        let response: MockResponse<u32, u32> = MockResponse::from_async_fn(|n| async move {
            tokio::task::yield_now().await;
            n + 1
        });
        assert_eq!(response.resolve(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_resolver_errors_propagate() {
        let response: MockResponse<(), u32> =
            MockResponse::try_from_fn(|_| Err(anyhow::anyhow!("Internal error")));
        let err = response.resolve(()).await.unwrap_err();
        assert_eq!(err.to_string(), "Internal error");

        let response: MockResponse<(), u32> = MockResponse::try_from_async_fn(|_| async {
            Err::<u32, _>(anyhow::anyhow!("async failure"))
        });
        assert!(response.resolve(()).await.is_err());
    }

    #[test]
    fn test_mock_response_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockResponse<u32, String>>();
    }
}
