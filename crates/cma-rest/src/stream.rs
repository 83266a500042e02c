//! Streams of resources spanning several pages.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

use cma_core::{Resource, Result};

/// Resources yielded one at a time across collection pages.
///
/// Pages are fetched lazily as the stream is polled. The first error ends
/// the stream.
pub struct ResourceStream {
    inner: Pin<Box<dyn Stream<Item = Result<Box<dyn Resource>>> + Send>>,
}

impl ResourceStream {
    pub(crate) fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Box<dyn Resource>>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for ResourceStream {
    type Item = Result<Box<dyn Resource>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cma_core::{Space, error::Error};
    use futures_util::{StreamExt, stream};

    #[tokio::test]
    async fn forwards_items_in_order() {
        let items: Vec<Result<Box<dyn Resource>>> = vec![
            Ok(Box::new(Space::new("one"))),
            Ok(Box::new(Space::new("two"))),
        ];
        let names: Vec<String> = ResourceStream::new(stream::iter(items))
            .map(|r| r.unwrap().downcast_ref::<Space>().unwrap().name().to_string())
            .collect()
            .await;
        assert_eq!(names, ["one", "two"]);
    }

    #[tokio::test]
    async fn yields_errors() {
        let items: Vec<Result<Box<dyn Resource>>> = vec![Err(Error::UnknownType {
            type_tag: "Snippet".to_string(),
        })];
        let mut stream = ResourceStream::new(stream::iter(items));
        assert!(matches!(
            stream.next().await,
            Some(Err(Error::UnknownType { .. }))
        ));
        assert!(stream.next().await.is_none());
    }
}
