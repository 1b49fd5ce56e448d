//! A boxed, type-erased future — used for staged handle callbacks and the
//! user-supplied [`crate::client::StasisHandler`], both of which need to
//! carry an arbitrary `async move { ... }` block behind a plain function
//! pointer-shaped value.

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
