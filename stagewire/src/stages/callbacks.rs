//! Ordered, append-only subscriber lists.

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A type-erased async subscriber.
pub type Callback<E, R = ()> = Arc<dyn Fn(E) -> BoxFuture<'static, R> + Send + Sync>;

/// An ordered list of async subscribers receiving values of type `E`.
///
/// Subscribers are invoked sequentially in registration order. The list is
/// copied out of its lock before any subscriber runs, so a subscriber may
/// register further subscribers without deadlocking.
pub struct CallbackList<E, R = ()> {
    callbacks: RwLock<Vec<Callback<E, R>>>,
}

impl<E, R> Default for CallbackList<E, R> {
    fn default() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
        }
    }
}

impl<E, R> CallbackList<E, R>
where
    E: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber. No duplicate detection is performed.
    pub fn push<F, Fut>(&self, callback: F)
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let callback: Callback<E, R> = Arc::new(move |value: E| callback(value).boxed());
        self.push_boxed(callback);
    }

    /// Appends an already type-erased subscriber.
    pub fn push_boxed(&self, callback: Callback<E, R>) {
        self.callbacks.write().push(callback);
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Returns true if no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    fn current(&self) -> Vec<Callback<E, R>> {
        self.callbacks.read().clone()
    }
}

impl<E> CallbackList<E, ()>
where
    E: Clone + Send + Sync + 'static,
{
    /// Invokes every subscriber with a clone of `value`.
    pub async fn emit(&self, value: &E) {
        for callback in self.current() {
            callback(value.clone()).await;
        }
    }
}

impl<E, Err> CallbackList<E, Result<(), Err>>
where
    E: Clone + Send + Sync + 'static,
    Err: Send + 'static,
{
    /// Invokes subscribers in order, stopping at the first failure.
    pub async fn try_emit(&self, value: &E) -> Result<(), Err> {
        for callback in self.current() {
            callback(value.clone()).await?;
        }
        Ok(())
    }
}

impl<E, R> fmt::Debug for CallbackList<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.callbacks.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_emit_in_registration_order() {
        let list: CallbackList<u32> = CallbackList::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            list.push(move |value: u32| {
                let seen = seen.clone();
                async move {
                    seen.lock().push(format!("{tag}:{value}"));
                }
            });
        }

        list.emit(&7).await;

        assert_eq!(list.len(), 3);
        assert_eq!(*seen.lock(), vec!["first:7", "second:7", "third:7"]);
    }

    #[tokio::test]
    async fn test_try_emit_stops_at_first_failure() {
        let list: CallbackList<u32, Result<(), String>> = CallbackList::new();
        let calls = Arc::new(Mutex::new(0));

        let c = calls.clone();
        list.push(move |_| {
            let c = c.clone();
            async move {
                *c.lock() += 1;
                Err("boom".to_string())
            }
        });
        let c = calls.clone();
        list.push(move |_| {
            let c = c.clone();
            async move {
                *c.lock() += 1;
                Ok(())
            }
        });

        let result = list.try_emit(&1).await;

        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let list: CallbackList<String, Result<(), String>> = CallbackList::default();
        assert!(list.is_empty());
        assert_eq!(list.try_emit(&"x".to_string()).await, Ok(()));
    }

    #[test]
    fn test_duplicate_registration_is_kept() {
        let list: CallbackList<u8> = CallbackList::new();
        let cb: Callback<u8> = Arc::new(|_: u8| async {}.boxed());
        list.push_boxed(cb.clone());
        list.push_boxed(cb);
        assert_eq!(list.len(), 2);
    }
}
