//! # Expectation
//!
//! An [`Expectation`] is a pending typed request: "the next message from this
//! identifier should be read as `T`". It is configured with a fluent builder
//! and becomes immutable once handed to an [`InputRegistry`].
//!
//! ```rust
//! # use input_await::input::{Expectation, InputRegistry};
//! # use std::time::Duration;
//! let registry: InputRegistry<u64, ()> = InputRegistry::with_defaults();
//!
//! Expectation::<i32, _, _>::new(7)
//!     .until(Duration::from_secs(30))
//!     .then(|age| println!("age: {}", age))
//!     .mismatch(|raw| println!("'{}' is not a number", raw))
//!     .expired(|raw| println!("'{}' came too late", raw))
//!     .register(&registry);
//!
//! assert_eq!(registry.pending_count(&7), 1);
//! ```

use std::{marker::PhantomData, time::Duration};

use tracing::trace;

use crate::{
    converter::{ConverterRegistry, Number, TypeTag},
    timestamp::Timestamp,
    InputError, InputResult,
};

use super::input_registry::{Dispatch, InputRegistry, RegistryKey, WeakInputRegistry};

pub type SuccessHandler<T> = Box<dyn FnOnce(T) + Send>;
pub type ContextHandler<T, C> = Box<dyn FnOnce(T, &C) + Send>;
pub type RawHandler = Box<dyn FnOnce(&str) + Send>;

/// A pending typed request for the next input of identifier `K`.
///
/// `C` is the context type handed to [`Expectation::then_with_context`]
/// handlers; the registry passes it through untouched.
pub struct Expectation<T, K, C> {
    id: K,
    expected_type: TypeTag,
    created_at: Timestamp,
    ttl: Option<Duration>,
    ignore_expired: bool,
    on_success: Option<SuccessHandler<T>>,
    on_success_with_context: Option<ContextHandler<T, C>>,
    on_mismatch: Option<RawHandler>,
    on_expired: Option<RawHandler>,
    registry: Option<WeakInputRegistry<K, C>>,
}

impl<T, K, C> Expectation<T, K, C>
where
    T: Clone + 'static,
    K: RegistryKey,
    C: 'static,
{
    pub fn new(id: K) -> Self {
        Self {
            id,
            expected_type: TypeTag::of::<T>(),
            created_at: Timestamp::now(),
            ttl: None,
            ignore_expired: false,
            on_success: None,
            on_success_with_context: None,
            on_mismatch: None,
            on_expired: None,
            registry: None,
        }
    }

    /// Expire the expectation once `ttl` has passed since its timestamp.
    pub fn until(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn then<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Runs after the plain success handler, and only when the triggering
    /// event carried a context.
    pub fn then_with_context<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(T, &C) + Send + 'static,
    {
        self.on_success_with_context = Some(Box::new(handler));
        self
    }

    pub fn mismatch<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&str) + Send + 'static,
    {
        self.on_mismatch = Some(Box::new(handler));
        self
    }

    pub fn expired<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&str) + Send + 'static,
    {
        self.on_expired = Some(Box::new(handler));
        self
    }

    /// Overrides the creation timestamp the ttl is measured from.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.created_at = timestamp;
        self
    }

    /// Resets the creation timestamp to now.
    pub fn touch(self) -> Self {
        self.timestamp(Timestamp::now())
    }

    /// Deliver late answers to the success handler instead of the expired one.
    pub fn ignore_expired(mut self) -> Self {
        self.ignore_expired = true;
        self
    }

    pub fn register(self, registry: &InputRegistry<K, C>) -> Registered<T, K, C> {
        registry.register(self)
    }

    /// Registers into the registry this expectation was created from.
    ///
    /// # Errors
    ///
    /// [`InputError::RegistryUnavailable`] when the expectation is not bound to
    /// a registry, or the registry has been dropped.
    pub fn submit(self) -> InputResult<Registered<T, K, C>> {
        let registry = self
            .registry
            .as_ref()
            .and_then(WeakInputRegistry::upgrade)
            .ok_or(InputError::RegistryUnavailable)?;
        Ok(registry.register(self))
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn expected_type(&self) -> TypeTag {
        self.expected_type
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn ignores_expired(&self) -> bool {
        self.ignore_expired
    }

    pub fn has_expired(&self) -> bool {
        self.ttl
            .is_some_and(|ttl| self.created_at.has_elapsed(ttl))
    }

    /// The registry this expectation is bound to, while it is alive.
    pub fn registry(&self) -> Option<InputRegistry<K, C>> {
        self.registry.as_ref().and_then(WeakInputRegistry::upgrade)
    }

    pub(crate) fn bind(mut self, registry: WeakInputRegistry<K, C>) -> Self {
        self.registry = Some(registry);
        self
    }

    fn deliver(self, value: T, context: Option<&C>) {
        let contextual = match (context, self.on_success_with_context) {
            (Some(context), Some(handler)) => Some((context, handler)),
            _ => None,
        };
        match (self.on_success, contextual) {
            (Some(handler), Some((context, contextual))) => {
                handler(value.clone());
                contextual(value, context);
            }
            (Some(handler), None) => handler(value),
            (None, Some((context, contextual))) => contextual(value, context),
            (None, None) => {}
        }
    }
}

/// Queue entry view of an [`Expectation`] with its value type erased.
pub(crate) trait PendingInput<K, C>: Send {
    fn expected_type(&self) -> TypeTag;

    /// Converts `raw` and runs exactly one outcome.
    ///
    /// `None` means no converter exists for the expected type and nothing ran.
    fn dispatch(
        self: Box<Self>,
        raw: &str,
        context: Option<&C>,
        converters: &ConverterRegistry,
    ) -> Option<Dispatch>;
}

impl<T, K, C> PendingInput<K, C> for Expectation<T, K, C>
where
    T: Clone + 'static,
    K: RegistryKey,
    C: 'static,
{
    fn expected_type(&self) -> TypeTag {
        self.expected_type
    }

    fn dispatch(
        self: Box<Self>,
        raw: &str,
        context: Option<&C>,
        converters: &ConverterRegistry,
    ) -> Option<Dispatch> {
        let converter = converters.find::<T>()?;
        let expectation = *self;

        let Some(value) = converter.convert(raw) else {
            trace!(converter = converter.name(), "input mismatch");
            if let Some(handler) = expectation.on_mismatch {
                handler(raw);
            }
            return Some(Dispatch::Mismatch);
        };

        if expectation.has_expired() && !expectation.ignore_expired {
            trace!(created_at = %expectation.created_at, "input expired");
            if let Some(handler) = expectation.on_expired {
                handler(raw);
            }
            return Some(Dispatch::Expired);
        }

        expectation.deliver(value, context);
        Some(Dispatch::Success)
    }
}

/// Handle returned by registration.
///
/// Holds the identifier, the expected type, and a weak reference to the
/// owning registry, so follow-up expectations for the same identifier can be
/// built without keeping the registry alive.
pub struct Registered<T, K, C> {
    id: K,
    expected_type: TypeTag,
    registry: WeakInputRegistry<K, C>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, K, C> Registered<T, K, C>
where
    T: Clone + 'static,
    K: RegistryKey,
    C: 'static,
{
    pub(crate) fn new(id: K, expected_type: TypeTag, registry: WeakInputRegistry<K, C>) -> Self {
        Self {
            id,
            expected_type,
            registry,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn expected_type(&self) -> TypeTag {
        self.expected_type
    }

    pub fn registry(&self) -> Option<InputRegistry<K, C>> {
        self.registry.upgrade()
    }

    /// A new expectation for the same identifier, bound to the same registry.
    /// Configure it, then call [`Expectation::submit`].
    pub fn await_type<U>(&self) -> Expectation<U, K, C>
    where
        U: Clone + 'static,
    {
        Expectation::new(self.id.clone()).bind(self.registry.clone())
    }

    pub fn await_same(&self) -> Expectation<T, K, C> {
        self.await_type()
    }

    pub fn await_string(&self) -> Expectation<String, K, C> {
        self.await_type()
    }

    pub fn await_number(&self) -> Expectation<Number, K, C> {
        self.await_type()
    }

    pub fn await_integer(&self) -> Expectation<i32, K, C> {
        self.await_type()
    }

    pub fn await_long(&self) -> Expectation<i64, K, C> {
        self.await_type()
    }

    pub fn await_double(&self) -> Expectation<f64, K, C> {
        self.await_type()
    }

    pub fn await_float(&self) -> Expectation<f32, K, C> {
        self.await_type()
    }

    pub fn await_byte(&self) -> Expectation<i8, K, C> {
        self.await_type()
    }

    pub fn await_boolean(&self) -> Expectation<bool, K, C> {
        self.await_type()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        sync::{Arc, Mutex},
    };

    use super::*;

    type Registry = InputRegistry<u32, String>;

    #[test]
    fn test_builder_configuration() {
        let created_at = Timestamp::now();
        let expectation = Expectation::<i32, u32, String>::new(1)
            .until(Duration::from_secs(5))
            .timestamp(created_at)
            .ignore_expired();

        assert_eq!(*expectation.id(), 1);
        assert_eq!(expectation.expected_type(), TypeTag::of::<i32>());
        assert_eq!(expectation.ttl(), Some(Duration::from_secs(5)));
        assert_eq!(expectation.created_at(), created_at);
        assert!(expectation.ignores_expired());
        assert!(expectation.registry().is_none());
    }

    #[test]
    fn test_has_expired() {
        let fresh = Expectation::<i32, u32, String>::new(1).until(Duration::from_secs(60));
        assert!(!fresh.has_expired());

        let stale = Expectation::<i32, u32, String>::new(1)
            .until(Duration::from_secs(1))
            .timestamp(Timestamp::now().checked_sub(Duration::from_secs(5)).unwrap());
        assert!(stale.has_expired());

        let forever = Expectation::<i32, u32, String>::new(1)
            .timestamp(Timestamp::now().checked_sub(Duration::from_secs(5)).unwrap());
        assert!(!forever.has_expired());
    }

    #[test]
    fn test_touch_resets_timestamp() {
        let stale = Expectation::<i32, u32, String>::new(1)
            .until(Duration::from_secs(1))
            .timestamp(Timestamp::now().checked_sub(Duration::from_secs(5)).unwrap())
            .touch();
        assert!(!stale.has_expired());
    }

    #[test]
    fn test_submit_requires_binding() {
        let unbound = Expectation::<i32, u32, String>::new(1);
        assert!(matches!(unbound.submit(), Err(InputError::RegistryUnavailable)));
    }

    #[test]
    fn test_submit_after_registry_dropped() {
        let registry = Registry::with_defaults();
        let bound = registry.expect::<i32>(1);
        drop(registry);
        assert!(matches!(bound.submit(), Err(InputError::RegistryUnavailable)));
    }

    #[test]
    fn test_both_success_handlers_fire_with_context() {
        let registry = Registry::with_defaults();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let plain = seen.clone();
        let contextual = seen.clone();
        registry
            .expect::<i32>(1)
            .then(move |value| plain.lock().unwrap().push(format!("plain {}", value)))
            .then_with_context(move |value, context: &String| {
                contextual
                    .lock()
                    .unwrap()
                    .push(format!("context {} {}", value, context))
            })
            .submit()
            .unwrap();

        let outcome = registry.process(&1, "5", Some(&"ctx".to_string())).unwrap();
        assert_eq!(outcome, Dispatch::Success);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["plain 5".to_string(), "context 5 ctx".to_string()]
        );
    }

    #[test]
    fn test_context_handler_skipped_without_context() {
        let registry = Registry::with_defaults();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let contextual = seen.clone();
        registry
            .expect::<i32>(1)
            .then_with_context(move |value, _: &String| contextual.lock().unwrap().push(value))
            .submit()
            .unwrap();

        assert_eq!(registry.process(&1, "5", None).unwrap(), Dispatch::Success);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handlers_need_not_be_sync() {
        let registry = Registry::with_defaults();
        let seen = Arc::new(Mutex::new(None));

        let last = Cell::new(0);
        let recorder = seen.clone();
        registry
            .expect::<i32>(1)
            .then(move |value| {
                last.set(value);
                *recorder.lock().unwrap() = Some(last.get());
            })
            .submit()
            .unwrap();

        assert_eq!(registry.process(&1, "8", None).unwrap(), Dispatch::Success);
        assert_eq!(*seen.lock().unwrap(), Some(8));
    }

    #[test]
    fn test_registered_handle_chains_follow_ups() {
        let registry = Registry::with_defaults();
        let handle = registry.expect::<String>(9).submit().unwrap();

        assert_eq!(*handle.id(), 9);
        assert_eq!(handle.expected_type(), TypeTag::of::<String>());
        assert!(handle.registry().is_some());

        let follow_up = handle.await_integer();
        assert_eq!(*follow_up.id(), 9);
        assert_eq!(follow_up.expected_type(), TypeTag::of::<i32>());
        follow_up.submit().unwrap();
        handle.await_same().submit().unwrap();

        assert_eq!(registry.pending_count(&9), 3);
    }
}
