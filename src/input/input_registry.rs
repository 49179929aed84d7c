//! # Input Registry
//!
//! The InputRegistry correlates raw text events with the expectations waiting
//! for them. Each identifier owns a FIFO queue; an incoming event for that
//! identifier answers the oldest open expectation first.
//!
//! ## Dispatch
//!
//! For every [`InputRegistry::process`] call:
//!
//! 1. No queue for the identifier: the event is unsolicited and ignored.
//! 2. The head expectation is popped.
//! 3. A drained queue is removed from the map.
//! 4. A converter for its type is looked up. Without one, the invalid
//!    converter hook runs (by default it fails with
//!    [`InputError::MissingConverter`]).
//! 5. Conversion fails: the mismatch handler runs.
//! 6. Conversion succeeds but the ttl has elapsed and expiry is not ignored:
//!    the expired handler runs and the value is dropped.
//! 7. Otherwise the success handler runs, followed by the context handler
//!    when a context was supplied.
//!
//! The map never holds an empty queue, even when a converter or handler
//! panics.
//!
//! ## Concurrency
//!
//! Queues live in a sharded [`DashMap`], so unrelated identifiers do not
//! contend. A queue is only locked to push or pop; handlers run after the
//! lock is released and may register further expectations. Expiry is checked
//! lazily when an event pops the expectation.
//!
//! Handlers only have to be `Send`. Each queued expectation sits in its own
//! [`Mutex`], which is never locked: it is taken apart with `into_inner` once
//! popped.

use std::{
    collections::VecDeque,
    fmt::Debug,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use dashmap::DashMap;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use crate::{
    config::{InputConfig, MissingConverterPolicy},
    converter::{ConverterRegistry, TypeTag},
    event::ChatMessage,
    InputError, InputResult,
};

use super::expectation::{Expectation, PendingInput, Registered};

/// Identifier types usable as queue keys.
pub trait RegistryKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<K> RegistryKey for K where K: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Runs when an expectation's type has no converter. Returning `Ok` skips the
/// expectation; returning `Err` surfaces the error from `process`.
pub type InvalidConverterHook = Arc<dyn Fn(&TypeTag) -> InputResult<()> + Send + Sync>;

/// Outcome of a single [`InputRegistry::process`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Dispatch {
    /// No expectation was waiting for the identifier.
    Unsolicited,
    Success,
    Mismatch,
    Expired,
    /// The expectation had no converter and the hook chose to continue.
    Skipped,
}

pub fn fail_on_missing_converter(expected_type: &TypeTag) -> InputResult<()> {
    Err(InputError::MissingConverter {
        type_name: expected_type.name(),
    })
}

pub fn skip_missing_converter(expected_type: &TypeTag) -> InputResult<()> {
    warn!(%expected_type, "no converter registered, expectation dropped");
    Ok(())
}

impl MissingConverterPolicy {
    pub fn hook(&self) -> InvalidConverterHook {
        match self {
            MissingConverterPolicy::Fail => {
                Arc::new(fail_on_missing_converter) as InvalidConverterHook
            }
            MissingConverterPolicy::Skip => Arc::new(skip_missing_converter),
        }
    }
}

type Entry<K, C> = Mutex<Box<dyn PendingInput<K, C>>>;

struct RegistryInner<K, C> {
    /// Converters used to read raw input.
    converters: ConverterRegistry,
    /// Open expectations per identifier, oldest first. Never empty.
    pending: DashMap<K, VecDeque<Entry<K, C>>>,
    /// Decides what a missing converter means for `process`.
    on_invalid_converter: InvalidConverterHook,
}

/// Registry of expectations keyed by identifier `K`, with context type `C`.
///
/// Clones share the same queues.
pub struct InputRegistry<K, C> {
    /// Shared state; expectations hold it weakly.
    inner: Arc<RegistryInner<K, C>>,
}

/// Registry for chat input keyed by participant id.
pub type ChatInputRegistry = InputRegistry<Uuid, ChatMessage>;

impl<K, C> Clone for InputRegistry<K, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Non-owning reference to an [`InputRegistry`].
pub struct WeakInputRegistry<K, C> {
    /// Upgrades to the registry while any strong handle is alive.
    inner: Weak<RegistryInner<K, C>>,
}

impl<K, C> WeakInputRegistry<K, C> {
    pub fn upgrade(&self) -> Option<InputRegistry<K, C>> {
        self.inner.upgrade().map(|inner| InputRegistry { inner })
    }
}

impl<K, C> Clone for WeakInputRegistry<K, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<K, C> InputRegistry<K, C>
where
    K: RegistryKey,
    C: 'static,
{
    pub fn new(converters: ConverterRegistry) -> Self {
        Self::with_invalid_converter_hook(converters, Arc::new(fail_on_missing_converter))
    }

    pub fn with_invalid_converter_hook(
        converters: ConverterRegistry,
        on_invalid_converter: InvalidConverterHook,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                converters,
                pending: DashMap::new(),
                on_invalid_converter,
            }),
        }
    }

    /// A registry with the built-in converters and the failing hook.
    pub fn with_defaults() -> Self {
        Self::new(ConverterRegistry::with_defaults())
    }

    pub fn from_config(config: &InputConfig) -> Self {
        let converters = ConverterRegistry::new();
        if config.register_defaults {
            converters.register_defaults_with(config.number_format);
        }
        Self::with_invalid_converter_hook(converters, config.missing_converter.hook())
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.inner.converters
    }

    pub fn downgrade(&self) -> WeakInputRegistry<K, C> {
        WeakInputRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Starts an expectation for `id` bound to this registry.
    pub fn expect<T>(&self, id: K) -> Expectation<T, K, C>
    where
        T: Clone + 'static,
    {
        Expectation::new(id).bind(self.downgrade())
    }

    /// Appends `expectation` to the tail of its identifier's queue.
    #[instrument(level = "debug", skip(self, expectation), fields(id = ?expectation.id(), expected_type = %expectation.expected_type()))]
    pub fn register<T>(&self, expectation: Expectation<T, K, C>) -> Registered<T, K, C>
    where
        T: Clone + 'static,
    {
        let expectation = expectation.bind(self.downgrade());
        let id = expectation.id().clone();
        let handle = Registered::new(id.clone(), expectation.expected_type(), self.downgrade());

        let entry: Box<dyn PendingInput<K, C>> = Box::new(expectation);
        self.inner
            .pending
            .entry(id)
            .or_default()
            .push_back(Mutex::new(entry));
        trace!("expectation queued");
        handle
    }

    /// Feeds one raw event for `id` into the registry.
    ///
    /// # Parameters
    ///
    /// * `id` - Identifier the event came from
    /// * `raw` - Unparsed event text
    /// * `context` - Passed to context-aware success handlers when present
    ///
    /// # Errors
    ///
    /// Only what the invalid converter hook returns; unsolicited input,
    /// mismatches, and expiry are reported through [`Dispatch`].
    #[instrument(level = "debug", skip(self, context))]
    pub fn process(&self, id: &K, raw: &str, context: Option<&C>) -> InputResult<Dispatch> {
        let Some(pending) = self.pop_front(id) else {
            trace!("no expectation waiting");
            return Ok(Dispatch::Unsolicited);
        };

        let expected_type = pending.expected_type();
        let outcome = match pending.dispatch(raw, context, &self.inner.converters) {
            Some(dispatch) => Ok(dispatch),
            None => (self.inner.on_invalid_converter)(&expected_type).map(|()| Dispatch::Skipped),
        };

        debug!(%expected_type, ?outcome, "input processed");
        outcome
    }

    /// Number of expectations waiting for `id`.
    pub fn pending_count(&self, id: &K) -> usize {
        self.inner.pending.get(id).map_or(0, |queue| queue.len())
    }

    pub fn is_waiting(&self, id: &K) -> bool {
        self.pending_count(id) > 0
    }

    /// Number of identifiers with at least one queued expectation.
    pub fn waiting_identifiers(&self) -> usize {
        self.inner.pending.len()
    }

    /// Takes the head expectation and drops the queue if that drained it.
    fn pop_front(&self, id: &K) -> Option<Box<dyn PendingInput<K, C>>> {
        let entry = self.inner.pending.get_mut(id)?.pop_front();
        self.inner.pending.remove_if(id, |_, queue| queue.is_empty());
        entry.map(|entry| entry.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::converter::Converter;

    type Registry = InputRegistry<&'static str, ()>;

    #[test]
    fn test_unsolicited_input_is_ignored() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.process(&"u", "42", None).unwrap(), Dispatch::Unsolicited);
        assert_eq!(registry.waiting_identifiers(), 0);
    }

    #[test]
    fn test_drained_queue_is_removed() {
        let registry = Registry::with_defaults();
        registry.expect::<i32>("u").submit().unwrap();
        registry.expect::<i32>("u").submit().unwrap();
        assert_eq!(registry.pending_count(&"u"), 2);
        assert_eq!(registry.waiting_identifiers(), 1);

        registry.process(&"u", "1", None).unwrap();
        assert_eq!(registry.pending_count(&"u"), 1);
        assert_eq!(registry.waiting_identifiers(), 1);

        registry.process(&"u", "2", None).unwrap();
        assert!(!registry.is_waiting(&"u"));
        assert_eq!(registry.waiting_identifiers(), 0);
    }

    #[test]
    fn test_missing_converter_fails_by_default() {
        let registry = Registry::new(ConverterRegistry::new());
        registry.expect::<i32>("u").submit().unwrap();

        let result = registry.process(&"u", "42", None);
        match result {
            Err(InputError::MissingConverter { type_name }) => assert_eq!(type_name, "i32"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(registry.waiting_identifiers(), 0);
    }

    #[test]
    fn test_missing_converter_can_be_skipped() {
        let registry = Registry::with_invalid_converter_hook(
            ConverterRegistry::new(),
            MissingConverterPolicy::Skip.hook(),
        );
        registry.expect::<i32>("u").submit().unwrap();
        assert_eq!(registry.process(&"u", "42", None).unwrap(), Dispatch::Skipped);
    }

    #[test]
    fn test_custom_hook_sees_type() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let registry = Registry::with_invalid_converter_hook(
            ConverterRegistry::new(),
            Arc::new(move |tag: &TypeTag| -> InputResult<()> {
                recorder.lock().unwrap().push(tag.name());
                Ok(())
            }),
        );
        registry.expect::<u16>("u").submit().unwrap();
        registry.process(&"u", "1", None).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["u16"]);
    }

    #[test]
    fn test_uses_first_registered_converter() {
        let converters = ConverterRegistry::new();
        converters.register(Converter::new("doubled", |raw: &str| {
            raw.parse::<u32>().ok().map(|v| v * 2)
        }));
        converters.register(Converter::new("plain", |raw: &str| raw.parse::<u32>().ok()));
        let registry = Registry::new(converters);

        let seen = Arc::new(Mutex::new(None));
        let recorder = seen.clone();
        registry
            .expect::<u32>("u")
            .then(move |value| *recorder.lock().unwrap() = Some(value))
            .submit()
            .unwrap();

        registry.process(&"u", "21", None).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(42));
    }

    #[test]
    fn test_handler_may_register_follow_up() {
        let registry = Registry::with_defaults();
        let weak = registry.downgrade();
        registry
            .expect::<String>("u")
            .then(move |_| {
                if let Some(registry) = weak.upgrade() {
                    registry.expect::<i32>("u").submit().unwrap();
                }
            })
            .submit()
            .unwrap();

        assert_eq!(registry.process(&"u", "name", None).unwrap(), Dispatch::Success);
        assert_eq!(registry.pending_count(&"u"), 1);
    }

    #[test]
    fn test_panicking_converter_leaves_no_empty_queue() {
        let converters = ConverterRegistry::new();
        converters.register(Converter::new("exploding", |_: &str| -> Option<u8> {
            panic!("converter failure")
        }));
        let registry = Registry::new(converters);
        registry.expect::<u8>("u").submit().unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| registry.process(&"u", "1", None)));
        assert!(result.is_err());
        assert_eq!(registry.pending_count(&"u"), 0);
        assert_eq!(registry.waiting_identifiers(), 0);

        registry.expect::<u8>("u").submit().unwrap();
        assert_eq!(registry.waiting_identifiers(), 1);
    }

    #[test]
    fn test_panicking_handler_leaves_no_empty_queue() {
        let registry = Registry::with_defaults();
        registry
            .expect::<i32>("u")
            .then(|_| panic!("handler failure"))
            .submit()
            .unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| registry.process(&"u", "1", None)));
        assert!(result.is_err());
        assert_eq!(registry.waiting_identifiers(), 0);
        assert_eq!(registry.process(&"u", "2", None).unwrap(), Dispatch::Unsolicited);
    }

    #[test]
    fn test_from_config_without_defaults() {
        let config = InputConfig {
            register_defaults: false,
            ..InputConfig::default()
        };
        let registry = Registry::from_config(&config);
        assert!(!registry.converters().contains::<i32>());
    }

    #[test]
    fn test_dispatch_display() {
        assert_eq!(Dispatch::Mismatch.to_string(), "Mismatch");
    }
}
