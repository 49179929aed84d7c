use std::{
    any::Any,
    borrow::Cow,
    sync::Arc,
    time::Duration,
};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{
    duration::parse_duration,
    number::{self, Number, NumberFormat},
    Converter, TypeTag,
};

/// One registered converter, type-erased.
struct ConverterSlot {
    name: Cow<'static, str>,
    converter: Box<dyn Any + Send + Sync>,
}

impl ConverterSlot {
    fn new<T: 'static>(converter: Converter<T>) -> Self {
        Self {
            name: Cow::Owned(converter.name().to_string()),
            converter: Box::new(converter),
        }
    }

    fn get<T: 'static>(&self) -> Option<Converter<T>> {
        self.converter.downcast_ref::<Converter<T>>().cloned()
    }
}

/// # Converter Registry
///
/// Maps a [`TypeTag`] to the converters able to produce that type, in
/// registration order. Lookups match the type exactly.
///
/// Clones share the same underlying map.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    converters: Arc<DashMap<TypeTag, Vec<ConverterSlot>>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in converters.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// The first converter registered for `T`.
    pub fn find<T: 'static>(&self) -> Option<Converter<T>> {
        self.converters
            .get(&TypeTag::of::<T>())?
            .first()
            .and_then(ConverterSlot::get)
    }

    /// Every converter registered for `T`, oldest first.
    pub fn find_all<T: 'static>(&self) -> Vec<Converter<T>> {
        self.converters
            .get(&TypeTag::of::<T>())
            .map(|slots| slots.iter().filter_map(ConverterSlot::get).collect())
            .unwrap_or_default()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.converters
            .get(&TypeTag::of::<T>())
            .is_some_and(|slots| !slots.is_empty())
    }

    /// Appends `converter` unless one with the same name is already
    /// registered for `T`. Returns whether it was added.
    pub fn register<T: 'static>(&self, converter: Converter<T>) -> bool {
        let tag = TypeTag::of::<T>();
        let mut slots = self.converters.entry(tag).or_default();
        if slots.iter().any(|slot| slot.name == converter.name()) {
            debug!(%tag, converter = converter.name(), "converter already registered");
            return false;
        }
        debug!(%tag, converter = converter.name(), "converter registered");
        slots.push(ConverterSlot::new(converter));
        true
    }

    /// Replaces the converter with the same name in place, keeping its
    /// position. Returns `false` and changes nothing when there is none.
    pub fn update<T: 'static>(&self, converter: Converter<T>) -> bool {
        let tag = TypeTag::of::<T>();
        let Some(mut slots) = self.converters.get_mut(&tag) else {
            return false;
        };
        match slots.iter_mut().find(|slot| slot.name == converter.name()) {
            Some(slot) => {
                debug!(%tag, converter = converter.name(), "converter updated");
                *slot = ConverterSlot::new(converter);
                true
            }
            None => false,
        }
    }

    /// Registers the built-in converters with the default [`NumberFormat`].
    ///
    /// Safe to call repeatedly; built-ins keep their names, so later calls
    /// add nothing.
    pub fn register_defaults(&self) -> &Self {
        self.register_defaults_with(NumberFormat::default())
    }

    pub fn register_defaults_with(&self, number_format: NumberFormat) -> &Self {
        self.register(Converter::new("builtin.string", |raw: &str| {
            Some(raw.to_string())
        }));
        self.register(Converter::<Number>::new("builtin.number", move |raw: &str| {
            number_format.parse(raw)
        }));
        self.register(Converter::new("builtin.integer", number::parse_integer));
        self.register(Converter::new("builtin.long", number::parse_long));
        self.register(Converter::new("builtin.double", number::parse_double));
        self.register(Converter::new("builtin.float", number::parse_float));
        self.register(Converter::new("builtin.byte", number::parse_byte));
        self.register(Converter::new("builtin.boolean", parse_boolean));
        self.register(Converter::<Duration>::new("builtin.duration", parse_duration));
        self.register(Converter::new("builtin.uuid", parse_uuid));
        self
    }
}

pub fn parse_boolean(raw: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["true", "yes", "on"];
    const FALSE: [&str; 3] = ["false", "no", "off"];

    if TRUE.iter().any(|token| raw.eq_ignore_ascii_case(token)) {
        Some(true)
    } else if FALSE.iter().any(|token| raw.eq_ignore_ascii_case(token)) {
        Some(false)
    } else {
        None
    }
}

/// Accepts only the hyphenated `8-4-4-4-12` form.
pub fn parse_uuid(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::try_parse(raw).ok()
}
