//! # Converters
//!
//! A converter turns the raw text of a chat message into a typed value. Every
//! converter is a pure function `&str -> Option<T>`: an input it cannot read is
//! reported as `None`, never as an error, so the input registry can treat any
//! absence uniformly as a mismatch.
//!
//! Converters are looked up by [`TypeTag`], which matches types exactly. A
//! converter registered for `i64` is never used for an `i32` expectation.
//!
//! ## Built-in converters
//!
//! [`ConverterRegistry::register_defaults`] installs converters for:
//!
//! - `String` (identity)
//! - [`Number`] (lenient, locale-aware, see [`NumberFormat`])
//! - `i32`, `i64`, `f32`, `f64`, `i8` (strict radix-10)
//! - `bool` (`true`/`yes`/`on` and `false`/`no`/`off`, case-insensitive)
//! - `std::time::Duration` (see [`DurationParser`])
//! - `uuid::Uuid` (canonical hyphenated form)

pub mod converter_registry;
pub mod duration;
pub mod number;

use std::{
    any::{type_name, TypeId},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

pub use converter_registry::ConverterRegistry;
pub use duration::{parse_duration, DurationParser, TimeUnit};
pub use number::{Number, NumberFormat};

/// Runtime identity of a target type.
///
/// Equality and hashing use only the [`TypeId`]; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeTag").field(&self.name).finish()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A named conversion from raw text to `T`.
///
/// Two converters are equal when their names are equal; the name identifies
/// the converter's slot in the [`ConverterRegistry`].
pub struct Converter<T> {
    name: Cow<'static, str>,
    parse: Arc<dyn Fn(&str) -> Option<T> + Send + Sync>,
}

impl<T> Converter<T> {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, parse: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parse: Arc::new(parse),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convert(&self, raw: &str) -> Option<T> {
        (self.parse)(raw)
    }
}

impl<T> Clone for Converter<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parse: Arc::clone(&self.parse),
        }
    }
}

impl<T> PartialEq for Converter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> fmt::Debug for Converter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .field("target", &type_name::<T>())
            .finish()
    }
}
