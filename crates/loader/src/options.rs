//! Typed, extensible per-request options.
//!
//! Loaders often need request-scoped configuration that the core [`Request`]
//! type should not know about, such as which server environment to apply.
//! Options solve this with a bag keyed by *option kind*: a marker type that
//! declares its value type and a default. Lookups can never fail; a missing
//! or type-mismatched entry yields the kind's declared default.
//!
//! # Example
//! ```
//! use http_loader::{RequestOption, RequestOptions};
//!
//! struct Attempts;
//!
//! impl RequestOption for Attempts {
//!     type Value = u32;
//!
//!     fn default_value() -> u32 {
//!         1
//!     }
//! }
//!
//! let mut options = RequestOptions::new();
//! assert_eq!(options.get::<Attempts>(), 1);
//!
//! options.set::<Attempts>(3);
//! assert_eq!(options.get::<Attempts>(), 3);
//! ```
//!
//! [`Request`]: crate::request::Request

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An option kind: a distinct type acting as the lookup key, with a declared
/// value type and a default used when the bag holds nothing usable.
pub trait RequestOption: 'static {
    /// The value stored under this kind.
    type Value: Clone + Send + Sync + 'static;

    /// The value reported when the kind is absent from a bag.
    fn default_value() -> Self::Value;
}

/// The per-request option bag.
///
/// Values are stored behind `Arc` and treated as immutable; `set` replaces
/// the slot rather than mutating through it, so cloned requests never alias
/// mutable state.
#[derive(Clone, Default)]
pub struct RequestOptions {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the value stored for `O`.
    ///
    /// Returns the stored value when present and of the declared type,
    /// otherwise `O`'s default. This is total: it never fails and never
    /// panics.
    pub fn get<O: RequestOption>(&self) -> O::Value {
        self.values
            .get(&TypeId::of::<O>())
            .and_then(|stored| stored.downcast_ref::<O::Value>())
            .cloned()
            .unwrap_or_else(O::default_value)
    }

    /// Stores `value` under `O`, replacing any previous value.
    pub fn set<O: RequestOption>(&mut self, value: O::Value) {
        self.values.insert(TypeId::of::<O>(), Arc::new(value));
    }

    /// Whether a value has been stored for `O` (regardless of its type).
    pub fn contains<O: RequestOption>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<O>())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions").field("len", &self.values.len()).finish()
    }
}
