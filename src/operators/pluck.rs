//! Field projection.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::config::{ConfigBinder, Configuration, Param, Resolver};
use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

/// Values whose fields can be looked up by key.
///
/// A missing field is `None`, never an error.
pub trait Pluck<K> {
    /// Type of the looked-up field.
    type Field: Clone;

    /// The field under `key`, if present.
    fn pluck(&self, key: &K) -> Option<Self::Field>;
}

impl<K, V, S> Pluck<K> for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    type Field = V;

    fn pluck(&self, key: &K) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<K: Ord, V: Clone> Pluck<K> for BTreeMap<K, V> {
    type Field = V;

    fn pluck(&self, key: &K) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<T: Clone> Pluck<usize> for Vec<T> {
    type Field = T;

    fn pluck(&self, key: &usize) -> Option<T> {
        self.get(*key).cloned()
    }
}

/// Configuration of [`pluck`].
#[derive(Clone)]
pub struct PluckConfig<'a, K> {
    /// Key of the field to project; may change while running.
    pub key: Param<'a, K>,
}

impl<'a, K> PluckConfig<'a, K> {
    /// Projects the field under `key`.
    pub fn new(key: impl Into<Param<'a, K>>) -> Self {
        PluckConfig { key: key.into() }
    }
}

/// Resolved [`PluckConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct PluckParams<K> {
    #[allow(missing_docs)]
    pub key: K,
}

impl<'a, K: Clone + 'a> Configuration<'a> for PluckConfig<'a, K> {
    type Resolved = PluckParams<K>;

    fn bind(&self, binder: &mut ConfigBinder<'a>) -> Resolver<'a, PluckParams<K>> {
        let key = binder.bind("key", &self.key);
        Box::new(move || Some(PluckParams { key: key.get()? }))
    }
}

/// Looks up `key` in `value`.
pub fn pluck_field<V, K>(value: &V, params: &PluckParams<K>, _: &mut ()) -> Result<Option<V::Field>, StreamError>
where
    V: Pluck<K>,
{
    Ok(value.pluck(&params.key))
}

/// Projects one field out of every value; missing fields come out as `None`.
pub fn pluck<'a, V, K>(upstream: &Stream<'a, V>, config: PluckConfig<'a, K>) -> Stream<'a, Option<V::Field>>
where
    V: Pluck<K> + Clone + 'a,
    K: Clone + 'a,
{
    Operator::new("pluck", pluck_field::<V, K>).with_config(upstream, config)
}
