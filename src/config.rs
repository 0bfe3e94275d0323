//! Operator configuration whose entries are either fixed or live.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::error::StreamError;
use crate::stream::{Listener, Stream, Subscription};

/// One configuration entry.
pub enum Param<'a, T> {
    /// Fixed when the derived stream is built.
    Static(T),
    /// Replaced by every value the stream emits.
    Dynamic(Stream<'a, T>),
}

impl<'a, T: Clone> Clone for Param<'a, T> {
    fn clone(&self) -> Self {
        match self {
            Param::Static(value) => Param::Static(value.clone()),
            Param::Dynamic(stream) => Param::Dynamic(stream.clone()),
        }
    }
}

impl<'a, T> From<T> for Param<'a, T> {
    fn from(value: T) -> Self {
        Param::Static(value)
    }
}

impl<'a, T> From<Stream<'a, T>> for Param<'a, T> {
    fn from(stream: Stream<'a, T>) -> Self {
        Param::Dynamic(stream)
    }
}

/// Latest resolved value of a bound entry; empty until a dynamic entry emits.
pub struct Slot<T>(Rc<RefCell<Option<T>>>);

impl<T: Clone> Slot<T> {
    /// The current value, if any.
    pub fn get(&self) -> Option<T> {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot(self.0.clone())
    }
}

/// Produces a snapshot of the resolved configuration, or `None` while some
/// entry has no value yet.
pub type Resolver<'a, R> = Box<dyn Fn() -> Option<R> + 'a>;

/// A configuration a derived stream can bind to on start.
///
/// Implementations bind each entry through the [`ConfigBinder`], in the order
/// the entries should be subscribed, and return a resolver reading the slots.
pub trait Configuration<'a> {
    /// Snapshot handed to the transform.
    type Resolved;

    /// Binds every entry for one run of a derived stream.
    fn bind(&self, binder: &mut ConfigBinder<'a>) -> Resolver<'a, Self::Resolved>;
}

impl<'a> Configuration<'a> for () {
    type Resolved = ();

    fn bind(&self, _binder: &mut ConfigBinder<'a>) -> Resolver<'a, ()> {
        Box::new(|| Some(()))
    }
}

type UpdateFn<'a> = Rc<dyn Fn() + 'a>;
type ErrorFn<'a> = Rc<dyn Fn(&'static str, &StreamError) + 'a>;

/// Subscribes dynamic entries on behalf of one derived-stream run.
pub struct ConfigBinder<'a> {
    on_update: UpdateFn<'a>,
    on_error: ErrorFn<'a>,
    subscriptions: Vec<(&'static str, Subscription<'a>)>,
}

impl<'a> ConfigBinder<'a> {
    pub(crate) fn new(on_update: UpdateFn<'a>, on_error: ErrorFn<'a>) -> Self {
        ConfigBinder { on_update, on_error, subscriptions: Vec::new() }
    }

    /// Resolves a static entry at once, or subscribes to a dynamic one.
    pub fn bind<T: Clone + 'a>(&mut self, key: &'static str, param: &Param<'a, T>) -> Slot<T> {
        match param {
            Param::Static(value) => Slot(Rc::new(RefCell::new(Some(value.clone())))),
            Param::Dynamic(stream) => {
                let slot = Slot(Rc::new(RefCell::new(None)));
                let listener = EntryListener {
                    key,
                    slot: slot.clone(),
                    on_update: self.on_update.clone(),
                    on_error: self.on_error.clone(),
                };
                let subscription = stream.subscribe_listener(listener);
                self.subscriptions.push((key, subscription));
                slot
            }
        }
    }

    pub(crate) fn into_subscriptions(self) -> Vec<(&'static str, Subscription<'a>)> {
        self.subscriptions
    }
}

struct EntryListener<'a, T> {
    key: &'static str,
    slot: Slot<T>,
    on_update: UpdateFn<'a>,
    on_error: ErrorFn<'a>,
}

impl<'a, T: Clone> Listener<T> for EntryListener<'a, T> {
    fn next(&mut self, value: &T) {
        *self.slot.0.borrow_mut() = Some(value.clone());
        (self.on_update)();
    }

    fn error(&mut self, error: &StreamError) {
        (self.on_error)(self.key, error);
    }

    fn complete(&mut self) {
        // keeps its last value; the derived stream lives on
        trace!(key = self.key, "configuration entry completed");
    }
}
