//! Builds derived streams out of a transform and a [`Configuration`].
//!
//! A derived stream keeps the last upstream value and the last value of every
//! configuration entry. Each upstream emission and each dynamic entry emission
//! runs the transform exactly once against those latest values and pushes the
//! result downstream. Nothing is buffered: intermediate values that were
//! overwritten before a recomputation are never seen.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::config::{ConfigBinder, Configuration, Resolver};
use crate::error::StreamError;
use crate::stream::{Listener, Producer, Sink, Stream, Subscription};

/// A reusable operator: a named transform waiting for an upstream and a
/// configuration.
///
/// The transform receives the latest upstream value, the resolved
/// configuration and a context that lives as long as one run of the derived
/// stream. Returning `Err` terminates the derived stream.
pub struct Operator<F> {
    name: &'static str,
    transform: Rc<F>,
}

impl<F> Clone for Operator<F> {
    fn clone(&self) -> Self {
        Operator { name: self.name, transform: self.transform.clone() }
    }
}

impl<F> Operator<F> {
    /// `name` shows up in logs; `transform` runs on every recomputation.
    pub fn new(name: &'static str, transform: F) -> Self {
        Operator { name, transform: Rc::new(transform) }
    }

    /// Derives a stream from `upstream`, recomputed whenever it or any
    /// dynamic entry of `config` emits.
    pub fn with_config<'a, In, Out, C, Ctx>(&self, upstream: &Stream<'a, In>, config: C) -> Stream<'a, Out>
    where
        In: Clone + 'a,
        Out: 'a,
        C: Configuration<'a> + 'a,
        C::Resolved: 'a,
        Ctx: Default + 'a,
        F: Fn(&In, &C::Resolved, &mut Ctx) -> Result<Out, StreamError> + 'a,
    {
        Stream::create(Derived {
            name: self.name,
            upstream: upstream.clone(),
            config,
            transform: self.transform.clone(),
            active: None,
            _marker: PhantomData,
        })
    }
}

trait Recompute<In> {
    fn recompute(&self, value: Option<&In>);

    fn fail(&self, error: StreamError);

    fn finish(&self);
}

struct Inner<'a, In, R, Ctx, F> {
    transform: Rc<F>,
    last_value: Option<In>,
    resolver: Option<Resolver<'a, R>>,
    context: Ctx,
}

struct Derivation<'a, In, Out, R, Ctx, F> {
    name: &'static str,
    sink: Sink<'a, Out>,
    inner: RefCell<Inner<'a, In, R, Ctx, F>>,
}

impl<'a, In, Out, R, Ctx, F> Derivation<'a, In, Out, R, Ctx, F>
where
    In: Clone + 'a,
    Out: 'a,
    F: Fn(&In, &R, &mut Ctx) -> Result<Out, StreamError>,
{
    fn install(&self, resolver: Resolver<'a, R>) {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner.resolver = Some(resolver),
            Err(_) => warn!(operator = self.name, "derived stream busy while binding configuration"),
        }
    }
}

impl<'a, In, R, Ctx, F> Inner<'a, In, R, Ctx, F> {
    fn compute<Out>(&mut self, name: &'static str) -> Option<Result<Out, StreamError>>
    where
        F: Fn(&In, &R, &mut Ctx) -> Result<Out, StreamError>,
    {
        let Some(value) = self.last_value.as_ref() else {
            trace!(operator = name, "no upstream value yet");
            return None;
        };
        let Some(resolver) = self.resolver.as_ref() else {
            trace!(operator = name, "configuration still binding");
            return None;
        };
        let Some(params) = resolver() else {
            trace!(operator = name, "configuration not resolved yet");
            return None;
        };
        trace!(operator = name, "recompute");
        Some((*self.transform)(value, &params, &mut self.context))
    }
}

impl<'a, In, Out, R, Ctx, F> Recompute<In> for Derivation<'a, In, Out, R, Ctx, F>
where
    In: Clone + 'a,
    Out: 'a,
    F: Fn(&In, &R, &mut Ctx) -> Result<Out, StreamError>,
{
    fn recompute(&self, value: Option<&In>) {
        let outcome = match self.inner.try_borrow_mut() {
            Ok(mut inner) => {
                if let Some(value) = value {
                    inner.last_value = Some(value.clone());
                }
                inner.compute(self.name)
            }
            Err(_) => {
                warn!(operator = self.name, "recompute re-entered, notification dropped");
                return;
            }
        };
        match outcome {
            Some(Ok(value)) => self.sink.next(value),
            Some(Err(error)) => {
                debug!(operator = self.name, %error, "transform failed");
                self.sink.error(error);
            }
            None => {}
        }
    }

    fn fail(&self, error: StreamError) {
        self.sink.error(error);
    }

    fn finish(&self) {
        self.sink.complete();
    }
}

struct UpstreamListener<'a, In> {
    target: Weak<dyn Recompute<In> + 'a>,
}

impl<'a, In> Listener<In> for UpstreamListener<'a, In> {
    fn next(&mut self, value: &In) {
        if let Some(target) = self.target.upgrade() {
            target.recompute(Some(value));
        }
    }

    fn error(&mut self, error: &StreamError) {
        if let Some(target) = self.target.upgrade() {
            target.fail(error.clone());
        }
    }

    fn complete(&mut self) {
        if let Some(target) = self.target.upgrade() {
            target.finish();
        }
    }
}

struct Active<'a, In> {
    upstream: Option<Subscription<'a>>,
    entries: Vec<(&'static str, Subscription<'a>)>,
    _derivation: Rc<dyn Recompute<In> + 'a>,
}

struct Derived<'a, In, Out, C, Ctx, F> {
    name: &'static str,
    upstream: Stream<'a, In>,
    config: C,
    transform: Rc<F>,
    active: Option<Active<'a, In>>,
    _marker: PhantomData<fn() -> (Out, Ctx)>,
}

impl<'a, In, Out, C, Ctx, F> Producer<'a, Out> for Derived<'a, In, Out, C, Ctx, F>
where
    In: Clone + 'a,
    Out: 'a,
    C: Configuration<'a>,
    C::Resolved: 'a,
    Ctx: Default + 'a,
    F: Fn(&In, &C::Resolved, &mut Ctx) -> Result<Out, StreamError> + 'a,
{
    fn start(&mut self, sink: Sink<'a, Out>) {
        debug!(operator = self.name, "starting derived stream");
        let derivation = Rc::new(Derivation {
            name: self.name,
            sink,
            inner: RefCell::new(Inner {
                transform: self.transform.clone(),
                last_value: None,
                resolver: None,
                context: Ctx::default(),
            }),
        });
        let target: Rc<dyn Recompute<In> + 'a> = derivation.clone();

        // configuration is bound before the upstream can deliver anything
        let on_update = {
            let target = Rc::downgrade(&target);
            Rc::new(move || {
                if let Some(target) = target.upgrade() {
                    target.recompute(None);
                }
            })
        };
        let on_error = {
            let target = Rc::downgrade(&target);
            Rc::new(move |key: &'static str, error: &StreamError| {
                if let Some(target) = target.upgrade() {
                    target.fail(StreamError::Config { key, source: Box::new(error.clone()) });
                }
            })
        };
        let mut binder = ConfigBinder::new(on_update, on_error);
        let resolver = self.config.bind(&mut binder);
        let entries = binder.into_subscriptions();
        derivation.install(resolver);

        let upstream = if derivation.sink.is_live() {
            Some(self.upstream.subscribe_listener(UpstreamListener { target: Rc::downgrade(&target) }))
        } else {
            debug!(operator = self.name, "configuration failed while binding");
            None
        };
        self.active = Some(Active { upstream, entries, _derivation: target });
    }

    fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        debug!(operator = self.name, entries = active.entries.len(), "stopping derived stream");
        if let Some(upstream) = active.upstream {
            upstream.unsubscribe();
        }
        for (key, subscription) in active.entries {
            trace!(operator = self.name, key, "releasing configuration entry");
            subscription.unsubscribe();
        }
    }
}
