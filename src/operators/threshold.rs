//! Edge-triggered tap.
//!
//! `threshold` passes every value through unchanged and fires a callback when
//! the value crosses a breakpoint. A callback fires once per crossing: staying
//! on the same side does nothing until the other callback has fired. A value
//! exactly at the breakpoint fires neither.

use std::rc::Rc;

use crate::config::{ConfigBinder, Configuration, Param, Resolver};
use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

/// Callback fired on a crossing. An `Err` terminates the stream.
pub type Trigger<'a> = Rc<dyn Fn() -> Result<(), StreamError> + 'a>;

/// Direction of the last crossing that fired a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Rose above the breakpoint.
    Forward,
    /// Fell below the breakpoint.
    Backward,
}

/// Per-run state of a threshold stream.
#[derive(Debug, Default)]
pub struct ThresholdState {
    /// `None` until a callback has fired in this run.
    pub last_triggered: Option<Crossing>,
}

/// Configuration of [`threshold`]; only the breakpoint may be dynamic.
#[derive(Clone)]
pub struct ThresholdConfig<'a> {
    /// Level the value is compared against.
    pub breakpoint: Param<'a, f64>,
    /// Fired when the value rises above the breakpoint.
    pub forward: Option<Trigger<'a>>,
    /// Fired when the value drops below the breakpoint.
    pub backward: Option<Trigger<'a>>,
}

impl<'a> ThresholdConfig<'a> {
    /// A threshold with no callbacks yet.
    pub fn new(breakpoint: impl Into<Param<'a, f64>>) -> Self {
        ThresholdConfig { breakpoint: breakpoint.into(), forward: None, backward: None }
    }

    /// Sets the callback fired on a rising crossing.
    pub fn forward<F>(mut self, callback: F) -> Self
    where
        F: Fn() -> Result<(), StreamError> + 'a,
    {
        self.forward = Some(Rc::new(callback));
        self
    }

    /// Sets the callback fired on a falling crossing.
    pub fn backward<F>(mut self, callback: F) -> Self
    where
        F: Fn() -> Result<(), StreamError> + 'a,
    {
        self.backward = Some(Rc::new(callback));
        self
    }
}

/// Resolved [`ThresholdConfig`].
#[derive(Clone)]
#[allow(missing_docs)]
pub struct ThresholdParams<'a> {
    pub breakpoint: f64,
    pub forward: Option<Trigger<'a>>,
    pub backward: Option<Trigger<'a>>,
}

impl<'a> Configuration<'a> for ThresholdConfig<'a> {
    type Resolved = ThresholdParams<'a>;

    fn bind(&self, binder: &mut ConfigBinder<'a>) -> Resolver<'a, ThresholdParams<'a>> {
        let breakpoint = binder.bind("breakpoint", &self.breakpoint);
        let forward = self.forward.clone();
        let backward = self.backward.clone();
        Box::new(move || {
            Some(ThresholdParams { breakpoint: breakpoint.get()?, forward: forward.clone(), backward: backward.clone() })
        })
    }
}

/// Fires the callback due for `value`, if any, and returns `value`.
pub fn threshold_tap<T>(value: &T, params: &ThresholdParams<'_>, state: &mut ThresholdState) -> Result<T, StreamError>
where
    T: Copy + Into<f64>,
{
    let level: f64 = (*value).into();
    match (&params.forward, &params.backward) {
        (Some(forward), _) if level > params.breakpoint && state.last_triggered != Some(Crossing::Forward) => {
            forward()?;
            state.last_triggered = Some(Crossing::Forward);
        }
        (_, Some(backward)) if level < params.breakpoint && state.last_triggered != Some(Crossing::Backward) => {
            backward()?;
            state.last_triggered = Some(Crossing::Backward);
        }
        _ => {}
    }
    Ok(*value)
}

/// Passes values through, firing the callbacks on breakpoint crossings.
pub fn threshold<'a, T>(upstream: &Stream<'a, T>, config: ThresholdConfig<'a>) -> Stream<'a, T>
where
    T: Copy + Into<f64> + 'a,
{
    Operator::new("threshold", threshold_tap::<T>).with_config(upstream, config)
}
