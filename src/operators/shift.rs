//! Additive offset.

use std::ops::{Add, Sub};

use crate::config::{ConfigBinder, Configuration, Param, Resolver};
use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

/// Configuration of [`shift`].
#[derive(Clone)]
pub struct ShiftConfig<'a, T> {
    /// Amount added to every value.
    pub offset: Param<'a, T>,
    /// Subtract the offset instead of adding it.
    pub subtract: Param<'a, bool>,
}

impl<'a, T> ShiftConfig<'a, T> {
    /// Adds `offset` to every value.
    pub fn new(offset: impl Into<Param<'a, T>>) -> Self {
        ShiftConfig { offset: offset.into(), subtract: Param::Static(false) }
    }

    /// Sets the direction of the shift.
    pub fn subtract(mut self, subtract: impl Into<Param<'a, bool>>) -> Self {
        self.subtract = subtract.into();
        self
    }
}

/// Resolved [`ShiftConfig`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct ShiftParams<T> {
    pub offset: T,
    pub subtract: bool,
}

impl<'a, T: Clone + 'a> Configuration<'a> for ShiftConfig<'a, T> {
    type Resolved = ShiftParams<T>;

    fn bind(&self, binder: &mut ConfigBinder<'a>) -> Resolver<'a, ShiftParams<T>> {
        let offset = binder.bind("offset", &self.offset);
        let subtract = binder.bind("subtract", &self.subtract);
        Box::new(move || Some(ShiftParams { offset: offset.get()?, subtract: subtract.get()? }))
    }
}

/// `value + offset`, or `value - offset` when subtracting.
pub fn shift_value<T>(value: &T, params: &ShiftParams<T>, _: &mut ()) -> Result<T, StreamError>
where
    T: Clone + Add<Output = T> + Sub<Output = T>,
{
    let offset = params.offset.clone();
    Ok(if params.subtract { value.clone() - offset } else { value.clone() + offset })
}

/// Offsets every value.
pub fn shift<'a, T>(upstream: &Stream<'a, T>, config: ShiftConfig<'a, T>) -> Stream<'a, T>
where
    T: Clone + Add<Output = T> + Sub<Output = T> + 'a,
{
    Operator::new("shift", shift_value::<T>).with_config(upstream, config)
}
