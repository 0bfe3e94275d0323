//! Multiplicative scaling.

use std::ops::Mul;

use crate::config::{ConfigBinder, Configuration, Param, Resolver};
use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

/// Configuration of [`scale`].
#[derive(Clone)]
pub struct ScaleConfig<'a, T> {
    /// Factor every value is multiplied by.
    pub coefficient: Param<'a, T>,
}

impl<'a, T> ScaleConfig<'a, T> {
    /// Scales by `coefficient`.
    pub fn new(coefficient: impl Into<Param<'a, T>>) -> Self {
        ScaleConfig { coefficient: coefficient.into() }
    }
}

/// Resolved [`ScaleConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams<T> {
    #[allow(missing_docs)]
    pub coefficient: T,
}

impl<'a, T: Clone + 'a> Configuration<'a> for ScaleConfig<'a, T> {
    type Resolved = ScaleParams<T>;

    fn bind(&self, binder: &mut ConfigBinder<'a>) -> Resolver<'a, ScaleParams<T>> {
        let coefficient = binder.bind("coefficient", &self.coefficient);
        Box::new(move || Some(ScaleParams { coefficient: coefficient.get()? }))
    }
}

/// `value * coefficient`.
pub fn scale_value<T>(value: &T, params: &ScaleParams<T>, _: &mut ()) -> Result<T, StreamError>
where
    T: Clone + Mul<Output = T>,
{
    Ok(value.clone() * params.coefficient.clone())
}

/// Multiplies every value by the coefficient.
pub fn scale<'a, T>(upstream: &Stream<'a, T>, config: ScaleConfig<'a, T>) -> Stream<'a, T>
where
    T: Clone + Mul<Output = T> + 'a,
{
    Operator::new("scale", scale_value::<T>).with_config(upstream, config)
}
