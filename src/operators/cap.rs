//! Rubber-band clamp.

use crate::config::{ConfigBinder, Configuration, Param, Resolver};
use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

/// Configuration of [`cap`]; any entry may be static or dynamic.
#[derive(Clone)]
pub struct CapConfig<'a> {
    /// Lower bound.
    pub min: Param<'a, f64>,
    /// Upper bound.
    pub max: Param<'a, f64>,
    /// Divides the overshoot past a bound; `0` clamps hard.
    pub resistance: Param<'a, f64>,
}

impl<'a> CapConfig<'a> {
    /// A hard clamp to `[min, max]`.
    pub fn new(min: impl Into<Param<'a, f64>>, max: impl Into<Param<'a, f64>>) -> Self {
        CapConfig { min: min.into(), max: max.into(), resistance: Param::Static(0.0) }
    }

    /// Lets values overshoot by `overshoot / resistance`.
    pub fn resistance(mut self, resistance: impl Into<Param<'a, f64>>) -> Self {
        self.resistance = resistance.into();
        self
    }
}

/// Resolved [`CapConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct CapParams {
    pub min: f64,
    pub max: f64,
    pub resistance: f64,
}

impl<'a> Configuration<'a> for CapConfig<'a> {
    type Resolved = CapParams;

    fn bind(&self, binder: &mut ConfigBinder<'a>) -> Resolver<'a, CapParams> {
        let min = binder.bind("min", &self.min);
        let max = binder.bind("max", &self.max);
        let resistance = binder.bind("resistance", &self.resistance);
        Box::new(move || Some(CapParams { min: min.get()?, max: max.get()?, resistance: resistance.get()? }))
    }
}

/// Keeps `value` within `[min, max]`, letting it overshoot by
/// `overshoot / resistance` when the resistance is positive.
pub fn cap_value<T>(value: &T, params: &CapParams, _: &mut ()) -> Result<f64, StreamError>
where
    T: Copy + Into<f64>,
{
    let value: f64 = (*value).into();
    let CapParams { min, max, resistance } = *params;
    let capped = if value < min {
        let overshoot = min - value;
        if resistance > 0.0 { min - overshoot / resistance } else { min }
    } else if value > max {
        let overshoot = value - max;
        if resistance > 0.0 { max + overshoot / resistance } else { max }
    } else {
        value
    };
    Ok(capped)
}

/// Clamps every value to `[min, max]`, rubber-banding past the bounds when
/// `resistance` is positive. Output is always `f64`.
pub fn cap<'a, T>(upstream: &Stream<'a, T>, config: CapConfig<'a>) -> Stream<'a, f64>
where
    T: Copy + Into<f64> + 'a,
{
    Operator::new("cap", cap_value::<T>).with_config(upstream, config)
}
