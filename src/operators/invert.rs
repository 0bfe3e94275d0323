//! Inversion of normalized values.

use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

/// `1 - value`. Values outside `[0, 1]` are not clamped.
pub fn invert_value<T>(value: &T, _: &(), _: &mut ()) -> Result<f64, StreamError>
where
    T: Copy + Into<f64>,
{
    Ok(1.0 - (*value).into())
}

/// Maps every value `x` to `1 - x`.
pub fn invert_normalized<'a, T>(upstream: &Stream<'a, T>) -> Stream<'a, f64>
where
    T: Copy + Into<f64> + 'a,
{
    Operator::new("invert_normalized", invert_value::<T>).with_config(upstream, ())
}
