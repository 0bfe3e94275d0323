//! The operators shipped with the crate, all built on [`Operator`].

use std::ops::{Add, Mul, Sub};

use crate::error::StreamError;
use crate::operator::Operator;
use crate::stream::Stream;

pub mod cap;
pub mod invert;
pub mod pluck;
pub mod scale;
pub mod shift;
pub mod threshold;

pub use self::cap::{cap, CapConfig, CapParams};
pub use self::invert::invert_normalized;
pub use self::pluck::{pluck, Pluck, PluckConfig, PluckParams};
pub use self::scale::{scale, ScaleConfig, ScaleParams};
pub use self::shift::{shift, ShiftConfig, ShiftParams};
pub use self::threshold::{threshold, Crossing, ThresholdConfig, ThresholdParams, ThresholdState, Trigger};

/// Method-call syntax for every operator.
pub trait StreamExt<'a, T: 'a> {
    /// Applies `func` to every value.
    fn map<U, F>(&self, func: F) -> Stream<'a, U>
    where
        T: Clone,
        U: 'a,
        F: Fn(&T) -> U + 'a;

    /// Calls `func` on every value and passes it on.
    fn inspect<F>(&self, func: F) -> Stream<'a, T>
    where
        T: Clone,
        F: Fn(&T) + 'a;

    /// Emits the running accumulation, starting from `init` on every run.
    fn fold<A, F>(&self, init: A, func: F) -> Stream<'a, A>
    where
        T: Clone,
        A: Clone + 'a,
        F: Fn(A, &T) -> A + 'a;

    /// See [`cap()`].
    fn cap(&self, config: CapConfig<'a>) -> Stream<'a, f64>
    where
        T: Copy + Into<f64>;

    /// See [`pluck()`].
    fn pluck<K>(&self, config: PluckConfig<'a, K>) -> Stream<'a, Option<<T as Pluck<K>>::Field>>
    where
        T: Pluck<K> + Clone,
        K: Clone + 'a;

    /// See [`shift()`].
    fn shift(&self, config: ShiftConfig<'a, T>) -> Stream<'a, T>
    where
        T: Clone + Add<Output = T> + Sub<Output = T>;

    /// See [`scale()`].
    fn scale(&self, config: ScaleConfig<'a, T>) -> Stream<'a, T>
    where
        T: Clone + Mul<Output = T>;

    /// See [`invert_normalized()`].
    fn invert_normalized(&self) -> Stream<'a, f64>
    where
        T: Copy + Into<f64>;

    /// See [`threshold()`].
    fn threshold(&self, config: ThresholdConfig<'a>) -> Stream<'a, T>
    where
        T: Copy + Into<f64>;
}

impl<'a, T: 'a> StreamExt<'a, T> for Stream<'a, T> {
    fn map<U, F>(&self, func: F) -> Stream<'a, U>
    where
        T: Clone,
        U: 'a,
        F: Fn(&T) -> U + 'a,
    {
        let apply = move |value: &T, _: &(), _: &mut ()| -> Result<U, StreamError> { Ok(func(value)) };
        Operator::new("map", apply).with_config(self, ())
    }

    fn inspect<F>(&self, func: F) -> Stream<'a, T>
    where
        T: Clone,
        F: Fn(&T) + 'a,
    {
        let tap = move |value: &T, _: &(), _: &mut ()| -> Result<T, StreamError> {
            func(value);
            Ok(value.clone())
        };
        Operator::new("inspect", tap).with_config(self, ())
    }

    fn fold<A, F>(&self, init: A, func: F) -> Stream<'a, A>
    where
        T: Clone,
        A: Clone + 'a,
        F: Fn(A, &T) -> A + 'a,
    {
        let step = move |value: &T, _: &(), acc: &mut Option<A>| -> Result<A, StreamError> {
            let next = func(acc.take().unwrap_or_else(|| init.clone()), value);
            *acc = Some(next.clone());
            Ok(next)
        };
        Operator::new("fold", step).with_config(self, ())
    }

    fn cap(&self, config: CapConfig<'a>) -> Stream<'a, f64>
    where
        T: Copy + Into<f64>,
    {
        cap(self, config)
    }

    fn pluck<K>(&self, config: PluckConfig<'a, K>) -> Stream<'a, Option<<T as Pluck<K>>::Field>>
    where
        T: Pluck<K> + Clone,
        K: Clone + 'a,
    {
        pluck(self, config)
    }

    fn shift(&self, config: ShiftConfig<'a, T>) -> Stream<'a, T>
    where
        T: Clone + Add<Output = T> + Sub<Output = T>,
    {
        shift(self, config)
    }

    fn scale(&self, config: ScaleConfig<'a, T>) -> Stream<'a, T>
    where
        T: Clone + Mul<Output = T>,
    {
        scale(self, config)
    }

    fn invert_normalized(&self) -> Stream<'a, f64>
    where
        T: Copy + Into<f64>,
    {
        invert_normalized(self)
    }

    fn threshold(&self, config: ThresholdConfig<'a>) -> Stream<'a, T>
    where
        T: Copy + Into<f64>,
    {
        threshold(self, config)
    }
}
