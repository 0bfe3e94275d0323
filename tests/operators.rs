extern crate motion_streams;

mod common;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use motion_streams::operators::{CapConfig, Pluck, PluckConfig, ScaleConfig, ShiftConfig, ThresholdConfig};
use motion_streams::{Broadcast, Stream, StreamError, StreamExt};

use common::{Event, Recorder};

fn run<T: Clone + 'static, U: Clone + 'static>(derive: impl FnOnce(&Stream<'static, T>) -> Stream<'static, U>, input: Vec<T>) -> Vec<U> {
    let source = Broadcast::new();
    let derived = derive(&source.stream());
    let rec = Recorder::new();
    let sub = derived.subscribe_listener(rec.listener());
    source.feed(input);
    sub.unsubscribe();
    rec.values()
}

#[test]
fn cap_clamps_hard_without_resistance() {
    let out = run(|s: &Stream<'static, f64>| s.cap(CapConfig::new(0.0, 10.0)), vec![-5.0, 15.0, 3.0, 0.0, 10.0]);
    assert_eq!(out, vec![0.0, 10.0, 3.0, 0.0, 10.0]);
}

#[test]
fn cap_with_resistance_rubber_bands() {
    let out = run(|s: &Stream<'static, f64>| s.cap(CapConfig::new(0.0, 10.0).resistance(2.0)), vec![14.0, -4.0, 5.0]);
    assert_eq!(out, vec![12.0, -2.0, 5.0]);
}

#[test]
fn cap_accepts_integer_input() {
    let out = run(|s: &Stream<'static, i32>| s.cap(CapConfig::new(0.0, 10.0)), vec![-3, 4, 30]);
    assert_eq!(out, vec![0.0, 4.0, 10.0]);
}

#[test]
fn pluck_projects_fields() {
    let with_value: HashMap<&'static str, i32> = [("value", 5)].into_iter().collect();
    let empty: HashMap<&'static str, i32> = HashMap::new();
    let out = run(|s| s.pluck(PluckConfig::new("value")), vec![with_value, empty]);
    assert_eq!(out, vec![Some(5), None]);
}

#[test]
fn pluck_by_index_and_ordered_key() {
    let out = run(|s| s.pluck(PluckConfig::new(1usize)), vec![vec!['a', 'b'], vec!['c']]);
    assert_eq!(out, vec![Some('b'), None]);

    let map: BTreeMap<String, f64> = [("y".to_string(), 2.5)].into_iter().collect();
    let out = run(|s| s.pluck(PluckConfig::new("y".to_string())), vec![map]);
    assert_eq!(out, vec![Some(2.5)]);
}

#[derive(Clone, Copy)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Pluck<Axis> for Point {
    type Field = f64;

    fn pluck(&self, key: &Axis) -> Option<f64> {
        Some(match key {
            Axis::X => self.x,
            Axis::Y => self.y,
        })
    }
}

#[test]
fn pluck_with_dynamic_key() {
    let points = Broadcast::<Point>::new();
    let axis = Broadcast::<Axis>::new();
    let rec = Recorder::new();
    let _sub = points.stream().pluck(PluckConfig::new(axis.stream())).subscribe_listener(rec.listener());
    axis.send(Axis::Y);
    points.send(Point { x: 1.0, y: 2.0 });
    axis.send(Axis::X);
    assert_eq!(rec.values(), vec![Some(2.0), Some(1.0)]);
}

#[test]
fn shift_adds_or_subtracts() {
    assert_eq!(run(|s: &Stream<'static, i32>| s.shift(ShiftConfig::new(3)), vec![10]), vec![13]);
    assert_eq!(run(|s: &Stream<'static, i32>| s.shift(ShiftConfig::new(3).subtract(true)), vec![10]), vec![7]);
}

#[test]
fn shift_direction_can_be_dynamic() {
    let values = Broadcast::<i32>::new();
    let subtract = Broadcast::<bool>::new();
    let rec = Recorder::new();
    let config = ShiftConfig::new(3).subtract(subtract.stream());
    let _sub = values.stream().shift(config).subscribe_listener(rec.listener());
    subtract.send(false);
    values.send(10);
    subtract.send(true);
    assert_eq!(rec.values(), vec![13, 7]);
}

#[test]
fn scale_multiplies() {
    assert_eq!(run(|s: &Stream<'static, i32>| s.scale(ScaleConfig::new(2)), vec![5, -1]), vec![10, -2]);
}

#[test]
fn invert_normalized_flips_unit_range() {
    assert_eq!(run(|s: &Stream<'static, f64>| s.invert_normalized(), vec![0.3, 0.0, 1.0]), vec![0.7, 1.0, 0.0]);
    assert_eq!(run(|s: &Stream<'static, f64>| s.invert_normalized(), vec![1.5]), vec![-0.5]);
}

#[test]
fn threshold_fires_on_edges_only() {
    let calls = RefCell::new(Vec::new());
    let seen = RefCell::new(Vec::new());
    let source = Broadcast::<f64>::new();
    let config = ThresholdConfig::new(10.0)
        .forward(|| {
            calls.borrow_mut().push("forward");
            Ok(())
        })
        .backward(|| {
            calls.borrow_mut().push("backward");
            Ok(())
        });
    let tapped = source.stream().threshold(config);
    let _sub = tapped.subscribe(|v| {
        seen.borrow_mut().push((*v, calls.borrow().len()));
    });
    source.feed(vec![5.0, 9.0, 11.0, 12.0, 9.0, 8.0, 11.0]);

    assert_eq!(*calls.borrow(), vec!["backward", "forward", "backward", "forward"]);
    let outputs: Vec<f64> = seen.borrow().iter().map(|(v, _)| *v).collect();
    assert_eq!(outputs, vec![5.0, 9.0, 11.0, 12.0, 9.0, 8.0, 11.0]);
    // the callback runs before the value it reacts to is emitted
    let fired_by: Vec<usize> = seen.borrow().iter().map(|(_, n)| *n).collect();
    assert_eq!(fired_by, vec![1, 1, 2, 2, 3, 3, 4]);
}

#[test]
fn threshold_forward_only() {
    let forward = Cell::new(0);
    let source = Broadcast::<f64>::new();
    let tapped = source.stream().threshold(ThresholdConfig::new(10.0).forward(|| {
        forward.set(forward.get() + 1);
        Ok(())
    }));
    let _sub = tapped.subscribe(|_| ());
    source.feed(vec![5.0, 9.0, 11.0, 12.0, 9.0, 8.0, 11.0]);
    assert_eq!(forward.get(), 1);
}

#[test]
fn threshold_dead_zone_at_breakpoint() {
    let fired = Cell::new(0);
    let source = Broadcast::<f64>::new();
    let config = ThresholdConfig::new(10.0)
        .forward(|| {
            fired.set(fired.get() + 1);
            Ok(())
        })
        .backward(|| {
            fired.set(fired.get() + 1);
            Ok(())
        });
    let _sub = source.stream().threshold(config).subscribe(|_| ());
    source.feed(vec![10.0, 10.0]);
    assert_eq!(fired.get(), 0);
}

#[test]
fn threshold_callback_failure_is_terminal() {
    let source = Broadcast::<f64>::new();
    let rec = Recorder::new();
    let config = ThresholdConfig::new(0.0).forward(|| Err(StreamError::transform("threshold", "callback refused")));
    let _sub = source.stream().threshold(config).subscribe_listener(rec.listener());
    source.feed(vec![-1.0, 1.0, 2.0]);
    assert_eq!(
        rec.events(),
        vec![Event::Next(-1.0), Event::Error(StreamError::transform("threshold", "callback refused"))]
    );
}

#[test]
fn chained_operators() {
    let out = run(
        |s: &Stream<'static, f64>| s.shift(ShiftConfig::new(-100.0)).scale(ScaleConfig::new(0.01)).invert_normalized(),
        vec![100.0, 150.0, 200.0],
    );
    assert_eq!(out, vec![1.0, 0.5, 0.0]);
}
