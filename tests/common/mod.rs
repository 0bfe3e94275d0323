#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use motion_streams::{Listener, Producer, Sink, Stream, StreamError};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event<T> {
    Next(T),
    Error(StreamError),
    Complete,
}

/// Records every notification it receives.
pub struct Recorder<T> {
    events: Rc<RefCell<Vec<Event<T>>>>,
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Recorder { events: Rc::new(RefCell::new(Vec::new())) }
    }

    pub fn listener(&self) -> Recording<T> {
        Recording { events: self.events.clone() }
    }

    pub fn events(&self) -> Vec<Event<T>> {
        self.events.borrow().clone()
    }

    pub fn values(&self) -> Vec<T> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Next(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> usize {
        self.events.borrow().iter().filter(|e| matches!(e, Event::Error(_))).count()
    }
}

pub struct Recording<T> {
    events: Rc<RefCell<Vec<Event<T>>>>,
}

impl<T: Clone> Listener<T> for Recording<T> {
    fn next(&mut self, value: &T) {
        self.events.borrow_mut().push(Event::Next(value.clone()));
    }

    fn error(&mut self, error: &StreamError) {
        self.events.borrow_mut().push(Event::Error(error.clone()));
    }

    fn complete(&mut self) {
        self.events.borrow_mut().push(Event::Complete);
    }
}

/// A hand-fed source counting how often it was started and stopped.
pub struct Probe<'a, T> {
    sink: Rc<RefCell<Option<Sink<'a, T>>>>,
    starts: Rc<Cell<usize>>,
    stops: Rc<Cell<usize>>,
    stream: Stream<'a, T>,
}

struct ProbeProducer<'a, T> {
    sink: Rc<RefCell<Option<Sink<'a, T>>>>,
    starts: Rc<Cell<usize>>,
    stops: Rc<Cell<usize>>,
}

impl<'a, T: 'a> Producer<'a, T> for ProbeProducer<'a, T> {
    fn start(&mut self, sink: Sink<'a, T>) {
        self.starts.set(self.starts.get() + 1);
        *self.sink.borrow_mut() = Some(sink);
    }

    fn stop(&mut self) {
        self.stops.set(self.stops.get() + 1);
        self.sink.borrow_mut().take();
    }
}

impl<'a, T: 'a> Probe<'a, T> {
    pub fn new() -> Self {
        let sink = Rc::new(RefCell::new(None));
        let starts = Rc::new(Cell::new(0));
        let stops = Rc::new(Cell::new(0));
        let stream = Stream::create(ProbeProducer { sink: sink.clone(), starts: starts.clone(), stops: stops.clone() });
        Probe { sink, starts, stops, stream }
    }

    pub fn stream(&self) -> Stream<'a, T> {
        self.stream.clone()
    }

    fn current(&self) -> Option<Sink<'a, T>> {
        self.sink.borrow().clone()
    }

    pub fn send(&self, value: T) {
        if let Some(sink) = self.current() {
            sink.next(value);
        }
    }

    pub fn error(&self, error: StreamError) {
        if let Some(sink) = self.current() {
            sink.error(error);
        }
    }

    pub fn complete(&self) {
        if let Some(sink) = self.current() {
            sink.complete();
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.get()
    }

    pub fn stops(&self) -> usize {
        self.stops.get()
    }
}
