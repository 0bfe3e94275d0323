use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::error::StreamError;

/// Receives the notifications of a stream it is subscribed to.
pub trait Listener<T: ?Sized> {
    /// A new value.
    fn next(&mut self, value: &T);

    /// The stream failed; nothing follows.
    fn error(&mut self, _error: &StreamError) {}

    /// The stream ended; nothing follows.
    fn complete(&mut self) {}
}

/// The start/stop half of a stream.
///
/// `start` runs when the first listener attaches and receives the sink it
/// should push into; `stop` runs when the last listener detaches or right
/// after the stream has delivered a terminal notification.
pub trait Producer<'a, T> {
    /// Begins pushing into `sink`.
    fn start(&mut self, sink: Sink<'a, T>);

    /// Releases whatever `start` acquired.
    fn stop(&mut self);
}

struct NextFn<F>(F);

impl<T: ?Sized, F: FnMut(&T)> Listener<T> for NextFn<F> {
    fn next(&mut self, value: &T) {
        (self.0)(value)
    }
}

type SharedListener<'a, T> = Rc<RefCell<dyn Listener<T> + 'a>>;

trait Detach {
    fn detach(&self, id: u64);
}

struct Core<'a, T> {
    producer: RefCell<Box<dyn Producer<'a, T> + 'a>>,
    listeners: RefCell<Vec<(u64, SharedListener<'a, T>)>>,
    next_id: Cell<u64>,
    run: Cell<u64>,
    active: Cell<bool>,
    stop_pending: Cell<bool>,
    remember: bool,
    last: RefCell<Option<Rc<T>>>,
}

impl<'a, T: 'a> Core<'a, T> {
    fn new(producer: Box<dyn Producer<'a, T> + 'a>, remember: bool) -> Self {
        Core {
            producer: RefCell::new(producer),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            run: Cell::new(0),
            active: Cell::new(false),
            stop_pending: Cell::new(false),
            remember,
            last: RefCell::new(None),
        }
    }

    fn start(self: &Rc<Self>) {
        self.active.set(true);
        self.run.set(self.run.get() + 1);
        let sink = Sink { core: Rc::downgrade(self), run: self.run.get() };
        match self.producer.try_borrow_mut() {
            Ok(mut producer) => producer.start(sink),
            Err(_) => {
                warn!("producer re-entered while starting, start skipped");
                return;
            }
        }
        // a terminal notification raised during `start` could not stop the producer
        if self.stop_pending.replace(false) {
            self.stop_producer();
        }
    }

    fn stop_producer(&self) {
        match self.producer.try_borrow_mut() {
            Ok(mut producer) => producer.stop(),
            Err(_) => self.stop_pending.set(true),
        }
    }

    fn is_registered(&self, id: u64) -> bool {
        self.listeners.borrow().iter().any(|(i, _)| *i == id)
    }

    fn call(listener: &SharedListener<'a, T>, notify: impl FnOnce(&mut (dyn Listener<T> + 'a))) {
        match listener.try_borrow_mut() {
            Ok(mut listener) => notify(&mut *listener),
            Err(_) => warn!("listener re-entered, notification dropped"),
        }
    }

    fn deliver(&self, value: &T) {
        if !self.active.get() {
            return;
        }
        let snapshot: Vec<_> = self.listeners.borrow().iter().map(|(i, l)| (*i, l.clone())).collect();
        for (id, listener) in snapshot {
            // earlier listeners may have unsubscribed later ones or torn the stream down
            if !self.active.get() || !self.is_registered(id) {
                continue;
            }
            Self::call(&listener, |l| l.next(value));
        }
    }

    fn emit(&self, value: T) {
        if !self.active.get() {
            return;
        }
        if self.remember {
            let value = Rc::new(value);
            *self.last.borrow_mut() = Some(value.clone());
            self.deliver(&value);
        } else {
            self.deliver(&value);
        }
    }

    fn finish(&self, notify: impl Fn(&mut (dyn Listener<T> + 'a))) {
        if !self.active.replace(false) {
            return;
        }
        self.last.borrow_mut().take();
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        self.stop_producer();
        for (_, listener) in listeners {
            Self::call(&listener, |l| notify(l));
        }
    }
}

impl<'a, T: 'a> Detach for Core<'a, T> {
    fn detach(&self, id: u64) {
        let emptied = {
            let mut listeners = self.listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|(i, _)| *i != id);
            before != listeners.len() && listeners.is_empty()
        };
        if emptied && self.active.replace(false) {
            self.last.borrow_mut().take();
            self.stop_producer();
        }
    }
}

/// Push handle given to a [`Producer`] on `start`.
///
/// A sink only reaches listeners of the run it was created for: once the
/// stream stops or terminates, every notification pushed into it is dropped.
pub struct Sink<'a, T> {
    core: Weak<Core<'a, T>>,
    run: u64,
}

impl<'a, T: 'a> Sink<'a, T> {
    fn live(&self) -> Option<Rc<Core<'a, T>>> {
        self.core.upgrade().filter(|core| core.active.get() && core.run.get() == self.run)
    }

    /// Whether notifications pushed into this sink still reach anyone.
    pub fn is_live(&self) -> bool {
        self.live().is_some()
    }

    /// Delivers `value` to every listener.
    pub fn next(&self, value: T) {
        if let Some(core) = self.live() {
            core.emit(value);
        }
    }

    /// Terminates the stream with `error`.
    pub fn error(&self, error: StreamError) {
        if let Some(core) = self.live() {
            debug!(%error, "stream terminated with error");
            core.finish(|l| l.error(&error));
        }
    }

    /// Terminates the stream normally.
    pub fn complete(&self) {
        if let Some(core) = self.live() {
            debug!("stream completed");
            core.finish(|l| l.complete());
        }
    }
}

impl<'a, T> Clone for Sink<'a, T> {
    fn clone(&self) -> Self {
        Sink { core: self.core.clone(), run: self.run }
    }
}

/// A single listener registration.
///
/// The registration keeps its stream alive, so a stream built inline and
/// subscribed to at once keeps running after its handle is gone. Dropping a
/// subscription keeps the listener attached; release it with
/// [`Subscription::unsubscribe`].
#[must_use = "a subscription must be released with `unsubscribe`"]
pub struct Subscription<'a> {
    core: Rc<dyn Detach + 'a>,
    id: u64,
}

impl<'a> Subscription<'a> {
    /// Detaches the listener; stops the stream if it was the last one.
    pub fn unsubscribe(self) {
        self.core.detach(self.id);
    }
}

/// Cheaply cloneable handle to a multicast push stream.
pub struct Stream<'a, T> {
    core: Rc<Core<'a, T>>,
}

impl<'a, T> Clone for Stream<'a, T> {
    fn clone(&self) -> Self {
        Stream { core: self.core.clone() }
    }
}

impl<'a, T: 'a> Stream<'a, T> {
    /// Builds a stream that runs `producer` while it has listeners.
    pub fn create<P>(producer: P) -> Self
    where
        P: Producer<'a, T> + 'a,
    {
        Stream { core: Rc::new(Core::new(Box::new(producer), false)) }
    }

    /// A stream that never emits anything.
    pub fn never() -> Self {
        Stream::create(Idle)
    }

    /// Emits every value to the listener that starts the stream, then completes.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Clone,
    {
        Stream::create(Of { values: values.into_iter().collect() })
    }

    /// A stream mirroring this one that replays its latest value to
    /// listeners joining while it runs.
    pub fn remember(&self) -> Self
    where
        T: Clone,
    {
        let producer = Forward { upstream: self.clone(), subscription: None };
        Stream { core: Rc::new(Core::new(Box::new(producer), true)) }
    }

    /// Attaches an observer that only cares about values.
    pub fn subscribe<O>(&self, observer: O) -> Subscription<'a>
    where
        O: FnMut(&T) + 'a,
    {
        self.subscribe_listener(NextFn(observer))
    }

    /// Attaches a full listener, starting the producer if it is the first.
    pub fn subscribe_listener<L>(&self, listener: L) -> Subscription<'a>
    where
        L: Listener<T> + 'a,
    {
        let id = self.core.next_id.get();
        self.core.next_id.set(id + 1);
        let listener: SharedListener<'a, T> = Rc::new(RefCell::new(listener));
        self.core.listeners.borrow_mut().push((id, listener.clone()));
        if !self.core.active.get() {
            self.core.start();
        } else if self.core.remember {
            let last = self.core.last.borrow().clone();
            if let Some(last) = last {
                Core::call(&listener, |l| l.next(&last));
            }
        }
        Subscription { core: self.core.clone(), id }
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.core.listeners.borrow().len()
    }

    /// Whether the producer is currently running.
    pub fn is_active(&self) -> bool {
        self.core.active.get()
    }
}

struct Idle;

impl<'a, T> Producer<'a, T> for Idle {
    fn start(&mut self, _sink: Sink<'a, T>) {}

    fn stop(&mut self) {}
}

struct Of<T> {
    values: Vec<T>,
}

impl<'a, T: Clone + 'a> Producer<'a, T> for Of<T> {
    fn start(&mut self, sink: Sink<'a, T>) {
        for value in self.values.iter().cloned() {
            if !sink.is_live() {
                return;
            }
            sink.next(value);
        }
        sink.complete();
    }

    fn stop(&mut self) {}
}

struct Forward<'a, T> {
    upstream: Stream<'a, T>,
    subscription: Option<Subscription<'a>>,
}

struct ForwardListener<'a, T> {
    sink: Sink<'a, T>,
}

impl<'a, T: Clone + 'a> Listener<T> for ForwardListener<'a, T> {
    fn next(&mut self, value: &T) {
        self.sink.next(value.clone());
    }

    fn error(&mut self, error: &StreamError) {
        self.sink.error(error.clone());
    }

    fn complete(&mut self) {
        self.sink.complete();
    }
}

impl<'a, T: Clone + 'a> Producer<'a, T> for Forward<'a, T> {
    fn start(&mut self, sink: Sink<'a, T>) {
        self.subscription = Some(self.upstream.subscribe_listener(ForwardListener { sink }));
    }

    fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// A hot source fed by hand.
///
/// Values sent while nobody listens are dropped.
pub struct Broadcast<'a, T> {
    stream: Stream<'a, T>,
}

impl<'a, T: 'a> Broadcast<'a, T> {
    /// A broadcast nobody listens to yet.
    pub fn new() -> Self {
        Broadcast { stream: Stream::never() }
    }

    /// The stream listeners subscribe to.
    pub fn stream(&self) -> Stream<'a, T> {
        self.stream.clone()
    }

    /// Delivers one value to the current listeners.
    pub fn send<B>(&self, value: B)
    where
        B: std::borrow::Borrow<T>,
    {
        self.stream.core.deliver(value.borrow());
    }

    /// Sends every value of `iter` in order.
    pub fn feed<B, I>(&self, iter: I)
    where
        I: IntoIterator<Item = B>,
        B: std::borrow::Borrow<T>,
    {
        for value in iter {
            self.send(value);
        }
    }

    /// Terminates the current listeners with `error`.
    pub fn error(&self, error: StreamError) {
        if self.stream.core.active.get() {
            debug!(%error, "broadcast terminated with error");
        }
        self.stream.core.finish(|l| l.error(&error));
    }

    /// Completes the current listeners.
    pub fn complete(&self) {
        self.stream.core.finish(|l| l.complete());
    }
}

impl<'a, T: 'a> Default for Broadcast<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> Clone for Broadcast<'a, T> {
    fn clone(&self) -> Self {
        Broadcast { stream: self.stream.clone() }
    }
}
