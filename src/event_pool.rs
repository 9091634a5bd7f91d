use core::cmp::Ordering;

use binary_heap_plus::{
    BinaryHeap,
    MinComparator,
};

use crate::host::Host;

pub trait Event {
    /// Wall clock time, in milliseconds, the event should fire at.
    fn trigger_time(&self) -> f64;
}

pub struct EventLoopContext<E>
where
    E: Event,
{
    next_events: Vec<E>,
}

impl<E> EventLoopContext<E>
where
    E: Event,
{
    pub fn add_event(
        &mut self,
        event: E,
    ) {
        self.next_events.push(event);
    }

    fn drain_to_event_pool(
        &mut self,
        extensible: &mut impl Extend<EventWrapper<E>>,
    ) {
        let drain_src = self.next_events.drain(..).map(EventWrapper);
        extensible.extend(drain_src)
    }
}

pub trait EventLoopState {
    type Event: Event;

    fn initial_run<H: Host>(
        &mut self,
        host: &H,
        ctx: &mut EventLoopContext<Self::Event>,
    );

    fn on_event<H: Host>(
        &mut self,
        host: &H,
        event: Self::Event,
        ctx: &mut EventLoopContext<Self::Event>,
    );

    /// Called instead of `on_event` when the loop got to an event later than
    /// its grace period allows.
    fn on_event_fail<H: Host>(
        &mut self,
        host: &H,
        event: Self::Event,
        ctx: &mut EventLoopContext<Self::Event>,
    );
}

/// Orders events by trigger time only.
#[derive(Debug)]
pub struct EventWrapper<E>(pub E)
where
    E: Event;

impl<E> PartialOrd for EventWrapper<E>
where
    E: Event,
{
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for EventWrapper<E>
where
    E: Event,
{
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.0.trigger_time().total_cmp(&other.0.trigger_time())
    }
}

impl<E> PartialEq for EventWrapper<E>
where
    E: Event,
{
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for EventWrapper<E> where E: Event {}

/// Single-threaded timer loop: pops the earliest event, sleeps until it is
/// due, hands it to the state, repeats. Returns once no events are left.
pub struct EventLoop<S>
where
    S: EventLoopState,
{
    event_pool: BinaryHeap<EventWrapper<S::Event>, MinComparator>,
    state: S,
    grace_period: f64,
}

impl<S> EventLoop<S>
where
    S: EventLoopState,
{
    pub fn new(state: S) -> EventLoop<S> {
        EventLoop {
            event_pool: BinaryHeap::new_min(),
            state,
            grace_period: 50., // milliseconds
        }
    }

    pub fn with_grace_period(
        mut self,
        grace_period: f64,
    ) -> EventLoop<S> {
        self.grace_period = grace_period;
        self
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub async fn run<H: Host>(
        &mut self,
        host: &H,
    ) {
        let mut context = EventLoopContext {
            next_events: Vec::with_capacity(4),
        };

        // populate the pool first
        self.state.initial_run(host, &mut context);
        context.drain_to_event_pool(&mut self.event_pool);

        while let Some(EventWrapper(event)) = self.event_pool.pop() {
            let now = host.now();

            // not due yet. sleep, then execute
            if now < event.trigger_time() {
                host.sleep(event.trigger_time() - now).await;
                self.state.on_event(host, event, &mut context);
            }
            // a little late is still on time
            else if now - self.grace_period <= event.trigger_time() {
                self.state.on_event(host, event, &mut context);
            }
            else {
                self.state.on_event_fail(host, event, &mut context);
            }

            context.drain_to_event_pool(&mut self.event_pool);
        }
    }
}
