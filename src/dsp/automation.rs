/*
Gain Parameter Automation
=========================

A Timeline holds the scheduled history of one gain parameter as a sorted
sequence of events on the engine's time axis:

  SetValue   pin the parameter to a value at an instant (a step)
  RampTo     arrive at a value at an instant, moving linearly from the
             previous event's value

Evaluation walks the events up to the queried time. If the next event
after the query point is a ramp, the parameter is mid-flight and the value
is interpolated between the previous event and the ramp target:

  value
    1.0 ┤        ●
        │       ╱ ╲
        │      ╱   ╲ ← query lands here: interpolate
    S   │     ╱     ●────────
        │    ╱
    0.0 ●───╱
        └────┴─────┴────────→ time

cancel_from(t) drops every event scheduled at or after t, including a ramp
still in flight (its target instant is >= t). Callers that want a smooth
takeover read value_at first, cancel, then re-anchor with a SetValue at
the current value - which is exactly how an envelope release grabs a
mid-decay parameter without a click.
*/

/// One scheduled parameter event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    SetValue { value: f32, at: f64 },
    RampTo { value: f32, at: f64 },
}

impl Event {
    fn at(&self) -> f64 {
        match *self {
            Event::SetValue { at, .. } | Event::RampTo { at, .. } => at,
        }
    }

    fn target(&self) -> f32 {
        match *self {
            Event::SetValue { value, .. } | Event::RampTo { value, .. } => value,
        }
    }
}

/// Scheduled history of one gain parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    initial: f32,
    events: Vec<Event>,
}

impl Timeline {
    /// A timeline holding `initial` until the first scheduled event. The
    /// initial value is anchored at time zero.
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    pub fn set_value(&mut self, value: f32, at: f64) {
        self.insert(Event::SetValue { value, at });
    }

    pub fn ramp_to(&mut self, value: f32, at: f64) {
        self.insert(Event::RampTo { value, at });
    }

    /// Drop every event scheduled at or after `from`.
    pub fn cancel_from(&mut self, from: f64) {
        self.events.retain(|event| event.at() < from);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Evaluate the parameter at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        let mut value = self.initial;
        let mut since = 0.0_f64;

        for event in &self.events {
            let at = event.at();
            if at <= time {
                value = event.target();
                since = at;
                continue;
            }

            // First future event. A pending ramp pulls the value toward
            // its target; anything else holds the last value.
            if let Event::RampTo { value: target, at } = *event {
                let span = at - since;
                if span > 0.0 {
                    let progress = ((time - since) / span).clamp(0.0, 1.0);
                    value += (target - value) * progress as f32;
                } else {
                    value = target;
                }
            }
            break;
        }

        value
    }

    /// Events stay sorted by time; equal instants keep insertion order.
    fn insert(&mut self, event: Event) {
        let position = self.events.partition_point(|e| e.at() <= event.at());
        self.events.insert(position, event);
    }
}
