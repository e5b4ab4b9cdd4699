use std::cell::Cell;
use std::rc::Rc;

/// Simulated monotonic clock shared between the host loop, which advances
/// it one display refresh at a time, and the audio graph, which reads it.
#[derive(Clone, Debug, Default)]
pub struct HostClock(Rc<Cell<f64>>);

impl HostClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.0.get()
    }

    pub fn advance(&self, seconds: f64) {
        self.0.set(self.0.get() + seconds);
    }
}
