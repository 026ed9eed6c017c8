use std::cell::Cell;

/// Monotonic millisecond clock driving the field's timers
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall-independent clock measured from construction
#[cfg(not(target_arch = "wasm32"))]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// `performance.now()` based clock; `Instant` is unavailable in the browser
#[cfg(target_arch = "wasm32")]
pub struct SystemClock {
    performance: Option<web_sys::Performance>,
    start: f64,
}

#[cfg(target_arch = "wasm32")]
impl SystemClock {
    pub fn new() -> Self {
        let performance = web_sys::window().and_then(|w| w.performance());
        let start = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
        Self { performance, start }
    }
}

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.performance
            .as_ref()
            .map(|p| p.now() - self.start)
            .unwrap_or(0.0)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
