use super::*;

/// Computes `1 - e^(-x)` with numerical stability.
/// Returns 0.0 at x=0, saturates to 1.0 as x increases.
fn exponential_saturation(x: f64) -> f64 {
    // Beyond this, `e^(-x) < f64::EPSILON` and the subtraction rounds to
    // exactly 1.0. Derived from `-ln(f64::EPSILON) = 36.04`.
    -(-x.min(36.0)).exp_m1()
}

/// Exponentially decaying average of locally attempted hashes per second.
/// Shared between search threads and the sealer loop.
#[derive(Debug, Clone)]
pub(crate) struct RateMeter {
    inner: Arc<Mutex<Decaying>>,
}

#[derive(Debug)]
struct Decaying {
    value: f64,
    window: Duration,
    last_update: Instant,
}

impl RateMeter {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Decaying {
                value: 0.0,
                window,
                last_update: Instant::now(),
            })),
        }
    }

    pub(crate) fn record(&self, hashes: f64) {
        self.record_at(hashes, Instant::now());
    }

    fn record_at(&self, hashes: f64, now: Instant) {
        let mut inner = self.inner.lock();

        let elapsed = now.duration_since(inner.last_update).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }

        let decay_factor = exponential_saturation(elapsed / inner.window.as_secs_f64());
        let normalizer = 1.0 + decay_factor;

        inner.value = (inner.value + (hashes / elapsed) * decay_factor) / normalizer;
        inner.last_update = now;
    }

    pub(crate) fn value(&self) -> f64 {
        self.inner.lock().value
    }
}
