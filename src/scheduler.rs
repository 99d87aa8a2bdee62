//! Frame scheduling with explicit cancellation
//!
//! The host loop polls each schedule once per display frame with the current
//! session time. A schedule only fires while armed; `cancel()` disarms it
//! synchronously so nothing runs after it returns.

/// First-frame step when no baseline timestamp exists (one 60 fps frame)
pub const DEFAULT_FRAME_DT: f64 = 0.016;

/// When a schedule fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cadence {
    /// Every display refresh
    Refresh,
    /// Fixed period in seconds
    Interval(f64),
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    last: Option<f64>,
    next_due: Option<f64>,
}

/// A single cancellable scheduling chain
#[derive(Debug, Clone)]
pub struct FrameSchedule {
    cadence: Cadence,
    armed: Option<Armed>,
}

impl FrameSchedule {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            armed: None,
        }
    }

    pub fn refresh() -> Self {
        Self::new(Cadence::Refresh)
    }

    pub fn interval(seconds: f64) -> Self {
        Self::new(Cadence::Interval(seconds))
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Arm the schedule with an optional baseline timestamp.
    /// Returns false (and changes nothing) if it is already armed.
    pub fn start(&mut self, baseline: Option<f64>) -> bool {
        if self.armed.is_some() {
            return false;
        }
        let next_due = match self.cadence {
            Cadence::Interval(period) => baseline.map(|t| t + period),
            Cadence::Refresh => None,
        };
        self.armed = Some(Armed {
            last: baseline,
            next_due,
        });
        true
    }

    /// Disarm. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    /// Poll at time `now`. Returns the elapsed seconds since the previous tick
    /// when a tick fires, `None` otherwise.
    pub fn poll(&mut self, now: f64) -> Option<f64> {
        let cadence = self.cadence;
        let armed = self.armed.as_mut()?;

        match cadence {
            Cadence::Refresh => {
                let dt = armed.last.map_or(DEFAULT_FRAME_DT, |last| (now - last).max(0.0));
                armed.last = Some(now);
                Some(dt)
            },
            Cadence::Interval(period) => {
                let Some(due) = armed.next_due else {
                    // Armed without a baseline: first poll sets the phase
                    armed.last = Some(now);
                    armed.next_due = Some(now + period);
                    return None;
                };
                if now < due {
                    return None;
                }
                let dt = armed.last.map_or(period, |last| now - last);
                armed.last = Some(now);
                // Host stalled for more than a period: fire once and resync
                let next = due + period;
                armed.next_due = Some(if next <= now { now + period } else { next });
                Some(dt)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unarmed_never_fires() {
        let mut s = FrameSchedule::refresh();
        assert_eq!(s.poll(1.0), None);
        let mut t = FrameSchedule::interval(0.5);
        assert_eq!(t.poll(10.0), None);
    }

    #[test]
    fn test_refresh_first_frame_default() {
        let mut s = FrameSchedule::refresh();
        assert!(s.start(None));
        assert_eq!(s.poll(3.0), Some(DEFAULT_FRAME_DT));
        let dt = s.poll(3.25).unwrap();
        assert!((dt - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_refresh_uses_baseline() {
        let mut s = FrameSchedule::refresh();
        s.start(Some(1.0));
        let dt = s.poll(1.02).unwrap();
        assert!((dt - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut s = FrameSchedule::interval(0.5);
        assert!(s.start(Some(0.0)));
        assert!(!s.start(Some(0.3)));
        // Phase still comes from the first start
        assert_eq!(s.poll(0.45), None);
        assert!(s.poll(0.5).is_some());
    }

    #[test]
    fn test_interval_fires_once_per_period() {
        let mut s = FrameSchedule::interval(0.5);
        s.start(Some(0.0));
        let mut fired = 0;
        let mut t = 0.0;
        while t < 2.01 {
            if s.poll(t).is_some() {
                fired += 1;
            }
            t += 1.0 / 64.0;
        }
        assert_eq!(fired, 4);
    }

    #[test]
    fn test_interval_resyncs_after_stall() {
        let mut s = FrameSchedule::interval(0.5);
        s.start(Some(0.0));
        assert!(s.poll(5.0).is_some());
        // No burst of catch-up ticks
        assert_eq!(s.poll(5.01), None);
        assert!(s.poll(5.5).is_some());
    }

    #[test]
    fn test_interval_without_baseline() {
        let mut s = FrameSchedule::interval(0.5);
        s.start(None);
        assert_eq!(s.poll(100.0), None);
        assert_eq!(s.poll(100.4), None);
        assert!(s.poll(100.5).is_some());
    }

    #[test]
    fn test_cancel_is_immediate() {
        let mut s = FrameSchedule::refresh();
        s.start(Some(0.0));
        assert!(s.cancel());
        assert!(!s.is_armed());
        assert_eq!(s.poll(1.0), None);
        assert!(!s.cancel());
    }
}
