//! Port traits — the boundary between domain logic and the oven hardware.
//!
//! Driven adapters (PWM peripheral, relay GPIO, hardware counter)
//! implement these traits. The controller consumes them via generics, so
//! the control math never touches registers directly and the whole loop
//! runs under test with recording mocks.
//!
//! The one-wire bus pin and the microsecond delays use `embedded-hal`
//! traits directly (`InputPin + OutputPin`, `DelayNs`); the host link has
//! its own trait in [`crate::hmi::transport`].

/// Solid-state-relay drive: the PWM/compare peripheral that chops the
/// heating element.
pub trait ElementDrive {
    /// Start (or restart) the PWM output.
    fn start(&mut self);

    /// Stop the PWM output; the element de-energises within one period.
    fn stop(&mut self);

    /// Program the compare register. The element conducts for
    /// `compare + 1` counts of the period.
    fn set_compare(&mut self, compare: u8);

    /// The hardware period register value (counts per PWM cycle).
    fn period(&self) -> u8;
}

/// The electromechanical isolation relay in series with the SSR.
///
/// Contract: engage before the first PWM pulse and allow the configured
/// settle time (contact bounce/arcing); disengage only after the SSR has
/// cleared.
pub trait IsolationRelay {
    fn engage(&mut self);
    fn disengage(&mut self);
}

/// Monotonic run timer backing elapsed-time computation.
///
/// The controller restarts it at the top of each run and derives both
/// `current_time` and the control cycle index from it. Implementations
/// must be monotonic between restarts; wrap-around is not expected within
/// a run (u32 microseconds covers > 1 h, the hardware counter is wider).
pub trait RunTimer {
    /// Seconds elapsed since the last `restart` (or since boot).
    fn elapsed_secs(&self) -> f32;

    /// Re-zero the elapsed time.
    fn restart(&mut self);
}
