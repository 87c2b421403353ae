//! Temperature-vs-time recipes.
//!
//! A recipe is an ordered list of setpoints defining the desired
//! temperature trajectory. Step 0 anchors time 0; times are expected to
//! be non-decreasing (the HMI is responsible for authoring sane recipes —
//! see the upload validation in [`crate::hmi::protocol`]).

use heapless::Vec;

use crate::hmi::MAX_RECIPE_STEPS;

/// One recipe setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecipeStep {
    /// Setpoint time (seconds from recipe start).
    pub time_secs: f32,
    /// Target temperature at that time (°C).
    pub temperature_c: f32,
}

/// Fixed-capacity recipe storage. Capacity is pinned by the 64-byte HMI
/// frame: (64 − 2) / 4 = 15 steps.
#[derive(Debug, Clone, Default)]
pub struct Recipe {
    steps: Vec<RecipeStep, MAX_RECIPE_STEPS>,
}

impl Recipe {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Replace the whole recipe. Returns `false` (leaving the recipe
    /// untouched) if `steps` exceeds capacity.
    pub fn replace(&mut self, steps: &[RecipeStep]) -> bool {
        if steps.len() > MAX_RECIPE_STEPS {
            return false;
        }
        self.steps.clear();
        for s in steps {
            // Capacity checked above.
            let _ = self.steps.push(*s);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecipeStep> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[RecipeStep] {
        &self.steps
    }

    /// Desired temperature at time `t` between two bracketing steps,
    /// by linear interpolation on the elapsed fraction of the span.
    pub fn interpolate(prev: &RecipeStep, next: &RecipeStep, t: f32) -> f32 {
        let span = next.time_secs - prev.time_secs;
        let ratio = (t - prev.time_secs) / span;
        next.temperature_c * ratio + prev.temperature_c * (1.0 - ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(t: f32, temp: f32) -> RecipeStep {
        RecipeStep {
            time_secs: t,
            temperature_c: temp,
        }
    }

    #[test]
    fn replace_and_read_back() {
        let mut r = Recipe::new();
        assert!(r.replace(&[step(0.0, 25.0), step(60.0, 150.0)]));
        assert_eq!(r.len(), 2);
        assert_eq!(r.get(1).unwrap().temperature_c, 150.0);
    }

    #[test]
    fn replace_rejects_over_capacity() {
        let mut r = Recipe::new();
        assert!(r.replace(&[step(0.0, 25.0), step(60.0, 150.0)]));
        let too_many = [step(0.0, 0.0); MAX_RECIPE_STEPS + 1];
        assert!(!r.replace(&too_many));
        // Old recipe untouched.
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn midpoint_interpolation_is_mean_of_endpoints() {
        let a = step(0.0, 100.0);
        let b = step(60.0, 200.0);
        let mid = Recipe::interpolate(&a, &b, 30.0);
        assert!((mid - 150.0).abs() < 1e-4);
    }

    #[test]
    fn interpolation_hits_endpoints() {
        let a = step(10.0, 50.0);
        let b = step(40.0, 80.0);
        assert!((Recipe::interpolate(&a, &b, 10.0) - 50.0).abs() < 1e-4);
        assert!((Recipe::interpolate(&a, &b, 40.0) - 80.0).abs() < 1e-4);
    }
}
