//! Easing functions. The core only ships the one curve every keyframe
//! sequence can fall back to (`Linear`) plus a `Custom` escape hatch for
//! whatever curve library the caller already links — reproducing a full
//! easing catalogue here would just be a second copy of that library
//! (spec.md's non-goals: "does not implement easing curves themselves").

use std::sync::Arc;

/// `args` carries whatever the curve needs beyond `t` (overshoot factor,
/// exponent, ...), mirroring `animkeyframe_priv.args` in the original.
pub type EasingFn = Arc<dyn Fn(f64, &[f64]) -> f64 + Send + Sync>;

#[derive(Clone)]
pub enum Easing {
    Linear,
    Custom(EasingFn),
}

impl Easing {
    pub fn apply(&self, t: f64, args: &[f64]) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::Custom(f) => f(t, args),
        }
    }
}

impl std::fmt::Debug for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Easing::Linear => write!(f, "Easing::Linear"),
            Easing::Custom(_) => write!(f, "Easing::Custom(..)"),
        }
    }
}
