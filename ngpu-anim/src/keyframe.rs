//! Keyframe sequences and the evaluator that walks them. Grounded on
//! `original_source/libnodegl/animation.c`/`animation.h`
//! (`ngli_animation_init`/`ngli_animation_evaluate`) and spec.md §4.L.

use log::error;
use ngpu_core::error::{Error, Result};

use crate::blend::Blend;
use crate::easing::Easing;

/// Affine remap applied to the normalized time before easing and to the
/// eased ratio afterward (spec.md §4.L step 2, `kf1->scale_boundaries` in
/// the original).
#[derive(Copy, Clone, Debug)]
pub struct ScaleBoundaries {
    pub offsets: [f64; 2],
    pub boundaries: [f64; 2],
}

#[derive(Clone)]
pub struct Keyframe<T: Blend> {
    pub time: f64,
    pub value: T,
    pub easing: Easing,
    pub easing_args: Vec<f64>,
    pub scale_boundaries: Option<ScaleBoundaries>,
}

impl<T: Blend> Keyframe<T> {
    pub fn new(time: f64, value: T) -> Keyframe<T> {
        Keyframe { time, value, easing: Easing::Linear, easing_args: Vec::new(), scale_boundaries: None }
    }
}

/// An ordered, time-monotonic keyframe array plus the running cursor that
/// accelerates sequential evaluation (`struct animation` in the original).
pub struct KeyframeSequence<T: Blend> {
    keyframes: Vec<Keyframe<T>>,
    current_kf: i64,
}

impl<T: Blend> KeyframeSequence<T> {
    /// Fails with `INVALID_ARG` unless `time[i] <= time[i+1]` for every
    /// adjacent pair (`ngli_animation_init`).
    pub fn new(keyframes: Vec<Keyframe<T>>) -> Result<KeyframeSequence<T>> {
        let mut prev_time = f64::NEG_INFINITY;
        for kf in &keyframes {
            if kf.time < prev_time {
                error!("key frames must be monotonically increasing: {} < {}", kf.time, prev_time);
                return Err(Error::invalid_arg(format!(
                    "keyframes must be monotonically increasing: {} < {}",
                    kf.time, prev_time
                )));
            }
            prev_time = kf.time;
        }
        Ok(KeyframeSequence { keyframes, current_kf: 0 })
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Largest index `i` with `time[i] <= t`, scanning from `start`; `None`
    /// if every keyframe from `start` onward is already past `t`
    /// (`get_kf_id` in the original).
    fn find_kf(&self, start: usize, t: f64) -> Option<usize> {
        let mut found = None;
        for (i, kf) in self.keyframes.iter().enumerate().skip(start) {
            if kf.time > t {
                break;
            }
            found = Some(i);
        }
        found
    }

    /// Evaluates the sequence at time `t`. A no-op on an empty sequence
    /// (mirrors `ngli_animation_evaluate`'s `if (!nb_animkf) return 0`) —
    /// the caller must seed `dst` itself in that case.
    pub fn evaluate(&mut self, t: f64) -> Option<T> {
        let n = self.keyframes.len();
        if n == 0 {
            return None;
        }

        let start = self.current_kf.max(0) as usize;
        let kf_id = self.find_kf(start, t).or_else(|| self.find_kf(0, t));

        match kf_id {
            Some(i) if i < n - 1 => {
                let (kf0, kf1) = (&self.keyframes[i], &self.keyframes[i + 1]);
                let mut tnorm = (t - kf0.time) / (kf1.time - kf0.time);
                if let Some(b) = kf1.scale_boundaries {
                    tnorm = (b.offsets[1] - b.offsets[0]) * tnorm + b.offsets[0];
                }
                let mut ratio = kf1.easing.apply(tnorm, &kf1.easing_args);
                if let Some(b) = kf1.scale_boundaries {
                    ratio = (ratio - b.boundaries[0]) / (b.boundaries[1] - b.boundaries[0]);
                }
                self.current_kf = i as i64;
                Some(T::mix(&kf0.value, &kf1.value, ratio))
            }
            _ => {
                let edge = if t < self.keyframes[0].time { &self.keyframes[0] } else { &self.keyframes[n - 1] };
                Some(T::cpy(&edge.value))
            }
        }
    }
}

/// Time-animated nodes require linear easing and non-decreasing values;
/// rejects anything else at construction (spec.md §4.L "Time-animated
/// nodes require linear easing only").
pub fn validate_time_sequence(keyframes: &[Keyframe<f64>]) -> Result<()> {
    let mut prev = f64::NEG_INFINITY;
    for kf in keyframes {
        if !matches!(kf.easing, Easing::Linear) {
            return Err(Error::invalid_arg("time-animated keyframes require linear easing"));
        }
        if kf.value < prev {
            return Err(Error::invalid_arg(format!("time-animated values must be non-decreasing: {} < {}", kf.value, prev)));
        }
        prev = kf.value;
    }
    Ok(())
}

/// A sequence plus an optional time-remap animation: when present, its
/// evaluated value becomes the query time fed into the main sequence
/// instead of `t` directly (spec.md §4.L, "streamed scalar/vec nodes").
pub struct StreamedSequence<T: Blend> {
    sequence: KeyframeSequence<T>,
    time_remap: Option<KeyframeSequence<f64>>,
}

impl<T: Blend> StreamedSequence<T> {
    pub fn new(sequence: KeyframeSequence<T>, time_remap: Option<KeyframeSequence<f64>>) -> StreamedSequence<T> {
        StreamedSequence { sequence, time_remap }
    }

    pub fn evaluate(&mut self, t: f64) -> Option<T> {
        let query_time = match &mut self.time_remap {
            Some(remap) => remap.evaluate(t)?,
            None => t,
        };
        self.sequence.evaluate(query_time)
    }
}
