//! Keyframe/animation evaluator: monotonic time indexing over a keyframe
//! array, type-generic mixing via [`Blend`], pluggable easing, and an
//! optional time-remap layer (spec.md §4.L).

pub mod blend;
pub mod easing;
pub mod keyframe;

pub use crate::blend::{Blend, Quat};
pub use crate::easing::{Easing, EasingFn};
pub use crate::keyframe::{validate_time_sequence, Keyframe, KeyframeSequence, ScaleBoundaries, StreamedSequence};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_monotonic_keyframes() {
        let kfs = vec![Keyframe::new(1.0, 0.0f32), Keyframe::new(0.5, 1.0f32)];
        assert!(KeyframeSequence::new(kfs).is_err());
    }

    #[test]
    fn linear_float_interpolation() {
        let kfs = vec![Keyframe::new(0.0, 0.0f32), Keyframe::new(1.0, 10.0f32), Keyframe::new(2.0, 0.0f32)];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        assert_eq!(seq.evaluate(0.5), Some(5.0));
        assert_eq!(seq.evaluate(1.0), Some(10.0));
        assert_eq!(seq.evaluate(1.5), Some(5.0));
    }

    #[test]
    fn clamps_before_first_and_after_last() {
        let kfs = vec![Keyframe::new(0.0, 1.0f32), Keyframe::new(1.0, 2.0f32)];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        assert_eq!(seq.evaluate(-1.0), Some(1.0));
        assert_eq!(seq.evaluate(2.0), Some(2.0));
    }

    #[test]
    fn scale_boundaries_remap() {
        let mut kf1 = Keyframe::new(1.0, 10.0f32);
        kf1.scale_boundaries = Some(ScaleBoundaries { offsets: [0.2, 0.8], boundaries: [0.0, 1.0] });
        let kfs = vec![Keyframe::new(0.0, 0.0f32), kf1];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        let got = seq.evaluate(0.25).unwrap();
        assert!((got - 3.5).abs() < 1e-4, "got {}", got);
    }

    #[test]
    fn cursor_accelerates_forward_scans_and_handles_backward_queries() {
        let kfs = vec![
            Keyframe::new(0.0, 0.0f32),
            Keyframe::new(1.0, 1.0f32),
            Keyframe::new(2.0, 2.0f32),
            Keyframe::new(3.0, 3.0f32),
        ];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        assert_eq!(seq.evaluate(2.5), Some(2.5));
        assert_eq!(seq.evaluate(0.5), Some(0.5));
    }

    #[test]
    fn vec3_componentwise_mix() {
        let kfs = vec![Keyframe::new(0.0, [0.0f32, 0.0, 0.0]), Keyframe::new(1.0, [2.0f32, 4.0, 6.0])];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        assert_eq!(seq.evaluate(0.5), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn buffer_mix_is_elementwise() {
        let kfs = vec![Keyframe::new(0.0, vec![0.0f32, 10.0]), Keyframe::new(1.0, vec![2.0f32, 20.0])];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        assert_eq!(seq.evaluate(0.5), Some(vec![1.0, 15.0]));
    }

    #[test]
    fn quat_slerp_at_midpoint_is_normalized() {
        let a = Quat([0.0, 0.0, 0.0, 1.0]);
        let b = Quat([1.0, 0.0, 0.0, 0.0]);
        let kfs = vec![Keyframe::new(0.0, a), Keyframe::new(1.0, b)];
        let mut seq = KeyframeSequence::new(kfs).unwrap();
        let mid = seq.evaluate(0.5).unwrap();
        let len_sq: f32 = mid.0.iter().map(|v| v * v).sum();
        assert!((len_sq - 1.0).abs() < 1e-4, "{:?}", mid);
    }

    #[test]
    fn time_sequence_rejects_non_linear_easing() {
        let mut kf = Keyframe::new(1.0, 1.0f64);
        kf.easing = Easing::Custom(std::sync::Arc::new(|t, _| t * t));
        assert!(validate_time_sequence(&[Keyframe::new(0.0, 0.0f64), kf]).is_err());
    }

    #[test]
    fn streamed_sequence_applies_time_remap() {
        let remap = KeyframeSequence::new(vec![Keyframe::new(0.0, 0.0f64), Keyframe::new(1.0, 2.0f64)]).unwrap();
        let main = KeyframeSequence::new(vec![Keyframe::new(0.0, 0.0f32), Keyframe::new(2.0, 20.0f32)]).unwrap();
        let mut streamed = StreamedSequence::new(main, Some(remap));
        assert_eq!(streamed.evaluate(0.5), Some(10.0));
    }
}
