//! Type dispatch for keyframe mixing (spec.md §4.L's type-dispatch table).
//! One `Blend` impl per supported value type; `KeyframeSequence::evaluate`
//! is generic over it so the dispatch monomorphizes instead of going
//! through a function pointer on the hot path.

/// `mix` blends two samples by `ratio ∈ [0, 1]`; `cpy` produces the
/// out-of-range or single-keyframe value. Scalar/vector/quaternion types
/// get `cpy` for free from `Clone`; only buffers override it to avoid an
/// extra allocation in the hot in-range path.
pub trait Blend: Clone {
    fn mix(a: &Self, b: &Self, ratio: f64) -> Self;

    fn cpy(src: &Self) -> Self {
        src.clone()
    }
}

impl Blend for f32 {
    fn mix(a: &f32, b: &f32, ratio: f64) -> f32 {
        (*a as f64 + (*b as f64 - *a as f64) * ratio) as f32
    }
}

/// The "scalar time" row of the dispatch table: a double lerped and
/// copied without narrowing, for timestamp-valued keyframes.
impl Blend for f64 {
    fn mix(a: &f64, b: &f64, ratio: f64) -> f64 {
        a + (b - a) * ratio
    }
}

impl Blend for [f32; 2] {
    fn mix(a: &[f32; 2], b: &[f32; 2], ratio: f64) -> [f32; 2] {
        [f32::mix(&a[0], &b[0], ratio), f32::mix(&a[1], &b[1], ratio)]
    }
}

impl Blend for [f32; 3] {
    fn mix(a: &[f32; 3], b: &[f32; 3], ratio: f64) -> [f32; 3] {
        [f32::mix(&a[0], &b[0], ratio), f32::mix(&a[1], &b[1], ratio), f32::mix(&a[2], &b[2], ratio)]
    }
}

impl Blend for [f32; 4] {
    fn mix(a: &[f32; 4], b: &[f32; 4], ratio: f64) -> [f32; 4] {
        [
            f32::mix(&a[0], &b[0], ratio),
            f32::mix(&a[1], &b[1], ratio),
            f32::mix(&a[2], &b[2], ratio),
            f32::mix(&a[3], &b[3], ratio),
        ]
    }
}

impl Blend for [f32; 16] {
    fn mix(a: &[f32; 16], b: &[f32; 16], ratio: f64) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for i in 0..16 {
            out[i] = f32::mix(&a[i], &b[i], ratio);
        }
        out
    }
}

/// Unit quaternion `[x, y, z, w]`, mixed with spherical-linear
/// interpolation rather than the componentwise lerp every other vector
/// type gets (spec.md §4.L).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quat(pub [f32; 4]);

impl Blend for Quat {
    fn mix(a: &Quat, b: &Quat, ratio: f64) -> Quat {
        Quat(slerp(a.0, b.0, ratio as f32))
    }
}

fn slerp(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    let mut dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    if dot < 0.0 {
        for v in b.iter_mut() {
            *v = -*v;
        }
        dot = -dot;
    }
    const DOT_THRESHOLD: f32 = 0.9995;
    if dot > DOT_THRESHOLD {
        let mut out = [0.0f32; 4];
        for i in 0..4 {
            out[i] = a[i] + (b[i] - a[i]) * t;
        }
        return normalize(out);
    }
    let theta_0 = dot.acos();
    let theta = theta_0 * t;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();
    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;
    let mut out = [0.0f32; 4];
    for i in 0..4 {
        out[i] = s0 * a[i] + s1 * b[i];
    }
    out
}

fn normalize(q: [f32; 4]) -> [f32; 4] {
    let len = (q.iter().map(|v| v * v).sum::<f32>()).sqrt();
    if len == 0.0 {
        return q;
    }
    [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
}

/// The "buffer-of-vecK" row: a flat float buffer lerped element by
/// element, covering plain scalar buffers and any fixed-width vector
/// buffer alike since the lerp never looks past one component at a time.
impl Blend for Vec<f32> {
    fn mix(a: &Vec<f32>, b: &Vec<f32>, ratio: f64) -> Vec<f32> {
        debug_assert_eq!(a.len(), b.len(), "buffer keyframes must share element count");
        a.iter().zip(b.iter()).map(|(x, y)| f32::mix(x, y, ratio)).collect()
    }

    fn cpy(src: &Vec<f32>) -> Vec<f32> {
        src.clone()
    }
}
