//! Sample arithmetic for the software audio mix.

/// Sum `inputs` sample-wise into `frames` samples, clamped to [-1.0, 1.0].
///
/// Inputs shorter than `frames` are padded with silence.
pub fn mix_sum(inputs: &[Vec<f32>], frames: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; frames];
    for input in inputs {
        for (acc, s) in out.iter_mut().zip(input) {
            *acc += s;
        }
    }
    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

/// Convert f32 samples to 16-bit little-endian PCM, clamping out-of-range values.
pub fn to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        data.extend_from_slice(&v.to_le_bytes());
    }
    data
}

pub fn from_pcm16(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
        .collect()
}

pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Linear-interpolation resample of mono audio.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let count = (samples.len() as f64 * ratio) as usize;
    (0..count)
        .map(|i| {
            let pos = i as f64 / ratio;
            let index = pos as usize;
            let frac = (pos - index as f64) as f32;
            match (samples.get(index), samples.get(index + 1)) {
                (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
                (Some(a), None) => *a,
                _ => 0.0,
            }
        })
        .collect()
}
