//! Amplitude-threshold silence detection.
//!
//! A frame is non-silent when any of its channels reaches the linear
//! threshold derived from the noise floor. The detector reports the first
//! and last non-silent frame; everything outside that range is edge silence.

use strim_models::AudioBuffer;

/// Convert a dB value to a linear amplitude (`10^(db/20)`).
pub fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Check whether a frame has any channel at or above `epsilon`.
fn is_audible(frame: &[f32], epsilon: f64) -> bool {
    frame.iter().any(|sample| f64::from(sample.abs()) >= epsilon)
}

/// Find the first and last non-silent frame of `buffer`.
///
/// Returns `None` when fewer than two frames reach the threshold; such a
/// buffer is treated as silent (or too short to bound) and left untouched.
pub fn detect(buffer: &AudioBuffer, noise_floor_db: f64) -> Option<(usize, usize)> {
    let epsilon = db_to_amplitude(noise_floor_db);

    let first = buffer.frames().position(|frame| is_audible(frame, epsilon))?;
    let last = buffer.frames().rposition(|frame| is_audible(frame, epsilon))?;

    // A single audible frame is found by both scans
    if first == last {
        return None;
    }

    Some((first, last))
}
