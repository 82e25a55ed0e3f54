//! Threshold and notification-frequency scaling by `CompileThresholdScaling`.

/// Width of an invocation counter in bits.
pub const COUNTER_BITS: u32 = 31;

/// Scales a compile threshold.
///
/// A factor of exactly `1.0` or a negative factor leaves `threshold`
/// unchanged. Otherwise the product is rounded and saturates at
/// `isize::MAX`.
pub fn scaled_threshold(threshold: isize, scale: f64) -> isize {
	if scale == 1.0 || scale < 0.0 {
		return threshold;
	}
	let scaled = (threshold as f64 * scale).round();
	if scaled.is_nan() || scaled >= isize::MAX as f64 {
		return isize::MAX;
	}
	scaled as isize
}

/// Scales a notification frequency given as a power-of-two exponent.
///
/// The result never exceeds [`COUNTER_BITS`]` + 1`.
pub fn scaled_freq_log(freq_log: isize, scale: f64) -> isize {
	if scale == 1.0 || scale < 0.0 {
		return freq_log;
	}
	if scale == 0.0 || freq_log <= 0 {
		return 0;
	}
	let max_bits = (COUNTER_BITS + 1) as isize;
	if freq_log >= isize::BITS as isize - 1 {
		return max_bits;
	}
	let scaled = scaled_threshold(1 << freq_log, scale);
	if scaled <= 0 {
		return 0;
	}
	(scaled.ilog2() as isize).min(max_bits)
}
