//! Emulation of single-tier threshold flags.

use vmflags_registry::keys::{
	CompileThreshold, CompileThresholdScaling, InterpreterProfilePercentage, OnStackReplacePercentage,
	Tier0BackedgeNotifyFreqLog, Tier0InvokeNotifyFreqLog, Tier0ProfilingStartPercentage,
	Tier3BackEdgeThreshold, Tier3CompileThreshold, Tier3InvocationThreshold, Tier3MinInvocationThreshold,
	Tier4BackEdgeThreshold, Tier4CompileThreshold, Tier4InvocationThreshold, Tier4MinInvocationThreshold,
};

use crate::Ergonomics;
use crate::scaling::scaled_threshold;

/// Back-edge notifications stay at least this sparse (log2).
const MIN_BACKEDGE_FREQ_LOG: isize = 10;

/// `floor(log2(value))`, or -1 when `value` is not positive.
fn log2_graceful(value: isize) -> isize {
	if value <= 0 { -1 } else { value.ilog2() as isize }
}

impl Ergonomics<'_> {
	/// Derives per-tier thresholds from `CompileThreshold` and its percentages
	/// when only one compiler family is in use.
	pub(crate) fn legacy_emulation(&mut self) {
		let legacy_set = !self.is_default(CompileThreshold)
			|| !self.is_default(OnStackReplacePercentage)
			|| !self.is_default(InterpreterProfilePercentage);
		if legacy_set {
			self.emulate_single_tier();
		}

		let scale = self.value(CompileThresholdScaling);
		let threshold = self.value(CompileThreshold);
		if !self.is_default(CompileThresholdScaling) && scale > 0.0 && threshold > 0 {
			self.set_clamped(CompileThreshold, scaled_threshold(threshold, scale));
		}
	}

	fn emulate_single_tier(&mut self) {
		let config = self.registry.compiler();
		let light_only = config.is_light_only();
		if !light_only && !config.is_heavy_or_alt_only() {
			tracing::debug!(domain = "ergo", "tiered policy ignores legacy thresholds");
			return;
		}
		let valid = self.registry.check_constraint(CompileThreshold.id(), false).is_ok()
			&& self
				.registry
				.check_constraint(OnStackReplacePercentage.id(), false)
				.is_ok()
			&& self
				.registry
				.check_range(InterpreterProfilePercentage.id(), false)
				.is_ok();
		if !valid {
			return;
		}

		let threshold = self.value(CompileThreshold);
		let profile_percentage = self.value(InterpreterProfilePercentage);
		let profile_threshold = threshold.saturating_mul(profile_percentage) / 100;
		let osr_threshold = threshold.saturating_mul(self.value(OnStackReplacePercentage)) / 100;
		let osr_profile_threshold = osr_threshold.saturating_mul(profile_percentage) / 100;

		let (threshold_log, osr_threshold_log) = if light_only {
			(log2_graceful(threshold), log2_graceful(osr_threshold))
		} else {
			(log2_graceful(profile_threshold), log2_graceful(osr_profile_threshold))
		};
		if self.value(Tier0InvokeNotifyFreqLog) > threshold_log {
			self.set_clamped(Tier0InvokeNotifyFreqLog, threshold_log.max(0));
		}
		if self.value(Tier0BackedgeNotifyFreqLog) > osr_threshold_log {
			self.set_clamped(
				Tier0BackedgeNotifyFreqLog,
				osr_threshold_log.max(MIN_BACKEDGE_FREQ_LOG),
			);
		}

		if light_only {
			self.set_clamped(Tier3InvocationThreshold, threshold);
			self.set_clamped(Tier3MinInvocationThreshold, threshold);
			self.set_clamped(Tier3CompileThreshold, threshold);
			self.set_clamped(Tier3BackEdgeThreshold, osr_threshold);
		} else {
			self.set_clamped(Tier4InvocationThreshold, profile_threshold);
			self.set_clamped(Tier4MinInvocationThreshold, profile_threshold);
			self.set_clamped(Tier4CompileThreshold, profile_threshold);
			self.set_clamped(Tier4BackEdgeThreshold, osr_profile_threshold);
			self.set_clamped(Tier0ProfilingStartPercentage, profile_percentage);
		}
		tracing::debug!(
			domain = "ergo",
			threshold,
			osr_threshold,
			profile_threshold,
			light_only,
			"legacy thresholds emulated",
		);
	}
}
