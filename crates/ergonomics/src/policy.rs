//! Tiered policy defaults and threshold scaling.

use vmflags_registry::TypedFlagKey;
use vmflags_registry::bytesize::ByteSize;
use vmflags_registry::keys::{
	C1InlineStackLimit, CompileThresholdScaling, InlineSmallCode, ReservedCodeCacheSize, SegmentedCodeCache,
	TIERED_CODE_CACHE_CAP, Tier0BackedgeNotifyFreqLog, Tier0InvokeNotifyFreqLog,
	Tier0ProfilingStartPercentage, Tier2BackedgeNotifyFreqLog, Tier2InvokeNotifyFreqLog,
	Tier3BackEdgeThreshold, Tier3BackedgeNotifyFreqLog, Tier3CompileThreshold, Tier3InvocationThreshold,
	Tier3InvokeNotifyFreqLog, Tier3MinInvocationThreshold, Tier4BackEdgeThreshold, Tier4CompileThreshold,
	Tier4InvocationThreshold, Tier4MinInvocationThreshold, Tier23InlineeNotifyFreqLog, TieredStopAtLevel,
};

use crate::scaling::{scaled_freq_log, scaled_threshold};
use crate::{ErgoError, Ergonomics};

/// Tiered compilation grows the default code cache by this factor.
const TIERED_CODE_CACHE_FACTOR: u64 = 5;

/// Page size assumed when deciding whether segmenting the code cache pays off.
const CODE_CACHE_PAGE_SIZE: u64 = 4096;

const SCALED_THRESHOLDS: [TypedFlagKey<isize>; 8] = [
	Tier3InvocationThreshold,
	Tier3MinInvocationThreshold,
	Tier3CompileThreshold,
	Tier3BackEdgeThreshold,
	Tier4InvocationThreshold,
	Tier4MinInvocationThreshold,
	Tier4CompileThreshold,
	Tier4BackEdgeThreshold,
];

const SCALED_FREQ_LOGS: [TypedFlagKey<isize>; 7] = [
	Tier0InvokeNotifyFreqLog,
	Tier0BackedgeNotifyFreqLog,
	Tier2InvokeNotifyFreqLog,
	Tier2BackedgeNotifyFreqLog,
	Tier3InvokeNotifyFreqLog,
	Tier3BackedgeNotifyFreqLog,
	Tier23InlineeNotifyFreqLog,
];

/// Tier 3 thresholds and the tier 4 values they follow when the
/// intermediate tiers are skipped.
const FOLLOW_TIER4: [(TypedFlagKey<isize>, TypedFlagKey<isize>); 4] = [
	(Tier3InvocationThreshold, Tier4InvocationThreshold),
	(Tier3MinInvocationThreshold, Tier4MinInvocationThreshold),
	(Tier3CompileThreshold, Tier4CompileThreshold),
	(Tier3BackEdgeThreshold, Tier4BackEdgeThreshold),
];

impl Ergonomics<'_> {
	pub(crate) fn compilation_policy(&mut self) -> Result<(), ErgoError> {
		let config = self.registry.compiler();
		let tiered = config.is_tiered();
		let compile_only = config.is_compile_only();
		let light_only = config.is_light_only();
		let heavy_enabled = config.is_heavy_enabled();

		if tiered {
			self.tiered_code_cache();
			if compile_only {
				if self.is_default(Tier3InvokeNotifyFreqLog) {
					self.set(Tier3InvokeNotifyFreqLog, 0);
				}
				if self.is_default(Tier4InvocationThreshold) {
					self.set(Tier4InvocationThreshold, 0);
				}
			}
		}

		let scale = self.value(CompileThresholdScaling);
		if scale < 0.0 {
			return Err(ErgoError::NegativeScaling { value: scale });
		}

		if self.registry.compiler_mode().disables_intermediate() {
			self.skip_intermediate_defaults();
		}

		if !self.is_default(CompileThresholdScaling) && scale > 0.0 {
			for key in SCALED_FREQ_LOGS {
				let scaled = scaled_freq_log(self.value(key), scale);
				self.set_clamped(key, scaled);
			}
			for key in SCALED_THRESHOLDS {
				let scaled = scaled_threshold(self.value(key), scale);
				self.set_clamped(key, scaled);
			}
		}

		if self.is_default(C1InlineStackLimit) && self.value(TieredStopAtLevel) == 4 && !light_only {
			self.set_default(C1InlineStackLimit, 5);
		}
		if tiered && heavy_enabled && self.is_default(InlineSmallCode) {
			self.set_default(InlineSmallCode, 2500);
		}
		Ok(())
	}

	fn tiered_code_cache(&mut self) {
		if self.is_default(ReservedCodeCacheSize) {
			let grown = self
				.value(ReservedCodeCacheSize)
				.as_u64()
				.saturating_mul(TIERED_CODE_CACHE_FACTOR)
				.min(TIERED_CODE_CACHE_CAP);
			self.set(ReservedCodeCacheSize, ByteSize(grown));
		}
		let reserved = self.value(ReservedCodeCacheSize).as_u64();
		if self.is_default(SegmentedCodeCache)
			&& reserved >= TIERED_CODE_CACHE_CAP
			&& 8 * CODE_CACHE_PAGE_SIZE <= reserved
		{
			self.set(SegmentedCodeCache, true);
		}
	}

	fn skip_intermediate_defaults(&mut self) {
		let defaults = [
			(Tier0ProfilingStartPercentage, 33),
			(Tier4InvocationThreshold, 5000),
			(Tier4MinInvocationThreshold, 600),
			(Tier4CompileThreshold, 10000),
			(Tier4BackEdgeThreshold, 15000),
		];
		for (key, value) in defaults {
			if self.is_default(key) {
				self.set_default(key, value);
			}
		}
		for (tier3, tier4) in FOLLOW_TIER4 {
			if self.is_default(tier3) {
				let value = self.value(tier4);
				self.set_default(tier3, value);
			}
		}
	}
}
