//! Cross-flag consistency fixes applied after the policy cascade.
//!
//! Nothing here is fatal: inconsistent combinations are corrected and a
//! warning is raised when the user asked for the losing value explicitly.

use vmflags_registry::keys::{
	BackgroundCompilation, CICompilerCount, CICompilerCountPerCPU, EliminateLocks, EliminateNestedLocks,
	IncrementalInline, IncrementalInlineMH, IncrementalInlineVirtual, Inline, LoopStripMiningIter,
	LoopStripMiningIterShortLoop, MaxLoopPad, OptoLoopAlignment, PostLoopMultiversioning, ProfileInterpreter,
	RangeCheckElimination, ReplayCompiles, SegmentedCodeCache, TieredCompilation, TypeProfileLevel,
	UseCompiler, UseCountedLoopSafepoints, UseLoopCounter, UseOnStackReplacement, UseTypeSpeculation,
};

use crate::Ergonomics;

/// Compiler threads for `processors` when sizing per CPU: `log n * log log n * 3/2`, at least 2.
fn compiler_count_for(processors: usize) -> isize {
	let log_cpu = processors.max(1).ilog2() as isize;
	let loglog_cpu = log_cpu.max(1).ilog2() as isize;
	(log_cpu * loglog_cpu * 3 / 2).max(2)
}

impl Ergonomics<'_> {
	pub(crate) fn check_consistency(&mut self) {
		if self.value(UseOnStackReplacement) && !self.value(UseLoopCounter) {
			self.warn("On-stack-replacement requires loop counters; enabling loop counters".to_string());
			self.set_default(UseLoopCounter, true);
		}

		if self.value(ProfileInterpreter) && self.registry.compiler().is_light_simple_only() {
			if !self.is_default(ProfileInterpreter) {
				self.warn("ProfileInterpreter disabled due to client emulation mode".to_string());
			}
			self.set(ProfileInterpreter, false);
		}

		if self.value(BackgroundCompilation) && self.value(ReplayCompiles) {
			if !self.is_default(BackgroundCompilation) {
				self.warn("BackgroundCompilation disabled due to ReplayCompiles option.".to_string());
			}
			self.set(BackgroundCompilation, false);
		}

		if self.registry.compiler().is_interpreter_only() {
			self.interpreter_only();
		} else {
			self.compiler_threads();
		}

		if self.registry.host().has_heavy() {
			self.heavy_follow_ups();
		}
	}

	fn interpreter_only(&mut self) {
		if self.value(UseCompiler) {
			if !self.is_default(UseCompiler) {
				self.warn("UseCompiler disabled due to -Xint.".to_string());
			}
			self.set(UseCompiler, false);
		}
		if self.value(ProfileInterpreter) {
			self.set(ProfileInterpreter, false);
		}
		if self.value(TieredCompilation) {
			self.set(TieredCompilation, false);
		}
		if self.value(SegmentedCodeCache) {
			self.warn("SegmentedCodeCache has no meaningful effect with -Xint".to_string());
			self.set_default(SegmentedCodeCache, false);
		}
	}

	fn compiler_threads(&mut self) {
		let per_cpu = self.value(CICompilerCountPerCPU);
		let explicit_count = !self.is_default(CICompilerCount);
		if per_cpu && explicit_count && !self.is_default(CICompilerCountPerCPU) {
			self.warn("The VM option CICompilerCountPerCPU overrides CICompilerCount.".to_string());
		}
		if self.is_default(CICompilerCountPerCPU) && explicit_count {
			self.set_default(CICompilerCountPerCPU, false);
		}
		if self.value(CICompilerCountPerCPU) {
			let count = compiler_count_for(self.registry.host().processors);
			self.set(CICompilerCount, count);
		}
	}

	fn heavy_follow_ups(&mut self) {
		if !self.value(EliminateLocks) {
			self.set_default(EliminateNestedLocks, false);
		}
		if !self.value(Inline) || !self.value(IncrementalInline) {
			self.set_default(IncrementalInline, false);
			self.set_default(IncrementalInlineMH, false);
			self.set_default(IncrementalInlineVirtual, false);
		}
		if !self.value(UseTypeSpeculation) && self.is_default(TypeProfileLevel) {
			self.set_default(TypeProfileLevel, 0);
		}
		if self.value(PostLoopMultiversioning) && !self.value(RangeCheckElimination) {
			if !self.is_default(PostLoopMultiversioning) {
				self.warn("PostLoopMultiversioning disabled because RangeCheckElimination is disabled.".to_string());
			}
			self.set(PostLoopMultiversioning, false);
		}
		if !self.is_default(OptoLoopAlignment) && self.is_default(MaxLoopPad) {
			let pad = self.value(OptoLoopAlignment) - 1;
			self.set_default(MaxLoopPad, pad);
		}

		let user_set = !self.is_default(UseCountedLoopSafepoints) || !self.is_default(LoopStripMiningIter);
		let counted = self.value(UseCountedLoopSafepoints);
		let iterations = self.value(LoopStripMiningIter);
		if counted && iterations == 0 {
			if user_set {
				self.warn(
					"When counted loop safepoints are enabled, LoopStripMiningIter must be at least 1 \
					 (a safepoint every 1 iteration): setting it to 1"
						.to_string(),
				);
			}
			self.set_default(LoopStripMiningIter, 1);
		} else if !counted && iterations > 0 {
			if user_set {
				self.warn(
					"Disabling counted safepoints implies no loop strip mining: setting LoopStripMiningIter to 0"
						.to_string(),
				);
			}
			self.set_default(LoopStripMiningIter, 0);
		}
		if self.is_default(LoopStripMiningIterShortLoop) {
			let short = self.value(LoopStripMiningIter) / 10;
			self.set_default(LoopStripMiningIterShortLoop, short);
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::compiler_count_for;

	#[rstest]
	#[case(1, 2)]
	#[case(2, 2)]
	#[case(8, 4)]
	#[case(16, 12)]
	#[case(64, 18)]
	#[case(256, 36)]
	fn compiler_threads_grow_with_processors(#[case] processors: usize, #[case] expected: isize) {
		assert_eq!(compiler_count_for(processors), expected);
	}
}
