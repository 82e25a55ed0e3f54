//! Constraint functions for the built-in flags.
//!
//! Each function sees the candidate value through [`ConstraintCx`] and may read
//! any other flag. Messages end with a newline like every other VM diagnostic.

use super::*;
use crate::compiler::CompilerMode;
use crate::flags::{Check, ConstraintCx, Violation};

/// Bits of an invocation counter not used for counting.
pub const COUNT_SHIFT: u32 = 1;

type Outcome = Result<Check, Violation>;

fn intx(cx: &ConstraintCx<'_>) -> isize {
	cx.value::<isize>().unwrap_or_default()
}

fn uintx(cx: &ConstraintCx<'_>) -> usize {
	cx.value::<usize>().unwrap_or_default()
}

pub(super) fn compilation_mode(cx: &ConstraintCx<'_>) -> Outcome {
	let Some(mode) = cx.value::<Option<String>>().flatten() else {
		return Ok(Check::Pass);
	};
	if CompilerMode::parse(&mode).is_some() {
		return Ok(Check::Pass);
	}
	let available = CompilerMode::available(cx.registry().host().backends);
	Err(Violation::new(format!(
		"Unsupported compilation mode '{mode}', available modes are: {}\n",
		available.join(", ")
	)))
}

fn check_compile_threshold(value: isize) -> Result<(), String> {
	let limit = (i32::MAX >> COUNT_SHIFT) as isize;
	if value < 0 || value > limit {
		return Err(format!("CompileThreshold ({value}) must be between 0 and {limit}\n"));
	}
	Ok(())
}

pub(super) fn compile_threshold(cx: &ConstraintCx<'_>) -> Outcome {
	check_compile_threshold(intx(cx)).map(|()| Check::Pass).map_err(Violation)
}

pub(super) fn on_stack_replace_percentage(cx: &ConstraintCx<'_>) -> Outcome {
	let value = intx(cx) as i64;
	let threshold = cx.flag(CompileThreshold) as i64;
	if check_compile_threshold(threshold as isize).is_err() {
		return Err(Violation::new(
			"OnStackReplacePercentage cannot be validated because CompileThreshold value is invalid\n",
		));
	}

	let profile = cx.flag(ProfileInterpreter);
	let mut max_percentage = i64::from(i32::MAX);
	if !profile {
		max_percentage >>= COUNT_SHIFT;
	}
	max_percentage = if threshold == 0 {
		max_percentage * 100
	} else {
		max_percentage * 100 / threshold
	};

	if profile {
		let ipp = cx.flag(InterpreterProfilePercentage) as i64;
		if value < ipp {
			return Err(Violation::new(format!(
				"OnStackReplacePercentage ({value}) must be larger than InterpreterProfilePercentage ({ipp})\n"
			)));
		}
		max_percentage += ipp;
	} else if value < 0 {
		return Err(Violation::new(format!(
			"OnStackReplacePercentage ({value}) must be non-negative\n"
		)));
	}
	if value > max_percentage {
		return Err(Violation::new(format!(
			"OnStackReplacePercentage ({value}) must be between 0 and {max_percentage}\n"
		)));
	}
	Ok(Check::Pass)
}

pub(super) fn ci_compiler_count(cx: &ConstraintCx<'_>) -> Outcome {
	let value = intx(cx);
	let compiler = cx.registry().compiler();
	let min = if compiler.is_tiered() {
		2
	} else if !compiler.is_interpreter_only() {
		1
	} else {
		0
	};
	if value < min {
		return Err(Violation::new(format!(
			"CICompilerCount ({value}) must be at least {min} \n"
		)));
	}
	Ok(Check::Pass)
}

pub(super) fn reserved_code_cache_size(cx: &ConstraintCx<'_>) -> Outcome {
	let reserved = cx.value::<bytesize::ByteSize>().map_or(0, |v| v.as_u64());
	let initial = cx.flag(InitialCodeCacheSize).as_u64();
	if reserved < initial {
		return Err(Violation::new(format!(
			"Invalid ReservedCodeCacheSize: {}K. Must be at least InitialCodeCacheSize={}K.\n",
			reserved / K,
			initial / K
		)));
	}
	Ok(Check::Pass)
}

pub(super) fn type_profile_level(cx: &ConstraintCx<'_>) -> Outcome {
	let original = uintx(cx);
	let mut value = original;
	for position in 0..3 {
		if value % 10 > 2 {
			return Err(Violation::new(format!(
				"Invalid value ({original}) in TypeProfileLevel at position {position}\n"
			)));
		}
		value /= 10;
	}
	Ok(Check::Pass)
}

pub(super) fn opto_loop_alignment(cx: &ConstraintCx<'_>) -> Outcome {
	let value = intx(cx);
	if value <= 0 || (value & (value - 1)) != 0 {
		return Err(Violation::new(format!(
			"OptoLoopAlignment ({value}) must be a power of two\n"
		)));
	}
	Ok(Check::Pass)
}

/// Soft constraint: keeps strip mining consistent with counted loop safepoints.
pub(super) fn loop_strip_mining_iter(cx: &ConstraintCx<'_>) -> Outcome {
	let value = uintx(cx);
	let safepoints = cx.flag(UseCountedLoopSafepoints);
	let user_set = !cx.is_default(UseCountedLoopSafepoints) || !cx.is_default(LoopStripMiningIter);
	if safepoints && value == 0 {
		if user_set {
			tracing::warn!(
				domain = "flags",
				flag = cx.name(),
				"When counted loop safepoints are enabled, LoopStripMiningIter must be at least 1 (a safepoint every 1 iteration): setting it to 1",
			);
		}
		return Ok(Check::Corrected(FlagValue::Uintx(1)));
	}
	if !safepoints && value > 0 {
		if user_set {
			tracing::warn!(
				domain = "flags",
				flag = cx.name(),
				"Disabling counted safepoints implies no loop strip mining: setting LoopStripMiningIter to 0",
			);
		}
		return Ok(Check::Corrected(FlagValue::Uintx(0)));
	}
	Ok(Check::Pass)
}

pub(super) fn allocate_prefetch_distance(cx: &ConstraintCx<'_>) -> Outcome {
	let value = intx(cx);
	if !(0..=512).contains(&value) {
		return Err(Violation::new(format!(
			"AllocatePrefetchDistance ({value}) must be between 0 and 512\n"
		)));
	}
	Ok(Check::Pass)
}

pub(super) fn min_heap_free_ratio(cx: &ConstraintCx<'_>) -> Outcome {
	let value = uintx(cx);
	let max = cx.flag(MaxHeapFreeRatio);
	if value > max {
		return Err(Violation::new(format!(
			"MinHeapFreeRatio ({value}) must be less than or equal to MaxHeapFreeRatio ({max})\n"
		)));
	}
	Ok(Check::Pass)
}

pub(super) fn max_heap_free_ratio(cx: &ConstraintCx<'_>) -> Outcome {
	let value = uintx(cx);
	let min = cx.flag(MinHeapFreeRatio);
	if value < min {
		return Err(Violation::new(format!(
			"MaxHeapFreeRatio ({value}) must be greater than or equal to MinHeapFreeRatio ({min})\n"
		)));
	}
	Ok(Check::Pass)
}
