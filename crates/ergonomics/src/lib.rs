//! Compilation ergonomics.
//!
//! Derives a consistent compilation policy from the host backends, the
//! execution mode and whatever the user set. [`Ergonomics::run`] makes one
//! deterministic pass over a [`Registry`]:
//!
//! 1. resolve the explicit `CompilationMode` and refine it
//! 2. apply client emulation on light-only setups
//! 3. translate legacy single-tier thresholds into per-tier ones
//! 4. apply the tiered policy and `CompileThresholdScaling`
//! 5. re-check cross-flag consistency, then freeze the mode
//!
//! Every change is recorded in the returned [`ErgoReport`].

mod consistency;
mod legacy;
mod memory;
mod mode;
mod policy;
pub mod scaling;

pub use memory::{DEFAULT_PREFETCH_DISTANCE, memory_init};
pub use scaling::{COUNTER_BITS, scaled_freq_log, scaled_threshold};
use thiserror::Error;
use vmflags_registry::keys::{CompileThreshold, CompileThresholdScaling, TieredCompilation};
use vmflags_registry::{
	Bounds, CompilerMode, ExecMode, FlagError, FlagId, FlagScalar, FlagValue, Registry, TypedFlagKey,
};

/// Fatal ergonomics failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErgoError {
	#[error("Negative value specified for CompileThresholdScaling")]
	NegativeScaling { value: f64 },
	#[error(transparent)]
	Mode(#[from] FlagError),
}

/// One value changed by ergonomics.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
	pub flag: &'static str,
	pub old: FlagValue,
	pub new: FlagValue,
}

/// Outcome of an ergonomics pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErgoReport {
	/// Resolved and frozen compilation mode.
	pub mode: CompilerMode,
	/// Warnings in the order they were raised.
	pub warnings: Vec<String>,
	/// Flag changes in the order they were made.
	pub adjustments: Vec<Adjustment>,
}

impl ErgoReport {
	/// Last adjustment made to `flag`, if any.
	pub fn adjustment(&self, flag: &str) -> Option<&Adjustment> {
		self.adjustments.iter().rev().find(|a| a.flag == flag)
	}
}

/// Single-use ergonomics pass over a registry.
pub struct Ergonomics<'r> {
	registry: &'r mut Registry,
	report: ErgoReport,
}

impl<'r> Ergonomics<'r> {
	pub fn new(registry: &'r mut Registry) -> Self {
		Self {
			registry,
			report: ErgoReport::default(),
		}
	}

	/// Runs every step and freezes the compilation mode.
	///
	/// Only a negative `CompileThresholdScaling` or a mode assignment past
	/// the cell's limit is fatal; rejected flag updates are logged and
	/// skipped.
	pub fn run(mut self) -> Result<ErgoReport, ErgoError> {
		self.finalize_exec_mode();
		self.select_mode()?;
		self.client_emulation()?;
		self.legacy_emulation();
		self.compilation_policy()?;
		self.check_consistency();
		self.registry.freeze_compiler_mode();
		self.report.mode = self.registry.compiler_mode();
		tracing::debug!(
			domain = "ergo",
			mode = %self.report.mode,
			adjustments = self.report.adjustments.len(),
			warnings = self.report.warnings.len(),
			"ergonomics done",
		);
		Ok(self.report)
	}

	/// Zero scaling, or a zero threshold without tiering, means interpreter only.
	fn finalize_exec_mode(&mut self) {
		let scale = self.value(CompileThresholdScaling);
		let tiered = self.value(TieredCompilation);
		let threshold = self.value(CompileThreshold);
		if (scale == 0.0 || (!tiered && threshold == 0)) && self.registry.exec_mode() != ExecMode::Interpreted {
			tracing::debug!(domain = "ergo", scale, threshold, "compilation disabled");
			self.registry.set_exec_mode(ExecMode::Interpreted);
		}
	}

	fn value<T: FlagScalar>(&self, key: TypedFlagKey<T>) -> T {
		self.registry.value(key)
	}

	fn is_default<T: FlagScalar>(&self, key: TypedFlagKey<T>) -> bool {
		self.registry.is_default(key.id())
	}

	fn name(&self, id: FlagId) -> &'static str {
		self.registry.table().def(id).name
	}

	fn warn(&mut self, message: String) {
		tracing::warn!(domain = "ergo", "{message}");
		self.report.warnings.push(message);
	}

	/// Ergonomic write. Flags that are constant on this host are skipped.
	fn set<T: FlagScalar>(&mut self, key: TypedFlagKey<T>, value: T) {
		let id = key.id();
		if self.registry.is_constant_in_binary(id) {
			return;
		}
		match self.registry.set_ergo(key, value) {
			Ok(old) => self.record(id, old.into_value()),
			Err(err) => tracing::warn!(domain = "ergo", flag = self.name(id), error = %err, "update rejected"),
		}
	}

	/// Like [`Self::set`] but clamps into the flag's range first.
	fn set_clamped(&mut self, key: TypedFlagKey<isize>, value: isize) {
		let clamped = match self.registry.table().limit(key.id()).and_then(|limit| limit.bounds) {
			Some(Bounds::Intx(min, max)) => value.clamp(min, max),
			_ => value,
		};
		self.set(key, clamped);
	}

	/// Replaces the value while keeping its origin, so it still reads as default.
	fn set_default<T: FlagScalar>(&mut self, key: TypedFlagKey<T>, value: T) {
		let id = key.id();
		if self.registry.is_constant_in_binary(id) {
			return;
		}
		match self.registry.set_default(id, value.into_value()) {
			Ok(old) => self.record(id, old),
			Err(err) => tracing::warn!(domain = "ergo", flag = self.name(id), error = %err, "update rejected"),
		}
	}

	fn record(&mut self, id: FlagId, old: FlagValue) {
		let Some(new) = self.registry.raw(id).cloned() else {
			return;
		};
		if new == old {
			return;
		}
		let flag = self.name(id);
		tracing::debug!(domain = "ergo", flag, old = %old, new = %new, "adjusted");
		self.report.adjustments.push(Adjustment { flag, old, new });
	}
}

#[cfg(test)]
mod tests;
