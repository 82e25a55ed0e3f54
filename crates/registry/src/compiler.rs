//! Host setup, execution mode and the compiler configuration view.
//!
//! [`CompilerConfig`] answers questions such as "is only the light backend in
//! use" from the host backends, the execution mode, the resolved
//! [`CompilerMode`] and a few flags. Constraints and ergonomics share it.

use crate::builtins::{EnableJVMCI, TieredCompilation, TieredStopAtLevel, UseJVMCICompiler};
use crate::core::{Backends, FlagError};
use crate::registry::Registry;

/// Build flavor of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildFlavor {
	/// Develop and not-product flags are constant.
	#[default]
	Product,
	/// Every flag is settable.
	Debug,
}

/// Execution mode selected by `-Xint`, `-Xmixed` or `-Xcomp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecMode {
	/// Interpreter only.
	Interpreted,
	/// Interpreter and compilers.
	#[default]
	Mixed,
	/// Compile everything before first execution.
	Compiled,
}

impl ExecMode {
	pub const fn name(self) -> &'static str {
		match self {
			Self::Interpreted => "interpreted mode",
			Self::Mixed => "mixed mode",
			Self::Compiled => "compiled mode",
		}
	}
}

/// Static facts about the host a registry is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSetup {
	/// Backends compiled into the host.
	pub backends: Backends,
	pub flavor: BuildFlavor,
	/// Execution mode before arguments are processed.
	pub exec_mode: ExecMode,
	/// Active processor count, used for compiler thread sizing.
	pub processors: usize,
	/// Whether the host is 64-bit.
	pub lp64: bool,
}

impl Default for HostSetup {
	fn default() -> Self {
		Self {
			backends: Backends::LIGHT | Backends::HEAVY,
			flavor: BuildFlavor::Product,
			exec_mode: ExecMode::Mixed,
			processors: 1,
			lp64: cfg!(target_pointer_width = "64"),
		}
	}
}

impl HostSetup {
	pub fn with_backends(mut self, backends: Backends) -> Self {
		self.backends = backends;
		self
	}

	pub fn with_flavor(mut self, flavor: BuildFlavor) -> Self {
		self.flavor = flavor;
		self
	}

	pub fn with_processors(mut self, processors: usize) -> Self {
		self.processors = processors.max(1);
		self
	}

	pub fn has_light(&self) -> bool {
		self.backends.contains(Backends::LIGHT)
	}

	pub fn has_heavy(&self) -> bool {
		self.backends.contains(Backends::HEAVY)
	}

	pub fn has_heavy_alt(&self) -> bool {
		self.backends.contains(Backends::HEAVY_ALT)
	}

	/// Whether both tiers exist, so tiered compilation is possible at all.
	pub fn has_tiered(&self) -> bool {
		self.has_light() && self.backends.intersects(Backends::HEAVY | Backends::HEAVY_ALT)
	}
}

/// Resolved compilation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompilerMode {
	/// Regular tiered compilation, or whatever the host can do.
	#[default]
	Normal,
	/// Light backend only.
	QuickOnly,
	/// Heavy backends only.
	HighOnly,
	/// Heavy-alternate compiler only, itself compiled by the light backend.
	HighOnlyQuickInternal,
}

impl CompilerMode {
	/// Name accepted by the `CompilationMode` flag.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Normal => "default",
			Self::QuickOnly => "quick-only",
			Self::HighOnly => "high-only",
			Self::HighOnlyQuickInternal => "high-only-quick-internal",
		}
	}

	/// Parses a `CompilationMode` value. `normal` is accepted as an alias of
	/// `default`.
	pub fn parse(text: &str) -> Option<Self> {
		match text {
			"default" | "normal" => Some(Self::Normal),
			"quick-only" => Some(Self::QuickOnly),
			"high-only" => Some(Self::HighOnly),
			"high-only-quick-internal" => Some(Self::HighOnlyQuickInternal),
			_ => None,
		}
	}

	/// Explicit mode names the given backends could ever honor.
	pub fn available(backends: Backends) -> Vec<&'static str> {
		let mut names = Vec::new();
		if backends.contains(Backends::LIGHT) {
			names.push(Self::QuickOnly.name());
		}
		if backends.intersects(Backends::HEAVY | Backends::HEAVY_ALT) {
			names.push(Self::HighOnly.name());
		}
		if backends.contains(Backends::LIGHT | Backends::HEAVY_ALT) {
			names.push(Self::HighOnlyQuickInternal.name());
		}
		names
	}

	/// True for the modes that skip the intermediate tiers.
	pub const fn disables_intermediate(self) -> bool {
		matches!(self, Self::HighOnly | Self::HighOnlyQuickInternal)
	}
}

impl core::fmt::Display for CompilerMode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

/// Compilation mode slot: assignable twice, then frozen.
///
/// The first assignment records explicit intent, the second the refinement
/// made by ergonomics. Anything after that, or after [`ModeCell::freeze`],
/// fails with [`FlagError::SetOnlyOnce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeCell {
	mode: CompilerMode,
	assignments: u8,
	frozen: bool,
}

impl ModeCell {
	pub const MAX_ASSIGNMENTS: u8 = 2;

	pub fn get(&self) -> CompilerMode {
		self.mode
	}

	pub fn set(&mut self, mode: CompilerMode) -> Result<CompilerMode, FlagError> {
		if self.frozen || self.assignments >= Self::MAX_ASSIGNMENTS {
			return Err(FlagError::SetOnlyOnce {
				what: "CompilationMode".to_string(),
			});
		}
		self.assignments += 1;
		Ok(core::mem::replace(&mut self.mode, mode))
	}

	pub fn freeze(&mut self) {
		self.frozen = true;
	}

	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	pub fn assignments(&self) -> u8 {
		self.assignments
	}
}

/// Read-only view answering compiler configuration questions.
#[derive(Clone, Copy)]
pub struct CompilerConfig<'a> {
	registry: &'a Registry,
}

impl<'a> CompilerConfig<'a> {
	pub(crate) fn new(registry: &'a Registry) -> Self {
		Self { registry }
	}

	fn host(&self) -> &HostSetup {
		self.registry.host()
	}

	fn mode(&self) -> CompilerMode {
		self.registry.compiler_mode()
	}

	fn stop_level(&self) -> isize {
		self.registry.value(TieredStopAtLevel)
	}

	fn tiered_flag(&self) -> bool {
		self.registry.value(TieredCompilation)
	}

	pub fn exec_mode(&self) -> ExecMode {
		self.registry.exec_mode()
	}

	pub fn is_interpreter_only(&self) -> bool {
		self.exec_mode() == ExecMode::Interpreted || self.stop_level() == 0
	}

	pub fn is_compile_only(&self) -> bool {
		self.exec_mode() == ExecMode::Compiled
	}

	/// The heavy-alternate compiler replaces the heavy backend.
	pub fn is_heavy_alt_compiler(&self) -> bool {
		self.host().has_heavy_alt()
			&& self.registry.value(EnableJVMCI)
			&& self.registry.value(UseJVMCICompiler)
	}

	/// Any of the mode-selecting flags was changed from its default.
	pub fn is_mode_selected(&self) -> bool {
		!self.registry.is_default(TieredCompilation.id())
			|| !self.registry.is_default(TieredStopAtLevel.id())
			|| !self.registry.is_default(crate::builtins::CompilationMode.id())
			|| !self.registry.is_default(EnableJVMCI.id())
			|| !self.registry.is_default(UseJVMCICompiler.id())
	}

	pub fn is_light_only(&self) -> bool {
		let host = self.host();
		if self.is_interpreter_only() || !host.has_light() {
			return false;
		}
		let stop = self.stop_level();
		(!host.has_heavy() && !self.is_heavy_alt_compiler())
			|| (1..4).contains(&stop)
			|| self.mode() == CompilerMode::QuickOnly
	}

	/// Light backend without profiling tiers.
	pub fn is_light_simple_only(&self) -> bool {
		self.is_light_only()
			&& (self.stop_level() == 1 || self.mode() == CompilerMode::QuickOnly || !self.tiered_flag())
	}

	pub fn is_heavy_enabled(&self) -> bool {
		self.host().has_heavy()
			&& !self.is_interpreter_only()
			&& !self.is_light_only()
			&& !self.is_heavy_alt_compiler()
	}

	pub fn is_heavy_alt_compiler_enabled(&self) -> bool {
		self.is_heavy_alt_compiler() && !self.is_interpreter_only() && !self.is_light_only()
	}

	pub fn is_heavy_only(&self) -> bool {
		self.is_heavy_enabled()
			&& (!self.host().has_light() || !self.tiered_flag() || self.mode().disables_intermediate())
	}

	/// Does not consult `TieredCompilation`: with the light backend present the
	/// alternate compiler keeps it for its own compilation.
	pub fn is_heavy_alt_compiler_only(&self) -> bool {
		self.is_heavy_alt_compiler_enabled()
			&& (!self.host().has_light() || self.mode().disables_intermediate())
	}

	pub fn is_heavy_or_alt_only(&self) -> bool {
		self.is_heavy_only() || self.is_heavy_alt_compiler_only()
	}

	pub fn is_tiered(&self) -> bool {
		self.host().has_tiered()
			&& !self.is_interpreter_only()
			&& !self.is_light_only()
			&& !self.is_heavy_or_alt_only()
	}

	pub fn is_light_enabled(&self) -> bool {
		self.host().has_light() && !self.is_interpreter_only() && !self.is_heavy_or_alt_only()
	}
}

impl core::fmt::Debug for CompilerConfig<'_> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("CompilerConfig")
			.field("exec_mode", &self.exec_mode())
			.field("mode", &self.mode())
			.field("light_only", &self.is_light_only())
			.field("heavy_or_alt_only", &self.is_heavy_or_alt_only())
			.field("tiered", &self.is_tiered())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("default", Some(CompilerMode::Normal))]
	#[case("normal", Some(CompilerMode::Normal))]
	#[case("quick-only", Some(CompilerMode::QuickOnly))]
	#[case("high-only", Some(CompilerMode::HighOnly))]
	#[case("high-only-quick-internal", Some(CompilerMode::HighOnlyQuickInternal))]
	#[case("Quick-Only", None)]
	#[case("", None)]
	fn parses_mode_names(#[case] text: &str, #[case] expected: Option<CompilerMode>) {
		assert_eq!(CompilerMode::parse(text), expected);
	}

	#[test]
	fn available_modes_follow_backends() {
		assert_eq!(CompilerMode::available(Backends::LIGHT), vec!["quick-only"]);
		assert_eq!(CompilerMode::available(Backends::HEAVY), vec!["high-only"]);
		assert_eq!(
			CompilerMode::available(Backends::all()),
			vec!["quick-only", "high-only", "high-only-quick-internal"]
		);
	}

	#[test]
	fn mode_cell_freezes_after_two_assignments() {
		let mut cell = ModeCell::default();
		assert_eq!(cell.set(CompilerMode::HighOnly), Ok(CompilerMode::Normal));
		assert_eq!(cell.set(CompilerMode::QuickOnly), Ok(CompilerMode::HighOnly));
		assert!(matches!(cell.set(CompilerMode::Normal), Err(FlagError::SetOnlyOnce { .. })));
		assert_eq!(cell.get(), CompilerMode::QuickOnly);
	}

	#[test]
	fn frozen_cell_rejects_first_assignment() {
		let mut cell = ModeCell::default();
		cell.freeze();
		assert!(cell.is_frozen());
		assert!(cell.set(CompilerMode::QuickOnly).is_err());
		assert_eq!(cell.get(), CompilerMode::Normal);
	}
}
