//! Compilation mode resolution and client emulation.

use vmflags_registry::CompilerMode;
use vmflags_registry::bytesize::ByteSize;
use vmflags_registry::keys::{
	CICompilerCount, CodeCacheExpansionSize, CompilationMode, EnableJVMCI, InitialCodeCacheSize, MaxRAM,
	NeverActAsServerClassMachine, NonNMethodCodeHeapSize, NonProfiledCodeHeapSize, ProfileInterpreter,
	ProfiledCodeHeapSize, ReservedCodeCacheSize, TieredCompilation, UseJVMCICompiler,
};

use crate::{ErgoError, Ergonomics};

const K: u64 = 1024;
const M: u64 = K * K;
const G: u64 = M * K;

impl Ergonomics<'_> {
	/// Resolves the explicit mode, then refines `Normal` from the configuration.
	pub(crate) fn select_mode(&mut self) -> Result<(), ErgoError> {
		let explicit = self.explicit_mode();
		if explicit != CompilerMode::Normal {
			self.registry.set_compiler_mode(explicit)?;
			return Ok(());
		}

		let config = self.registry.compiler();
		let refined = if config.is_light_simple_only() {
			Some(CompilerMode::QuickOnly)
		} else if config.is_heavy_or_alt_only() {
			Some(CompilerMode::HighOnly)
		} else if config.is_heavy_alt_compiler_enabled()
			&& config.is_light_enabled()
			&& !self.value(TieredCompilation)
		{
			self.warn(
				"Disabling tiered compilation with the heavy-alternate compiler is not recommended, \
				 disabling intermediate compilation levels instead."
					.to_string(),
			);
			Some(CompilerMode::HighOnlyQuickInternal)
		} else {
			None
		};
		if let Some(mode) = refined {
			self.registry.set_compiler_mode(mode)?;
		}
		Ok(())
	}

	fn explicit_mode(&mut self) -> CompilerMode {
		let Some(text) = self.value(CompilationMode) else {
			return CompilerMode::Normal;
		};
		let Some(mode) = CompilerMode::parse(&text) else {
			self.warn(format!("Unsupported compilation mode '{text}', using default"));
			return CompilerMode::Normal;
		};
		let host = *self.registry.host();
		let alt_compiler = self.registry.compiler().is_heavy_alt_compiler();
		let unavailable = match mode {
			CompilerMode::Normal => None,
			CompilerMode::QuickOnly if !host.has_light() => Some("there is no light backend present"),
			CompilerMode::HighOnly if !host.has_heavy() && !alt_compiler => {
				Some("there is neither a heavy backend nor a heavy-alternate compiler present")
			}
			CompilerMode::HighOnlyQuickInternal if !host.has_light() || !alt_compiler => {
				Some("there is no light backend and heavy-alternate compiler present")
			}
			_ => None,
		};
		match unavailable {
			Some(reason) => {
				self.warn(format!("{mode} compilation mode unavailable because {reason}."));
				CompilerMode::Normal
			}
			None => mode,
		}
	}

	fn wants_client_emulation(&self) -> bool {
		let host = self.registry.host();
		if !host.has_light() {
			return false;
		}
		let config = self.registry.compiler();
		if config.is_mode_selected() {
			!host.has_heavy() && !config.is_heavy_alt_compiler()
		} else {
			self.value(NeverActAsServerClassMachine)
		}
	}

	/// Runs the light backend alone with small code caches, like a client VM.
	pub(crate) fn client_emulation(&mut self) -> Result<(), ErgoError> {
		if !self.wants_client_emulation() {
			return Ok(());
		}
		tracing::debug!(domain = "ergo", "client emulation");
		if self.registry.compiler_mode() != CompilerMode::QuickOnly {
			self.registry.set_compiler_mode(CompilerMode::QuickOnly)?;
		}
		self.set(ProfileInterpreter, false);
		self.set(EnableJVMCI, false);
		self.set(UseJVMCICompiler, false);
		if self.is_default(NeverActAsServerClassMachine) {
			self.set(NeverActAsServerClassMachine, true);
		}
		let sizes = [
			(InitialCodeCacheSize, 160 * K),
			(ReservedCodeCacheSize, 32 * M),
			(NonProfiledCodeHeapSize, 0),
			(ProfiledCodeHeapSize, 0),
			(NonNMethodCodeHeapSize, 5 * M),
			(CodeCacheExpansionSize, 32 * K),
		];
		for (key, size) in sizes {
			if self.is_default(key) {
				self.set(key, ByteSize(size));
			}
		}
		if self.is_default(MaxRAM) {
			self.set_default(MaxRAM, G);
		}
		if self.is_default(CICompilerCount) {
			self.set(CICompilerCount, 1);
		}
		Ok(())
	}
}
