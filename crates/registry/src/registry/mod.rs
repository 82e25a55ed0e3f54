//! The flag registry: one value slot per descriptor plus provenance.
//!
//! A [`Registry`] is an explicit, owned object built once per process. It
//! holds the current value and [`Provenance`] of every flag, the validation
//! cursor and the compilation mode cell. Callers that expose manageable flags
//! to several threads wrap it in their own lock.
//!
//! # Example
//!
//! ```ignore
//! use vmflags_registry::{HostSetup, Origin, Registry, keys};
//!
//! let mut registry = Registry::new(HostSetup::default());
//! registry.set_from_text("TieredStopAtLevel", "1", Origin::CommandLine)?;
//! assert_eq!(registry.value(keys::TieredStopAtLevel), 1);
//! ```

mod access;
mod validate;

use crate::builtins::{
	BackgroundCompilation, UnlockDiagnosticVMOptions, UnlockExperimentalVMOptions,
	UseCompiler, UseInterpreter, UseLoopCounter, UseOnStackReplacement,
};
use crate::compiler::{CompilerConfig, CompilerMode, ExecMode, HostSetup, ModeCell};
use crate::core::{FlagError, FlagScalar, FlagValue, Origin, Provenance};
use crate::flags::{FlagDef, FlagId, FlagTable, Phase, TypedFlagKey};

/// Minimum similarity for a "did you mean" suggestion.
pub const FUZZY_THRESHOLD: f64 = 0.7;

/// Mutable flag state over an immutable [`FlagTable`].
#[derive(Debug)]
pub struct Registry {
	table: &'static FlagTable,
	host: HostSetup,
	values: Vec<FlagValue>,
	provenance: Vec<Provenance>,
	exec_mode: ExecMode,
	mode: ModeCell,
	last_validated: Option<Phase>,
	sealed: bool,
}

impl Registry {
	/// Builds a registry over the built-in table.
	pub fn new(host: HostSetup) -> Self {
		Self::with_table(crate::builtins::table(), host)
	}

	/// Builds a registry over `table`, seeding every slot with its host default.
	pub(crate) fn with_table(table: &'static FlagTable, host: HostSetup) -> Self {
		let values: Vec<FlagValue> = table.ids().map(|id| table.default_value(id, &host)).collect();
		let provenance = vec![Provenance::default(); values.len()];
		let mut registry = Self {
			table,
			host,
			values,
			provenance,
			exec_mode: ExecMode::Mixed,
			mode: ModeCell::default(),
			last_validated: None,
			sealed: false,
		};
		if host.exec_mode != ExecMode::Mixed {
			registry.set_exec_mode(host.exec_mode);
		}
		registry
	}

	fn owns_builtins(&self) -> bool {
		core::ptr::eq(self.table, crate::builtins::table())
	}

	pub fn table(&self) -> &'static FlagTable {
		self.table
	}

	pub fn host(&self) -> &HostSetup {
		&self.host
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Exact lookup by name. Locked flags are found too.
	pub fn find(&self, name: &str) -> Option<FlagId> {
		self.table.find(name)
	}

	pub fn def(&self, id: FlagId) -> Option<&'static FlagDef> {
		self.table.get(id)
	}

	/// Best fuzzy match for `name`, or `None` below [`FUZZY_THRESHOLD`].
	///
	/// Locked flags are only suggested when `allow_locked` is set.
	pub fn fuzzy_find(&self, name: &str, allow_locked: bool) -> Option<FlagId> {
		let (id, score) = self.table.closest(name)?;
		if score < FUZZY_THRESHOLD {
			return None;
		}
		if !allow_locked && !self.is_unlocked(id) {
			return None;
		}
		Some(id)
	}

	/// Raw current value of `id`.
	pub fn raw(&self, id: FlagId) -> Option<&FlagValue> {
		self.values.get(id.index())
	}

	/// Typed current value of a built-in flag.
	///
	/// # Panics
	///
	/// Panics if the key was declared for a different table than this
	/// registry's; typed keys are validated against the built-in table.
	pub fn value<T: FlagScalar>(&self, key: TypedFlagKey<T>) -> T {
		match self.get(key.id()) {
			Ok(value) => value,
			Err(err) => unreachable!("typed key {key:?} validated against the built-in table: {err}"),
		}
	}

	pub fn origin(&self, id: FlagId) -> Option<Origin> {
		self.provenance.get(id.index()).map(|p| p.origin)
	}

	pub fn provenance(&self, id: FlagId) -> Option<Provenance> {
		self.provenance.get(id.index()).copied()
	}

	/// True while the value still carries the `Default` origin.
	pub fn is_default(&self, id: FlagId) -> bool {
		self.origin(id) == Some(Origin::Default)
	}

	/// Sticky: stays true after later ergonomic or internal changes.
	pub fn was_set_on_command_line(&self, id: FlagId) -> bool {
		self.provenance
			.get(id.index())
			.is_some_and(|p| p.set_on_command_line)
	}

	/// Replaces the value without touching its provenance or running checks.
	pub fn set_default(&mut self, id: FlagId, value: FlagValue) -> Result<FlagValue, FlagError> {
		let def = self.checked_def(id)?;
		if !value.matches_type(def.flag_type()) {
			return Err(FlagError::wrong_type(def.name, def.flag_type().name(), value.type_name()));
		}
		let old = core::mem::replace(&mut self.values[id.index()], value);
		tracing::debug!(
			domain = "flags",
			flag = def.name,
			old = %old,
			new = %self.values[id.index()],
			"default updated",
		);
		Ok(old)
	}

	/// Marks the end of startup. Startup-only origins are rejected afterwards.
	pub fn seal(&mut self) {
		self.sealed = true;
	}

	pub fn is_sealed(&self) -> bool {
		self.sealed
	}

	/// True for the unlock flags themselves.
	pub fn is_unlocker(&self, id: FlagId) -> bool {
		self.owns_builtins()
			&& (id == UnlockDiagnosticVMOptions.id() || id == UnlockExperimentalVMOptions.id())
	}

	pub fn exec_mode(&self) -> ExecMode {
		self.exec_mode
	}

	/// Switches the execution mode and the switches it implies.
	///
	/// Implied values keep their provenance, so they still count as defaults.
	pub fn set_exec_mode(&mut self, mode: ExecMode) {
		self.exec_mode = mode;
		if !self.owns_builtins() {
			return;
		}
		let (interpreter, compiler, loop_counter) = match mode {
			ExecMode::Interpreted => (true, false, false),
			ExecMode::Mixed => (true, true, true),
			ExecMode::Compiled => (false, true, true),
		};
		let osr = match mode {
			ExecMode::Interpreted => FlagValue::Bool(false),
			_ => self.table.default_value(UseOnStackReplacement.id(), &self.host),
		};
		let background = match mode {
			ExecMode::Compiled => FlagValue::Bool(false),
			_ => self.table.default_value(BackgroundCompilation.id(), &self.host),
		};
		let updates = [
			(UseInterpreter.id(), FlagValue::Bool(interpreter)),
			(UseCompiler.id(), FlagValue::Bool(compiler)),
			(UseLoopCounter.id(), FlagValue::Bool(loop_counter)),
			(UseOnStackReplacement.id(), osr),
			(BackgroundCompilation.id(), background),
		];
		for (id, value) in updates {
			self.values[id.index()] = value;
		}
		tracing::debug!(domain = "flags", mode = mode.name(), "execution mode set");
	}

	pub fn compiler_mode(&self) -> CompilerMode {
		self.mode.get()
	}

	/// Assigns the compilation mode; see [`ModeCell`] for the assignment rules.
	pub fn set_compiler_mode(&mut self, mode: CompilerMode) -> Result<CompilerMode, FlagError> {
		let old = self.mode.set(mode)?;
		tracing::debug!(domain = "flags", old = %old, new = %mode, "compilation mode assigned");
		Ok(old)
	}

	pub fn freeze_compiler_mode(&mut self) {
		self.mode.freeze();
	}

	pub fn mode_cell(&self) -> &ModeCell {
		&self.mode
	}

	/// Predicates over backends, execution mode and compilation mode.
	pub fn compiler(&self) -> CompilerConfig<'_> {
		CompilerConfig::new(self)
	}

	pub fn last_validated(&self) -> Option<Phase> {
		self.last_validated
	}

	fn checked_def(&self, id: FlagId) -> Result<&'static FlagDef, FlagError> {
		self.table.get(id).ok_or_else(|| FlagError::InvalidFlag {
			name: format!("#{}", id.index()),
			suggestion: None,
		})
	}
}

#[cfg(test)]
mod tests;
