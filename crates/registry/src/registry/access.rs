//! Typed and textual flag access with kind gating.

use super::Registry;
use crate::builtins::{UnlockDiagnosticVMOptions, UnlockExperimentalVMOptions};
use crate::compiler::BuildFlavor;
use crate::core::{FlagError, FlagKind, FlagScalar, FlagType, FlagValue, LockedMessage, Origin};
use crate::flags::{Check, ConstraintCx, FlagId};
use crate::parse;

impl Registry {
	/// Reads a flag as `T`.
	///
	/// Fails with `InvalidFlag` for an id outside the table and with
	/// `WrongFormat` when `T` is not the declared type.
	pub fn get<T: FlagScalar>(&self, id: FlagId) -> Result<T, FlagError> {
		let def = self.checked_def(id)?;
		if !T::accepts(def.flag_type()) {
			return Err(FlagError::wrong_type(
				def.name,
				def.flag_type().name(),
				core::any::type_name::<T>(),
			));
		}
		T::from_value(&self.values[id.index()]).ok_or_else(|| {
			FlagError::wrong_type(def.name, def.flag_type().name(), core::any::type_name::<T>())
		})
	}

	/// Writes a flag and returns the previous value.
	pub fn set<T: FlagScalar>(&mut self, id: FlagId, value: T, origin: Origin) -> Result<T, FlagError> {
		let def = self.checked_def(id)?;
		if !T::accepts(def.flag_type()) {
			return Err(FlagError::wrong_type(
				def.name,
				def.flag_type().name(),
				core::any::type_name::<T>(),
			));
		}
		let old = self.store(id, value.into_value(), origin)?;
		T::from_value(&old).ok_or_else(|| {
			FlagError::wrong_type(def.name, def.flag_type().name(), core::any::type_name::<T>())
		})
	}

	/// Ergonomic write through a typed key.
	pub fn set_ergo<T: FlagScalar>(
		&mut self,
		key: crate::flags::TypedFlagKey<T>,
		value: T,
	) -> Result<T, FlagError> {
		self.set(key.id(), value, Origin::Ergonomic)
	}

	/// Stores an owned string and hands back the one it replaces.
	pub fn set_string(
		&mut self,
		id: FlagId,
		value: Option<String>,
		origin: Origin,
	) -> Result<Option<String>, FlagError> {
		self.set(id, value, origin)
	}

	/// Appends `text` as a new line of a string list flag.
	pub fn append_string(&mut self, id: FlagId, text: &str, origin: Origin) -> Result<(), FlagError> {
		let def = self.checked_def(id)?;
		if def.flag_type() != FlagType::CcstrList {
			return Err(FlagError::wrong_type(def.name, def.flag_type().name(), "ccstrlist"));
		}
		let joined = match self.values[id.index()].as_str() {
			Some(current) if !current.is_empty() => format!("{current}\n{text}"),
			_ => text.to_string(),
		};
		self.store(id, FlagValue::Str(Some(joined)), origin).map(drop)
	}

	/// Resolves `name` for a write coming from outside the runtime.
	///
	/// Unknown names carry a fuzzy suggestion; locked flags fail with their
	/// unlock instruction.
	pub fn find_for_mutation(&self, name: &str) -> Result<FlagId, FlagError> {
		if name.is_empty() {
			return Err(FlagError::MissingName);
		}
		let Some(id) = self.find(name) else {
			let suggestion = self
				.fuzzy_find(name, false)
				.map(|id| self.table.def(id).name.to_string());
			return Err(FlagError::InvalidFlag {
				name: name.to_string(),
				suggestion,
			});
		};
		if let Some(reason) = self.locked_message(id) {
			return Err(FlagError::locked(name, reason));
		}
		Ok(id)
	}

	/// Why `id` cannot be used right now, if it is locked.
	pub fn locked_message(&self, id: FlagId) -> Option<LockedMessage> {
		let kind = self.table.get(id)?.kind;
		if self.is_unlocker(id) {
			return None;
		}
		if kind.contains(FlagKind::DIAGNOSTIC) && !self.unlock_flag(UnlockDiagnosticVMOptions) {
			return Some(LockedMessage::DiagnosticLocked);
		}
		if kind.contains(FlagKind::EXPERIMENTAL) && !self.unlock_flag(UnlockExperimentalVMOptions) {
			return Some(LockedMessage::ExperimentalLocked);
		}
		if self.host.flavor == BuildFlavor::Product {
			if kind.contains(FlagKind::DEVELOP) {
				return Some(LockedMessage::DevelopInProductBuild);
			}
			if kind.contains(FlagKind::NOT_PRODUCT) {
				return Some(LockedMessage::NotProductInProductBuild);
			}
		}
		None
	}

	fn unlock_flag(&self, key: crate::flags::TypedFlagKey<bool>) -> bool {
		self.owns_builtins() && self.value(key)
	}

	pub fn is_unlocked(&self, id: FlagId) -> bool {
		self.locked_message(id).is_none()
	}

	/// Flags whose value cannot change in this host: build-only flags in a
	/// product build, 64-bit flags on 32-bit hosts and flags of backends the
	/// host lacks.
	pub fn is_constant_in_binary(&self, id: FlagId) -> bool {
		let Some(def) = self.table.get(id) else {
			return false;
		};
		let kind = def.kind;
		(kind.is_build_only() && self.host.flavor == BuildFlavor::Product)
			|| (kind.contains(FlagKind::LP64) && !self.host.lp64)
			|| (kind.has_family() && !kind.families().intersects(self.host.backends))
	}

	/// Parses `text` as the flag's type and writes it.
	///
	/// String lists append, plain strings replace and an empty string stores
	/// the null value.
	pub fn set_from_text(&mut self, name: &str, text: &str, origin: Origin) -> Result<(), FlagError> {
		let id = self.find_for_mutation(name)?;
		let def = self.table.def(id);
		match def.flag_type() {
			FlagType::CcstrList => self.append_string(id, text, origin),
			FlagType::Ccstr => {
				let value = (!text.is_empty()).then(|| text.to_string());
				self.set_string(id, value, origin).map(drop)
			}
			ty => {
				let value = parse::parse_value(ty, text).map_err(|err| FlagError::WrongFormat {
					name: def.name.to_string(),
					detail: err.to_string(),
				})?;
				self.store(id, value, origin).map(drop)
			}
		}
	}

	/// Writes an already typed value by name.
	pub fn set_from_value(
		&mut self,
		name: &str,
		value: FlagValue,
		origin: Origin,
	) -> Result<FlagValue, FlagError> {
		let id = self.find_for_mutation(name)?;
		let def = self.table.def(id);
		if !value.matches_type(def.flag_type()) {
			return Err(FlagError::wrong_type(def.name, def.flag_type().name(), value.type_name()));
		}
		self.store(id, value, origin)
	}

	/// Gated write of a type-checked value.
	///
	/// Check order: constant, writability, lock, range, then the constraint
	/// when its phase has been reached.
	fn store(&mut self, id: FlagId, mut value: FlagValue, origin: Origin) -> Result<FlagValue, FlagError> {
		let def = self.table.def(id);
		let name = def.name;
		if self.is_constant_in_binary(id) {
			return Err(FlagError::Constant {
				name: name.to_string(),
			});
		}
		if !origin.is_trusted() {
			if origin.is_external_runtime() && !def.kind.contains(FlagKind::MANAGEABLE) {
				return Err(FlagError::NonWritable {
					name: name.to_string(),
				});
			}
			if origin.is_startup() && self.sealed {
				return Err(FlagError::CommandLineOnly {
					name: name.to_string(),
				});
			}
			if let Some(reason) = self.locked_message(id) {
				return Err(FlagError::locked(name, reason));
			}
		}

		let verbose = self.verbose_checks_needed();
		let report = verbose && !origin.is_trusted();
		if let Some(limit) = self.table.limit(id) {
			if let Some(bounds) = limit.bounds
				&& bounds.contains(&value) == Some(false)
			{
				let message = Self::range_message(def, &value, bounds);
				if report {
					tracing::error!(domain = "flags", flag = name, "{}", message.trim_end());
				}
				return Err(FlagError::OutOfBounds {
					name: name.to_string(),
					message,
				});
			}
			if let Some(constraint) = limit.constraint
				&& self.last_validated.is_some_and(|reached| reached >= constraint.phase)
			{
				let cx = ConstraintCx {
					registry: self,
					flag: id,
					value: &value,
					verbose,
				};
				match (constraint.func)(&cx) {
					Ok(Check::Pass) => {}
					Ok(Check::Corrected(fixed)) => value = fixed,
					Err(violation) => {
						if report {
							tracing::error!(domain = "flags", flag = name, "{}", violation.0.trim_end());
						}
						return Err(FlagError::ViolatesConstraint {
							name: name.to_string(),
							message: violation.0,
						});
					}
				}
			}
		}

		let old = core::mem::replace(&mut self.values[id.index()], value);
		self.provenance[id.index()].record(origin);
		tracing::debug!(
			domain = "flags",
			flag = name,
			old = %old,
			new = %self.values[id.index()],
			origin = %origin,
			"flag set",
		);
		Ok(old)
	}
}
