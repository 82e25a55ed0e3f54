//! Phase-ordered range and constraint validation.

use super::Registry;
use crate::core::{FlagError, FlagValue, ValidationError};
use crate::flags::{Bounds, Check, ConstraintCx, FlagDef, FlagId, Phase};

impl Registry {
	/// Messages are only shown to the user until a phase after parsing starts.
	pub fn verbose_checks_needed(&self) -> bool {
		self.last_validated.is_none_or(|phase| phase <= Phase::AtParse)
	}

	pub(super) fn range_message(def: &FlagDef, value: &FlagValue, bounds: Bounds) -> String {
		format!(
			"{} {}={} is outside the allowed range {}\n",
			def.flag_type().name(),
			def.name,
			value,
			bounds.describe()
		)
	}

	/// Checks the stored value of `id` against its range, if any.
	pub fn check_range(&self, id: FlagId, verbose: bool) -> Result<(), FlagError> {
		let def = self.checked_def(id)?;
		let Some(bounds) = self.table.limit(id).and_then(|limit| limit.bounds) else {
			return Ok(());
		};
		let value = &self.values[id.index()];
		if bounds.contains(value) != Some(false) {
			return Ok(());
		}
		let message = Self::range_message(def, value, bounds);
		if verbose {
			tracing::error!(domain = "flags", flag = def.name, "{}", message.trim_end());
		}
		Err(FlagError::OutOfBounds {
			name: def.name.to_string(),
			message,
		})
	}

	/// Runs the constraint of `id`, if any, against its stored value.
	///
	/// Soft corrections are written in place without touching provenance.
	pub fn check_constraint(&mut self, id: FlagId, verbose: bool) -> Result<(), FlagError> {
		let def = self.checked_def(id)?;
		let Some(constraint) = self.table.limit(id).and_then(|limit| limit.constraint) else {
			return Ok(());
		};
		let value = self.values[id.index()].clone();
		let outcome = (constraint.func)(&ConstraintCx {
			registry: self,
			flag: id,
			value: &value,
			verbose,
		});
		match outcome {
			Ok(Check::Pass) => Ok(()),
			Ok(Check::Corrected(fixed)) => {
				tracing::warn!(
					domain = "flags",
					flag = def.name,
					old = %value,
					new = %fixed,
					"value corrected by constraint",
				);
				self.values[id.index()] = fixed;
				Ok(())
			}
			Err(violation) => {
				if verbose {
					tracing::error!(domain = "flags", flag = def.name, "{}", violation.0.trim_end());
				}
				Err(FlagError::ViolatesConstraint {
					name: def.name.to_string(),
					message: violation.0,
				})
			}
		}
	}

	/// Validates every limit registered for `phase`.
	///
	/// Phases must be requested in strictly increasing order. All failures
	/// are collected. After parsing, failing values are corrected instead:
	/// ranges clamp and constraints fall back to the default.
	pub fn validate_phase(&mut self, phase: Phase) -> Result<(), ValidationError> {
		if let Some(last) = self.last_validated
			&& phase <= last
		{
			return Err(ValidationError::OutOfOrder {
				requested: phase,
				last,
			});
		}
		self.last_validated = Some(phase);
		let verbose = self.verbose_checks_needed();
		tracing::debug!(domain = "flags", phase = ?phase, verbose, "validating");

		let mut failures = Vec::new();
		for limit in self.table.limits() {
			if limit.phase() != phase {
				continue;
			}
			let id = limit.flag;
			if limit.bounds.is_some()
				&& let Err(err) = self.check_range(id, verbose)
				&& (verbose || !self.clamp_into_range(id))
			{
				failures.push(err);
			}
			if limit.constraint.is_some()
				&& let Err(err) = self.check_constraint(id, verbose)
			{
				if verbose || !self.reset_and_recheck(id) {
					failures.push(err);
				}
			}
		}

		if failures.is_empty() {
			Ok(())
		} else {
			Err(ValidationError::Failed(failures))
		}
	}

	/// Checks every range regardless of phase.
	pub fn check_all_ranges(&self, verbose: bool) -> Result<(), ValidationError> {
		let failures: Vec<FlagError> = self
			.table
			.limits()
			.iter()
			.filter(|limit| limit.bounds.is_some())
			.filter_map(|limit| self.check_range(limit.flag, verbose).err())
			.collect();
		if failures.is_empty() {
			Ok(())
		} else {
			Err(ValidationError::Failed(failures))
		}
	}

	fn clamp_into_range(&mut self, id: FlagId) -> bool {
		let def = self.table.def(id);
		let Some(bounds) = self.table.limit(id).and_then(|limit| limit.bounds) else {
			return false;
		};
		let Some(clamped) = bounds.clamp(&self.values[id.index()]) else {
			return false;
		};
		tracing::warn!(
			domain = "flags",
			flag = def.name,
			old = %self.values[id.index()],
			new = %clamped,
			"value clamped into range",
		);
		self.values[id.index()] = clamped;
		true
	}

	fn reset_and_recheck(&mut self, id: FlagId) -> bool {
		let def = self.table.def(id);
		let default = self.table.default_value(id, &self.host);
		tracing::warn!(
			domain = "flags",
			flag = def.name,
			old = %self.values[id.index()],
			new = %default,
			"constraint failed; value reset to default",
		);
		self.values[id.index()] = default;
		self.check_constraint(id, false).is_ok()
	}
}
