//! Descriptor table, limit table and lookup index.

mod limit;
mod lookup;
#[macro_use]
mod macros;
mod typed_keys;

use rustc_hash::FxHashSet;
use thiserror::Error;

pub use limit::{Bounds, Check, Constraint, ConstraintCx, ConstraintFn, FlagLimit, Phase, Violation};
pub use lookup::{LookupIndex, NUM_BUCKETS, hash_fragment, similarity};
pub use typed_keys::TypedFlagKey;

use crate::compiler::HostSetup;
use crate::core::{FlagDefault, FlagKind, FlagType, FlagValue};

/// Dense index of a descriptor in its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagId(u16);

impl FlagId {
	pub const fn new(index: u16) -> Self {
		Self(index)
	}

	pub const fn index(self) -> usize {
		self.0 as usize
	}
}

/// Immutable metadata of one flag.
#[derive(Debug, Clone, Copy)]
pub struct FlagDef {
	pub name: &'static str,
	pub default: FlagDefault,
	pub kind: FlagKind,
	pub doc: &'static str,
}

impl FlagDef {
	pub const fn new(
		name: &'static str,
		default: FlagDefault,
		kind: FlagKind,
		doc: &'static str,
	) -> Self {
		Self {
			name,
			default,
			kind,
			doc,
		}
	}

	pub const fn flag_type(&self) -> FlagType {
		self.default.flag_type()
	}

	pub const fn is_bool(&self) -> bool {
		self.flag_type().is_bool()
	}
}

/// Host-dependent default for a flag.
#[derive(Debug, Clone, Copy)]
pub struct HostDefault {
	pub flag: FlagId,
	pub value: fn(&HostSetup) -> FlagValue,
}

/// Specification defects found while building a [`FlagTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableDefect {
	#[error("duplicate flag name '{0}'")]
	DuplicateName(&'static str),
	#[error("flag '{name}' has conflicting kind bits: {reason}")]
	ConflictingKind { name: &'static str, reason: &'static str },
	#[error("flag '{0}' is platform dependent but has no host default")]
	MissingHostDefault(&'static str),
	#[error("limit refers to unknown flag #{0}")]
	UnknownFlag(usize),
	#[error("flag '{0}' has more than one limit")]
	DuplicateLimit(&'static str),
	#[error("limit for '{0}' has neither a range nor a constraint")]
	EmptyLimit(&'static str),
	#[error("range for '{name}' is {range}, flag is {flag}")]
	RangeType {
		name: &'static str,
		range: FlagType,
		flag: FlagType,
	},
	#[error("range for '{0}' does not contain its default")]
	DefaultOutOfRange(&'static str),
	#[error("too many flags for a 16-bit id")]
	TooManyFlags,
}

/// The descriptor table with its parallel limit table and lookup index.
///
/// Built once and never mutated afterwards.
#[derive(Debug)]
pub struct FlagTable {
	defs: &'static [FlagDef],
	limits: Vec<FlagLimit>,
	limit_of: Vec<Option<usize>>,
	host_defaults: Vec<Option<fn(&HostSetup) -> FlagValue>>,
	index: LookupIndex,
}

impl FlagTable {
	/// Builds the table.
	///
	/// # Panics
	///
	/// Panics on any [`TableDefect`]; the input is a compiled-in specification.
	pub fn new(defs: &'static [FlagDef], limits: &[FlagLimit], host_defaults: &[HostDefault]) -> Self {
		match Self::try_new(defs, limits, host_defaults) {
			Ok(table) => table,
			Err(defect) => panic!("malformed flag table: {defect}"),
		}
	}

	pub fn try_new(
		defs: &'static [FlagDef],
		limits: &[FlagLimit],
		host_defaults: &[HostDefault],
	) -> Result<Self, TableDefect> {
		if defs.len() > usize::from(u16::MAX) {
			return Err(TableDefect::TooManyFlags);
		}

		let mut seen = FxHashSet::default();
		for def in defs {
			if !seen.insert(def.name) {
				return Err(TableDefect::DuplicateName(def.name));
			}
			def.kind
				.validate()
				.map_err(|reason| TableDefect::ConflictingKind {
					name: def.name,
					reason,
				})?;
		}

		let mut host = vec![None; defs.len()];
		for hd in host_defaults {
			let slot = host
				.get_mut(hd.flag.index())
				.ok_or(TableDefect::UnknownFlag(hd.flag.index()))?;
			*slot = Some(hd.value);
		}
		for (def, slot) in defs.iter().zip(&host) {
			if def.kind.contains(FlagKind::PLATFORM_DEPENDENT) && slot.is_none() {
				return Err(TableDefect::MissingHostDefault(def.name));
			}
		}

		let mut sorted: Vec<FlagLimit> = limits.to_vec();
		sorted.sort_by_key(|limit| limit.flag);
		let mut limit_of = vec![None; defs.len()];
		for (pos, limit) in sorted.iter().enumerate() {
			let def = defs
				.get(limit.flag.index())
				.ok_or(TableDefect::UnknownFlag(limit.flag.index()))?;
			if limit_of[limit.flag.index()].replace(pos).is_some() {
				return Err(TableDefect::DuplicateLimit(def.name));
			}
			if limit.bounds.is_none() && limit.constraint.is_none() {
				return Err(TableDefect::EmptyLimit(def.name));
			}
			if let Some(bounds) = limit.bounds {
				if bounds.flag_type() != def.flag_type() {
					return Err(TableDefect::RangeType {
						name: def.name,
						range: bounds.flag_type(),
						flag: def.flag_type(),
					});
				}
				if bounds.contains(&def.default.to_value()) != Some(true) {
					return Err(TableDefect::DefaultOutOfRange(def.name));
				}
			}
		}

		Ok(Self {
			defs,
			limits: sorted,
			limit_of,
			host_defaults: host,
			index: LookupIndex::new(defs),
		})
	}

	pub fn len(&self) -> usize {
		self.defs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.defs.is_empty()
	}

	pub fn defs(&self) -> &'static [FlagDef] {
		self.defs
	}

	/// # Panics
	///
	/// Panics if `id` does not belong to this table.
	pub fn def(&self, id: FlagId) -> &'static FlagDef {
		&self.defs[id.index()]
	}

	pub fn get(&self, id: FlagId) -> Option<&'static FlagDef> {
		self.defs.get(id.index())
	}

	pub fn ids(&self) -> impl Iterator<Item = FlagId> + '_ {
		(0..self.defs.len()).map(|i| FlagId::new(i as u16))
	}

	/// Limits in flag order.
	pub fn limits(&self) -> &[FlagLimit] {
		&self.limits
	}

	pub fn limit(&self, id: FlagId) -> Option<&FlagLimit> {
		self.limit_of
			.get(id.index())
			.copied()
			.flatten()
			.map(|pos| &self.limits[pos])
	}

	/// Default for `id` on the given host.
	pub fn default_value(&self, id: FlagId, host: &HostSetup) -> FlagValue {
		let def = self.def(id);
		match self.host_defaults[id.index()] {
			Some(pick) => {
				let value = pick(host);
				if value.matches_type(def.flag_type()) {
					return value;
				}
				tracing::warn!(
					domain = "flags",
					flag = def.name,
					expected = def.flag_type().name(),
					got = value.type_name(),
					"host default type mismatch; falling back to compiled default",
				);
				def.default.to_value()
			}
			None => def.default.to_value(),
		}
	}

	/// Exact lookup by name.
	pub fn find(&self, name: &str) -> Option<FlagId> {
		self.index.find(self.defs, name)
	}

	/// Best fuzzy match for `name` with its similarity score.
	pub fn closest(&self, name: &str) -> Option<(FlagId, f64)> {
		lookup::closest(self.defs, name)
	}
}
