use crate::core::{FlagScalar, FlagType, FlagValue};
use crate::flags::{FlagId, TypedFlagKey};
use crate::registry::Registry;

/// Ordered validation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
	/// While startup arguments are parsed.
	AtParse,
	/// After ergonomics derived the compilation policy.
	AfterErgo,
	/// After memory subsystems are initialized.
	AfterMemoryInit,
}

impl Phase {
	pub const ALL: [Phase; 3] = [Phase::AtParse, Phase::AfterErgo, Phase::AfterMemoryInit];

	pub const fn name(self) -> &'static str {
		match self {
			Self::AtParse => "AtParse",
			Self::AfterErgo => "AfterErgo",
			Self::AfterMemoryInit => "AfterMemoryInit",
		}
	}
}

impl core::fmt::Display for Phase {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

/// Inclusive numeric range of a flag, typed like the flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
	Int(i32, i32),
	Uint(u32, u32),
	Intx(isize, isize),
	Uintx(usize, usize),
	Uint64(u64, u64),
	SizeT(u64, u64),
	Double(f64, f64),
}

impl Bounds {
	pub const fn flag_type(self) -> FlagType {
		match self {
			Self::Int(..) => FlagType::Int,
			Self::Uint(..) => FlagType::Uint,
			Self::Intx(..) => FlagType::Intx,
			Self::Uintx(..) => FlagType::Uintx,
			Self::Uint64(..) => FlagType::Uint64,
			Self::SizeT(..) => FlagType::SizeT,
			Self::Double(..) => FlagType::Double,
		}
	}

	pub fn min_value(self) -> FlagValue {
		match self {
			Self::Int(lo, _) => FlagValue::Int(lo),
			Self::Uint(lo, _) => FlagValue::Uint(lo),
			Self::Intx(lo, _) => FlagValue::Intx(lo),
			Self::Uintx(lo, _) => FlagValue::Uintx(lo),
			Self::Uint64(lo, _) => FlagValue::Uint64(lo),
			Self::SizeT(lo, _) => FlagValue::SizeT(bytesize::ByteSize(lo)),
			Self::Double(lo, _) => FlagValue::Double(lo),
		}
	}

	pub fn max_value(self) -> FlagValue {
		match self {
			Self::Int(_, hi) => FlagValue::Int(hi),
			Self::Uint(_, hi) => FlagValue::Uint(hi),
			Self::Intx(_, hi) => FlagValue::Intx(hi),
			Self::Uintx(_, hi) => FlagValue::Uintx(hi),
			Self::Uint64(_, hi) => FlagValue::Uint64(hi),
			Self::SizeT(_, hi) => FlagValue::SizeT(bytesize::ByteSize(hi)),
			Self::Double(_, hi) => FlagValue::Double(hi),
		}
	}

	/// Returns `None` when `value` is not of this range's type.
	pub fn contains(self, value: &FlagValue) -> Option<bool> {
		Some(match (self, value) {
			(Self::Int(lo, hi), FlagValue::Int(v)) => (lo..=hi).contains(v),
			(Self::Uint(lo, hi), FlagValue::Uint(v)) => (lo..=hi).contains(v),
			(Self::Intx(lo, hi), FlagValue::Intx(v)) => (lo..=hi).contains(v),
			(Self::Uintx(lo, hi), FlagValue::Uintx(v)) => (lo..=hi).contains(v),
			(Self::Uint64(lo, hi), FlagValue::Uint64(v)) => (lo..=hi).contains(v),
			(Self::SizeT(lo, hi), FlagValue::SizeT(v)) => (lo..=hi).contains(&v.as_u64()),
			(Self::Double(lo, hi), FlagValue::Double(v)) => lo <= *v && *v <= hi,
			_ => return None,
		})
	}

	/// Clamps `value` into the range. NaN doubles clamp to the minimum.
	pub fn clamp(self, value: &FlagValue) -> Option<FlagValue> {
		Some(match (self, value) {
			(Self::Int(lo, hi), FlagValue::Int(v)) => FlagValue::Int((*v).clamp(lo, hi)),
			(Self::Uint(lo, hi), FlagValue::Uint(v)) => FlagValue::Uint((*v).clamp(lo, hi)),
			(Self::Intx(lo, hi), FlagValue::Intx(v)) => FlagValue::Intx((*v).clamp(lo, hi)),
			(Self::Uintx(lo, hi), FlagValue::Uintx(v)) => FlagValue::Uintx((*v).clamp(lo, hi)),
			(Self::Uint64(lo, hi), FlagValue::Uint64(v)) => FlagValue::Uint64((*v).clamp(lo, hi)),
			(Self::SizeT(lo, hi), FlagValue::SizeT(v)) => {
				FlagValue::SizeT(bytesize::ByteSize(v.as_u64().clamp(lo, hi)))
			}
			(Self::Double(lo, hi), FlagValue::Double(v)) => {
				FlagValue::Double(if v.is_nan() { lo } else { v.clamp(lo, hi) })
			}
			_ => return None,
		})
	}

	/// `[ min ... max ]` as shown in range listings.
	pub fn describe(self) -> String {
		format!("[ {} ... {} ]", self.min_value(), self.max_value())
	}
}

/// Outcome of a passing constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
	Pass,
	/// Soft constraint: the value was unsafe and should be replaced.
	Corrected(FlagValue),
}

/// Hard constraint failure with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation(pub String);

impl Violation {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Constraint predicate over a candidate value and the rest of the registry.
pub type ConstraintFn = fn(&ConstraintCx<'_>) -> Result<Check, Violation>;

#[derive(Debug, Clone, Copy)]
pub struct Constraint {
	pub func: ConstraintFn,
	pub phase: Phase,
}

/// Range and/or constraint attached to one flag.
#[derive(Debug, Clone, Copy)]
pub struct FlagLimit {
	pub flag: FlagId,
	pub bounds: Option<Bounds>,
	pub constraint: Option<Constraint>,
}

impl FlagLimit {
	pub const fn new(flag: FlagId) -> Self {
		Self {
			flag,
			bounds: None,
			constraint: None,
		}
	}

	pub const fn range(mut self, bounds: Bounds) -> Self {
		self.bounds = Some(bounds);
		self
	}

	pub const fn constraint(mut self, func: ConstraintFn, phase: Phase) -> Self {
		self.constraint = Some(Constraint { func, phase });
		self
	}

	/// Phase at which the range check runs: the constraint's phase if any.
	pub fn phase(&self) -> Phase {
		self.constraint.map_or(Phase::AtParse, |c| c.phase)
	}
}

/// Inputs visible to a constraint function.
pub struct ConstraintCx<'a> {
	pub(crate) registry: &'a Registry,
	pub(crate) flag: FlagId,
	pub(crate) value: &'a FlagValue,
	pub(crate) verbose: bool,
}

impl<'a> ConstraintCx<'a> {
	/// Name of the flag being checked.
	pub fn name(&self) -> &'static str {
		self.registry.table().def(self.flag).name
	}

	/// Candidate value being checked.
	pub fn value<T: FlagScalar>(&self) -> Option<T> {
		T::from_value(self.value)
	}

	/// Current value of another flag.
	pub fn flag<T: FlagScalar>(&self, key: TypedFlagKey<T>) -> T {
		self.registry.value(key)
	}

	pub fn is_default<T: FlagScalar>(&self, key: TypedFlagKey<T>) -> bool {
		self.registry.is_default(key.id())
	}

	/// Messages are reported to the user only when this is true.
	pub fn verbose(&self) -> bool {
		self.verbose
	}

	pub fn registry(&self) -> &'a Registry {
		self.registry
	}
}
