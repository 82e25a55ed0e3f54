use bytesize::ByteSize;

/// Declared storage type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagType {
	/// Boolean switch.
	Bool,
	/// Signed 32-bit integer.
	Int,
	/// Unsigned 32-bit integer.
	Uint,
	/// Signed machine word.
	Intx,
	/// Unsigned machine word.
	Uintx,
	/// Unsigned 64-bit integer.
	Uint64,
	/// Byte size.
	SizeT,
	/// Double precision float.
	Double,
	/// String, replaced on every set.
	Ccstr,
	/// String list, each textual set appends a new line.
	CcstrList,
}

impl FlagType {
	/// Name used in diagnostics and flag listings.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::Int => "int",
			Self::Uint => "uint",
			Self::Intx => "intx",
			Self::Uintx => "uintx",
			Self::Uint64 => "uint64_t",
			Self::SizeT => "size_t",
			Self::Double => "double",
			Self::Ccstr => "ccstr",
			Self::CcstrList => "ccstrlist",
		}
	}

	pub const fn is_string(self) -> bool {
		matches!(self, Self::Ccstr | Self::CcstrList)
	}

	pub const fn is_bool(self) -> bool {
		matches!(self, Self::Bool)
	}

	/// Whether a leading minus sign is meaningful for this type.
	pub const fn is_signed(self) -> bool {
		matches!(self, Self::Int | Self::Intx | Self::Double)
	}
}

impl core::fmt::Display for FlagType {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

/// Current value of a flag.
///
/// Strings are owned by the slot; a `None` string is the null value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
	Bool(bool),
	Int(i32),
	Uint(u32),
	Intx(isize),
	Uintx(usize),
	Uint64(u64),
	SizeT(ByteSize),
	Double(f64),
	Str(Option<String>),
}

impl FlagValue {
	/// Returns true if this value can be stored in a flag of type `ty`.
	pub fn matches_type(&self, ty: FlagType) -> bool {
		matches!(
			(self, ty),
			(Self::Bool(_), FlagType::Bool)
				| (Self::Int(_), FlagType::Int)
				| (Self::Uint(_), FlagType::Uint)
				| (Self::Intx(_), FlagType::Intx)
				| (Self::Uintx(_), FlagType::Uintx)
				| (Self::Uint64(_), FlagType::Uint64)
				| (Self::SizeT(_), FlagType::SizeT)
				| (Self::Double(_), FlagType::Double)
				| (Self::Str(_), FlagType::Ccstr | FlagType::CcstrList)
		)
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Uint(_) => "uint",
			Self::Intx(_) => "intx",
			Self::Uintx(_) => "uintx",
			Self::Uint64(_) => "uint64_t",
			Self::SizeT(_) => "size_t",
			Self::Double(_) => "double",
			Self::Str(_) => "ccstr",
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(v) => v.as_deref(),
			_ => None,
		}
	}
}

impl core::fmt::Display for FlagValue {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Bool(v) => write!(f, "{v}"),
			Self::Int(v) => write!(f, "{v}"),
			Self::Uint(v) => write!(f, "{v}"),
			Self::Intx(v) => write!(f, "{v}"),
			Self::Uintx(v) => write!(f, "{v}"),
			Self::Uint64(v) => write!(f, "{v}"),
			Self::SizeT(v) => write!(f, "{}", v.as_u64()),
			Self::Double(v) => write!(f, "{v:.6}"),
			Self::Str(Some(v)) => f.write_str(v),
			Self::Str(None) => Ok(()),
		}
	}
}

impl From<bool> for FlagValue {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<&str> for FlagValue {
	fn from(v: &str) -> Self {
		Self::Str(Some(v.to_string()))
	}
}

/// Compiled-in default of a flag.
///
/// The variant fixes the declared [`FlagType`], so a descriptor's type can
/// never disagree with its default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlagDefault {
	Bool(bool),
	Int(i32),
	Uint(u32),
	Intx(isize),
	Uintx(usize),
	Uint64(u64),
	SizeT(u64),
	Double(f64),
	Ccstr(Option<&'static str>),
	CcstrList(Option<&'static str>),
}

impl FlagDefault {
	pub const fn flag_type(self) -> FlagType {
		match self {
			Self::Bool(_) => FlagType::Bool,
			Self::Int(_) => FlagType::Int,
			Self::Uint(_) => FlagType::Uint,
			Self::Intx(_) => FlagType::Intx,
			Self::Uintx(_) => FlagType::Uintx,
			Self::Uint64(_) => FlagType::Uint64,
			Self::SizeT(_) => FlagType::SizeT,
			Self::Double(_) => FlagType::Double,
			Self::Ccstr(_) => FlagType::Ccstr,
			Self::CcstrList(_) => FlagType::CcstrList,
		}
	}

	pub fn to_value(self) -> FlagValue {
		match self {
			Self::Bool(v) => FlagValue::Bool(v),
			Self::Int(v) => FlagValue::Int(v),
			Self::Uint(v) => FlagValue::Uint(v),
			Self::Intx(v) => FlagValue::Intx(v),
			Self::Uintx(v) => FlagValue::Uintx(v),
			Self::Uint64(v) => FlagValue::Uint64(v),
			Self::SizeT(v) => FlagValue::SizeT(ByteSize(v)),
			Self::Double(v) => FlagValue::Double(v),
			Self::Ccstr(v) | Self::CcstrList(v) => FlagValue::Str(v.map(str::to_string)),
		}
	}
}

// Seal FlagScalar so typed access stays limited to the storage types above.
mod sealed {
	pub trait Sealed {}
}

/// Rust types that can be read from or written to a flag slot.
pub trait FlagScalar: sealed::Sealed + Sized {
	/// Returns true if a flag of type `ty` stores this Rust type.
	fn accepts(ty: FlagType) -> bool;

	/// Extracts the value, returning `None` on a variant mismatch.
	fn from_value(value: &FlagValue) -> Option<Self>;

	fn into_value(self) -> FlagValue;
}

macro_rules! impl_scalar {
	($($rust:ty => $variant:ident),* $(,)?) => {
		$(
			impl sealed::Sealed for $rust {}

			impl FlagScalar for $rust {
				fn accepts(ty: FlagType) -> bool {
					ty == FlagType::$variant
				}

				fn from_value(value: &FlagValue) -> Option<Self> {
					match value {
						FlagValue::$variant(v) => Some(*v),
						_ => None,
					}
				}

				fn into_value(self) -> FlagValue {
					FlagValue::$variant(self)
				}
			}
		)*
	};
}

impl_scalar! {
	bool => Bool,
	i32 => Int,
	u32 => Uint,
	isize => Intx,
	usize => Uintx,
	u64 => Uint64,
	ByteSize => SizeT,
	f64 => Double,
}

impl sealed::Sealed for Option<String> {}

impl FlagScalar for Option<String> {
	fn accepts(ty: FlagType) -> bool {
		ty.is_string()
	}

	fn from_value(value: &FlagValue) -> Option<Self> {
		match value {
			FlagValue::Str(v) => Some(v.clone()),
			_ => None,
		}
	}

	fn into_value(self) -> FlagValue {
		FlagValue::Str(self)
	}
}
