use std::marker::PhantomData;

use super::FlagId;
use crate::core::FlagScalar;

/// Typed handle to a built-in flag with compile-time type information.
pub struct TypedFlagKey<T: FlagScalar> {
	pub(crate) id: FlagId,
	pub(crate) _marker: PhantomData<fn() -> T>,
}

impl<T: FlagScalar> Clone for TypedFlagKey<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T: FlagScalar> Copy for TypedFlagKey<T> {}

impl<T: FlagScalar> core::fmt::Debug for TypedFlagKey<T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_tuple("TypedFlagKey").field(&self.id).finish()
	}
}

impl<T: FlagScalar> TypedFlagKey<T> {
	pub const fn new(id: FlagId) -> Self {
		Self {
			id,
			_marker: PhantomData,
		}
	}

	/// Returns the untyped descriptor id.
	pub const fn id(self) -> FlagId {
		self.id
	}
}
