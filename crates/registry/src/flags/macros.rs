//! Declaration macro for the built-in descriptor table.

/// Maps a [`FlagType`](crate::FlagType) variant name to its Rust storage type.
#[doc(hidden)]
#[macro_export]
macro_rules! __flag_rust_type {
	(Bool) => { bool };
	(Int) => { i32 };
	(Uint) => { u32 };
	(Intx) => { isize };
	(Uintx) => { usize };
	(Uint64) => { u64 };
	(SizeT) => { $crate::bytesize::ByteSize };
	(Double) => { f64 };
	(Ccstr) => { ::core::option::Option<::std::string::String> };
	(CcstrList) => { ::core::option::Option<::std::string::String> };
}

/// Declares a descriptor table.
///
/// This macro generates:
/// - A `static FLAGS: &[FlagDef]` slice in declaration order
/// - A typed [`TypedFlagKey`](crate::TypedFlagKey) constant per flag, named like the flag
///
/// # Example
///
/// ```ignore
/// flags! {
///     CompileThreshold, {
///         type: Intx,
///         default: 10000,
///         kind: PRODUCT,
///         doc: "number of interpreted method invocations before (re-)compiling",
///     };
///     SegmentedCodeCache, {
///         type: Bool,
///         default: false,
///         kind: PRODUCT | PLATFORM_DEPENDENT,
///         doc: "Use a segmented code cache",
///     };
/// }
///
/// let threshold: isize = registry.value(CompileThreshold);
/// ```
#[macro_export]
macro_rules! flags {
	($(
		$(#[$attr:meta])*
		$name:ident, {
			type: $ty:ident,
			default: $default:expr,
			kind: $($kind:ident)|+,
			doc: $doc:literal
			$(,)?
		};
	)*) => {
		#[allow(non_camel_case_types, dead_code)]
		#[repr(u16)]
		enum Slot {
			$($name,)*
		}

		/// Descriptor table in declaration order.
		pub static FLAGS: &[$crate::FlagDef] = &[$(
			$crate::FlagDef::new(
				stringify!($name),
				$crate::FlagDefault::$ty($default),
				$crate::FlagKind::from_bits_retain(0 $(| $crate::FlagKind::$kind.bits())+),
				$doc,
			),
		)*];

		$(
			$(#[$attr])*
			#[doc = concat!("Typed handle for `", stringify!($name), "`: ", $doc)]
			#[allow(non_upper_case_globals)]
			pub const $name: $crate::TypedFlagKey<$crate::__flag_rust_type!($ty)> =
				$crate::TypedFlagKey::new($crate::FlagId::new(Slot::$name as u16));
		)*
	};
}
