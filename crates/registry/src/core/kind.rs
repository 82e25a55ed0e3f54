bitflags::bitflags! {
	/// Classification bits of a flag descriptor.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct FlagKind: u32 {
		/// Available in every build.
		const PRODUCT = 1 << 0;
		/// Writable after startup through management interfaces.
		const MANAGEABLE = 1 << 1;
		/// Locked until `UnlockDiagnosticVMOptions` is set.
		const DIAGNOSTIC = 1 << 2;
		/// Locked until `UnlockExperimentalVMOptions` is set.
		const EXPERIMENTAL = 1 << 3;
		/// Constant in product builds, settable in debug builds only.
		const NOT_PRODUCT = 1 << 4;
		/// Constant in product builds, settable in debug builds only.
		const DEVELOP = 1 << 5;
		/// Default depends on the host setup.
		const PLATFORM_DEPENDENT = 1 << 6;
		/// Belongs to the light (quick) backend.
		const LIGHT = 1 << 7;
		/// Belongs to the heavy (optimizing) backend.
		const HEAVY = 1 << 8;
		/// Belongs to the heavy-alternate backend.
		const HEAVY_ALT = 1 << 9;
		/// Only meaningful on 64-bit hosts.
		const LP64 = 1 << 10;
	}
}

impl FlagKind {
	const EXCLUSIVE: Self = Self::DIAGNOSTIC.union(Self::MANAGEABLE).union(Self::EXPERIMENTAL);
	const BUILD_ONLY: Self = Self::DEVELOP.union(Self::NOT_PRODUCT);
	const FAMILIES: Self = Self::LIGHT.union(Self::HEAVY).union(Self::HEAVY_ALT);

	/// Checks the kind combination rules.
	///
	/// At most one of diagnostic, manageable and experimental may be set, and
	/// none of them may be combined with develop or not-product.
	pub fn validate(self) -> Result<(), &'static str> {
		let exclusive = self.intersection(Self::EXCLUSIVE);
		if exclusive.bits().count_ones() > 1 {
			return Err("at most one of diagnostic, manageable and experimental may be set");
		}
		if !exclusive.is_empty() && self.intersects(Self::BUILD_ONLY) {
			return Err("diagnostic, manageable and experimental flags cannot be develop or notproduct");
		}
		Ok(())
	}

	/// Backends this flag belongs to; empty for shared flags.
	pub fn families(self) -> Backends {
		let mut set = Backends::empty();
		if self.contains(Self::LIGHT) {
			set |= Backends::LIGHT;
		}
		if self.contains(Self::HEAVY) {
			set |= Backends::HEAVY;
		}
		if self.contains(Self::HEAVY_ALT) {
			set |= Backends::HEAVY_ALT;
		}
		set
	}

	pub fn is_build_only(self) -> bool {
		self.intersects(Self::BUILD_ONLY)
	}

	/// Writes the `{...}` kind column used by flag listings.
	pub fn label(self) -> String {
		const NAMES: &[(FlagKind, &str)] = &[
			(FlagKind::LIGHT, "light"),
			(FlagKind::HEAVY, "heavy"),
			(FlagKind::HEAVY_ALT, "heavy-alt"),
			(FlagKind::PLATFORM_DEPENDENT, "pd"),
			(FlagKind::PRODUCT, "product"),
			(FlagKind::MANAGEABLE, "manageable"),
			(FlagKind::DIAGNOSTIC, "diagnostic"),
			(FlagKind::EXPERIMENTAL, "experimental"),
			(FlagKind::NOT_PRODUCT, "notproduct"),
			(FlagKind::DEVELOP, "develop"),
			(FlagKind::LP64, "lp64"),
		];
		let words: Vec<&str> = NAMES
			.iter()
			.filter(|(bit, _)| self.contains(*bit))
			.map(|(_, name)| *name)
			.collect();
		format!("{{{}}}", words.join(" "))
	}

	pub(crate) fn has_family(self) -> bool {
		self.intersects(Self::FAMILIES)
	}
}

/// An execution backend that may be compiled into the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
	/// Fast, lightly optimizing compiler.
	Light,
	/// Slow, heavily optimizing compiler.
	Heavy,
	/// Alternate heavy compiler that must be enabled explicitly.
	HeavyAlt,
}

bitflags::bitflags! {
	/// Set of execution backends available to the host.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Backends: u8 {
		const LIGHT = 1 << 0;
		const HEAVY = 1 << 1;
		const HEAVY_ALT = 1 << 2;
	}
}

impl Backend {
	pub const fn as_set(self) -> Backends {
		match self {
			Self::Light => Backends::LIGHT,
			Self::Heavy => Backends::HEAVY,
			Self::HeavyAlt => Backends::HEAVY_ALT,
		}
	}
}

impl FromIterator<Backend> for Backends {
	fn from_iter<I: IntoIterator<Item = Backend>>(iter: I) -> Self {
		let mut set = Backends::empty();
		for backend in iter {
			set |= backend.as_set();
		}
		set
	}
}

impl core::str::FromStr for Backend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"light" => Ok(Self::Light),
			"heavy" => Ok(Self::Heavy),
			"heavy-alt" => Ok(Self::HeavyAlt),
			other => Err(format!("unknown backend '{other}' (expected light, heavy or heavy-alt)")),
		}
	}
}
