//! Deprecated, obsolete and aliased flag names.

/// Release whose rules apply to argument processing.
pub const CURRENT_VERSION: u32 = 18;

/// Lifecycle of a retired or retiring flag, by release number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialFlag {
	pub name: &'static str,
	/// Still accepted, with a warning.
	pub deprecated_in: Option<u32>,
	/// Accepted and ignored, with a warning.
	pub obsolete_in: Option<u32>,
	/// Treated as unknown.
	pub expired_in: Option<u32>,
}

impl SpecialFlag {
	const fn new(
		name: &'static str,
		deprecated_in: Option<u32>,
		obsolete_in: Option<u32>,
		expired_in: Option<u32>,
	) -> Self {
		Self {
			name,
			deprecated_in,
			obsolete_in,
			expired_in,
		}
	}

	pub fn status_at(&self, version: u32) -> SpecialStatus {
		let reached = |release: Option<u32>| release.is_some_and(|r| version >= r);
		if reached(self.expired_in) {
			SpecialStatus::Expired
		} else if reached(self.obsolete_in) {
			SpecialStatus::Obsolete(self.obsolete_in.unwrap_or(version))
		} else if reached(self.deprecated_in) {
			SpecialStatus::Deprecated(self.deprecated_in.unwrap_or(version))
		} else {
			SpecialStatus::Current
		}
	}
}

/// How argument processing treats a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialStatus {
	Current,
	/// Deprecated since the given release.
	Deprecated(u32),
	/// Obsolete since the given release.
	Obsolete(u32),
	Expired,
}

pub static SPECIAL_FLAGS: &[SpecialFlag] = &[
	SpecialFlag::new("FilterSpuriousWakeups", Some(18), Some(19), Some(20)),
	SpecialFlag::new("CreateMinidumpOnCrash", Some(9), None, None),
	SpecialFlag::new("UseOptoBiasInlining", Some(15), Some(18), Some(19)),
	SpecialFlag::new("CriticalJNINatives", Some(16), Some(18), Some(19)),
	SpecialFlag::new("Tier3AOTInvocationThreshold", None, Some(17), Some(18)),
	SpecialFlag::new("Tier3AOTMinInvocationThreshold", None, Some(17), Some(18)),
	SpecialFlag::new("UseAOT", None, Some(17), Some(18)),
];

/// Old name to replacement name.
pub static ALIASES: &[(&str, &str)] = &[("CreateMinidumpOnCrash", "CreateCoredumpOnCrash")];

pub(super) fn status(name: &str) -> SpecialStatus {
	SPECIAL_FLAGS
		.iter()
		.find(|flag| flag.name == name)
		.map_or(SpecialStatus::Current, |flag| flag.status_at(CURRENT_VERSION))
}

/// Replacement for an aliased name, or the name itself.
pub fn real_flag_name(name: &str) -> &str {
	ALIASES
		.iter()
		.find(|(alias, _)| *alias == name)
		.map_or(name, |(_, real)| real)
}
