use thiserror::Error;

use crate::flags::Phase;

/// Result code surfaced by every public entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
	Success,
	MissingName,
	MissingValue,
	WrongFormat,
	NonWritable,
	OutOfBounds,
	ViolatesConstraint,
	InvalidFlag,
	CommandLineOnly,
	SetOnlyOnce,
	Constant,
	Other,
}

impl ErrorCode {
	pub const fn name(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::MissingName => "missing name",
			Self::MissingValue => "missing value",
			Self::WrongFormat => "wrong format",
			Self::NonWritable => "non-writable",
			Self::OutOfBounds => "flag value out of bounds",
			Self::ViolatesConstraint => "value violates its flag's constraint",
			Self::InvalidFlag => "there is no flag with the given name",
			Self::CommandLineOnly => "command line only",
			Self::SetOnlyOnce => "set only once",
			Self::Constant => "constant",
			Self::Other => "other, unspecified error related to setting the flag",
		}
	}

	/// Maps an access result onto its code.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(err) => err.code(),
		}
	}
}

impl core::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

/// Why a flag is hidden from mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockedMessage {
	DiagnosticLocked,
	ExperimentalLocked,
	DevelopInProductBuild,
	NotProductInProductBuild,
}

impl LockedMessage {
	/// Renders the user-facing instruction for flag `name`.
	pub fn render(self, name: &str) -> String {
		match self {
			Self::DiagnosticLocked => format!(
				"Error: VM option '{name}' is diagnostic and must be enabled via -XX:+UnlockDiagnosticVMOptions.\n\
				 Error: The unlock option must precede '{name}'.\n"
			),
			Self::ExperimentalLocked => format!(
				"Error: VM option '{name}' is experimental and must be enabled via -XX:+UnlockExperimentalVMOptions.\n\
				 Error: The unlock option must precede '{name}'.\n"
			),
			Self::DevelopInProductBuild => format!(
				"Error: VM option '{name}' is develop and is available only in debug version of VM.\n"
			),
			Self::NotProductInProductBuild => format!(
				"Error: VM option '{name}' is notproduct and is available only in debug version of VM.\n"
			),
		}
	}

	/// True for the two kinds that only exist in debug builds.
	pub const fn is_build_mismatch(self) -> bool {
		matches!(self, Self::DevelopInProductBuild | Self::NotProductInProductBuild)
	}
}

/// Errors returned by flag lookup and access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlagError {
	#[error("missing VM option name")]
	MissingName,
	#[error("missing value for VM option '{name}'")]
	MissingValue { name: String },
	#[error("wrong format for VM option '{name}': {detail}")]
	WrongFormat { name: String, detail: String },
	#[error("VM option '{name}' is not writeable")]
	NonWritable { name: String },
	#[error("{message}")]
	OutOfBounds { name: String, message: String },
	#[error("{message}")]
	ViolatesConstraint { name: String, message: String },
	#[error("Unrecognized VM option '{name}'")]
	InvalidFlag {
		name: String,
		suggestion: Option<String>,
	},
	#[error("{message}")]
	Locked {
		name: String,
		reason: LockedMessage,
		message: String,
	},
	#[error("VM option '{name}' can only be set at startup")]
	CommandLineOnly { name: String },
	#[error("{what} can only be set once")]
	SetOnlyOnce { what: String },
	#[error("VM option '{name}' is constant in this build")]
	Constant { name: String },
	#[error("{0}")]
	Other(String),
}

impl FlagError {
	pub fn code(&self) -> ErrorCode {
		match self {
			Self::MissingName => ErrorCode::MissingName,
			Self::MissingValue { .. } => ErrorCode::MissingValue,
			Self::WrongFormat { .. } => ErrorCode::WrongFormat,
			Self::NonWritable { .. } => ErrorCode::NonWritable,
			Self::OutOfBounds { .. } => ErrorCode::OutOfBounds,
			Self::ViolatesConstraint { .. } => ErrorCode::ViolatesConstraint,
			Self::InvalidFlag { .. } | Self::Locked { .. } => ErrorCode::InvalidFlag,
			Self::CommandLineOnly { .. } => ErrorCode::CommandLineOnly,
			Self::SetOnlyOnce { .. } => ErrorCode::SetOnlyOnce,
			Self::Constant { .. } => ErrorCode::Constant,
			Self::Other(_) => ErrorCode::Other,
		}
	}

	pub(crate) fn locked(name: &str, reason: LockedMessage) -> Self {
		Self::Locked {
			name: name.to_string(),
			reason,
			message: reason.render(name),
		}
	}

	pub(crate) fn wrong_type(name: &str, declared: &str, requested: &str) -> Self {
		Self::WrongFormat {
			name: name.to_string(),
			detail: format!("declared {declared}, accessed as {requested}"),
		}
	}
}

/// Errors returned by phase validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
	/// Usage error: phases must be validated in strictly increasing order.
	#[error("cannot validate phase {requested} after phase {last}")]
	OutOfOrder { requested: Phase, last: Phase },
	/// One or more flags failed; every failure is listed.
	#[error("{} VM option(s) failed validation", .0.len())]
	Failed(Vec<FlagError>),
}

/// Shorthand result for flag access.
pub type Result<T> = core::result::Result<T, FlagError>;
