/// Provenance of a flag's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
	/// Compiled-in default.
	#[default]
	Default,
	/// Startup command line.
	CommandLine,
	/// Options environment variable.
	Environment,
	/// Settings file.
	ConfigFile,
	/// Management interface after startup.
	Management,
	/// Derived by ergonomics.
	Ergonomic,
	/// Attach-on-demand interface after startup.
	AttachOnDemand,
	/// Set by the runtime itself.
	Internal,
	/// Options embedded in the runtime image.
	ResourceImage,
}

impl Origin {
	pub const fn name(self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::CommandLine => "command line",
			Self::Environment => "environment",
			Self::ConfigFile => "config file",
			Self::Management => "management",
			Self::Ergonomic => "ergonomic",
			Self::AttachOnDemand => "attach",
			Self::Internal => "internal",
			Self::ResourceImage => "resource image",
		}
	}

	/// Origins that only make sense while the process is starting up.
	pub const fn is_startup(self) -> bool {
		matches!(
			self,
			Self::Default | Self::CommandLine | Self::Environment | Self::ConfigFile | Self::ResourceImage
		)
	}

	/// Origins that represent an external writer after startup.
	pub const fn is_external_runtime(self) -> bool {
		matches!(self, Self::Management | Self::AttachOnDemand)
	}

	/// Origins exempt from the writability gate.
	pub const fn is_trusted(self) -> bool {
		matches!(self, Self::Ergonomic | Self::Internal)
	}
}

impl core::fmt::Display for Origin {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

/// Origin plus the sticky command-line bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Provenance {
	pub origin: Origin,
	pub set_on_command_line: bool,
}

impl Provenance {
	pub(crate) fn record(&mut self, origin: Origin) {
		self.origin = origin;
		if origin == Origin::CommandLine {
			self.set_on_command_line = true;
		}
	}
}

impl core::fmt::Display for Provenance {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		if self.origin == Origin::Ergonomic && self.set_on_command_line {
			f.write_str("command line, ")?;
		}
		f.write_str(self.origin.name())
	}
}
