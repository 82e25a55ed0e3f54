//! Host profile loaded from TOML.
//!
//! ```toml
//! backends = ["light", "heavy"]
//! flavor = "debug"
//! exec-mode = "interpreted"
//! processors = 8
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use vmflags_registry::{Backend, Backends, BuildFlavor, ExecMode, HostSetup};

/// Backend named in a profile: `light`, `heavy` or `heavy-alt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct BackendName(pub Backend);

impl TryFrom<String> for BackendName {
	type Error = String;

	fn try_from(name: String) -> Result<Self, Self::Error> {
		name.parse().map(Self)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlavorName {
	Product,
	Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecModeName {
	Interpreted,
	Mixed,
	Compiled,
}

/// Static facts about the host; anything left out keeps the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HostProfile {
	pub backends: Option<Vec<BackendName>>,
	pub flavor: Option<FlavorName>,
	pub exec_mode: Option<ExecModeName>,
	pub processors: Option<usize>,
	pub lp64: Option<bool>,
}

impl HostProfile {
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read host profile {}", path.display()))?;
		toml::from_str(&text).with_context(|| format!("invalid host profile {}", path.display()))
	}

	pub fn host_setup(&self) -> HostSetup {
		let mut host = HostSetup::default();
		if let Some(backends) = &self.backends {
			host.backends = backends.iter().map(|backend| backend.0).collect::<Backends>();
		}
		if let Some(flavor) = self.flavor {
			host.flavor = match flavor {
				FlavorName::Product => BuildFlavor::Product,
				FlavorName::Debug => BuildFlavor::Debug,
			};
		}
		if let Some(mode) = self.exec_mode {
			host.exec_mode = match mode {
				ExecModeName::Interpreted => ExecMode::Interpreted,
				ExecModeName::Mixed => ExecMode::Mixed,
				ExecModeName::Compiled => ExecMode::Compiled,
			};
		}
		if let Some(processors) = self.processors {
			host = host.with_processors(processors);
		}
		if let Some(lp64) = self.lp64 {
			host.lp64 = lp64;
		}
		host
	}
}
