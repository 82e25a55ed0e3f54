//! Startup sequence: ingest options, validate, run ergonomics, print.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result, bail};
use vmflags_ergonomics::{ErgoReport, Ergonomics, memory_init};
use vmflags_registry::args::{self, ArgError};
use vmflags_registry::keys::{PrintFlagsFinal, PrintFlagsInitial, PrintFlagsRanges, PrintFlagsWithComments};
use vmflags_registry::{Origin, Phase, PrintOptions, Registry, ValidationError, print_all};

use crate::cli::Cli;
use crate::profile::HostProfile;

/// Environment variable carrying extra options, processed before the command line.
pub const OPTIONS_ENV: &str = "VMFLAGS_TOOL_OPTIONS";

/// Result of a completed startup.
#[derive(Debug)]
pub struct Startup {
	pub registry: Registry,
	/// `None` when only the initial flags were printed.
	pub report: Option<ErgoReport>,
}

/// Runs the whole startup and writes any requested flag dump to `out`.
///
/// Every argument error and validation failure is written to stderr
/// before the run fails.
pub fn run(cli: &Cli, env_options: Option<&str>, out: &mut impl Write) -> Result<Startup> {
	let profile = match &cli.profile {
		Some(path) => HostProfile::load(path)?,
		None => HostProfile::default(),
	};
	let host = profile.host_setup();
	let mut registry = Registry::new(host);
	tracing::debug!(domain = "cli", ?host, "registry created");

	let mut all_options: Vec<String> = env_options
		.and_then(args::split_options)
		.unwrap_or_default();
	all_options.extend(cli.options.iter().cloned());
	let ignore_unrecognized = args::ignore_unrecognized_requested(&registry, &all_options);

	let mut errors: Vec<ArgError> = Vec::new();
	if let Some(text) = env_options {
		eprintln!("Picked up {OPTIONS_ENV}: {text}");
		errors.extend(
			args::parse_options_env(&mut registry, OPTIONS_ENV, text, ignore_unrecognized)
				.err()
				.unwrap_or_default(),
		);
	}
	if let Some(path) = &cli.flags_file {
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read settings file {}", path.display()))?;
		errors.extend(
			args::process_settings_file(&mut registry, &text, ignore_unrecognized)
				.err()
				.unwrap_or_default(),
		);
	}
	errors.extend(
		args::process_options(&mut registry, &cli.options, ignore_unrecognized, Origin::CommandLine)
			.err()
			.unwrap_or_default(),
	);
	if !errors.is_empty() {
		report_errors(&errors);
		bail!("could not initialize flags: {} invalid option(s)", errors.len());
	}

	validate(&mut registry, Phase::AtParse)?;

	if registry.value(PrintFlagsInitial) {
		print_all(&Registry::new(host), out, PrintOptions::default())?;
		return Ok(Startup {
			registry,
			report: None,
		});
	}

	let report = Ergonomics::new(&mut registry).run()?;
	validate(&mut registry, Phase::AfterErgo)?;
	memory_init(&mut registry)?;
	validate(&mut registry, Phase::AfterMemoryInit)?;
	if let Err(ValidationError::Failed(failures)) = registry.check_all_ranges(false) {
		report_errors(&failures);
		bail!("{} VM option(s) out of range after ergonomics", failures.len());
	}
	registry.seal();
	tracing::debug!(domain = "cli", mode = %report.mode, "startup complete");

	let with_comments = registry.value(PrintFlagsWithComments);
	if registry.value(PrintFlagsFinal) || with_comments {
		print_all(
			&registry,
			out,
			PrintOptions {
				with_comments,
				..PrintOptions::default()
			},
		)?;
	}
	if registry.value(PrintFlagsRanges) {
		print_all(
			&registry,
			out,
			PrintOptions {
				with_ranges: true,
				..PrintOptions::default()
			},
		)?;
	}

	Ok(Startup {
		registry,
		report: Some(report),
	})
}

fn validate(registry: &mut Registry, phase: Phase) -> Result<()> {
	match registry.validate_phase(phase) {
		Ok(()) => Ok(()),
		Err(ValidationError::Failed(failures)) => {
			report_errors(&failures);
			bail!("{} VM option(s) failed {} validation", failures.len(), phase.name());
		}
		Err(err) => Err(err.into()),
	}
}

fn report_errors(errors: &[impl Display]) {
	for err in errors {
		eprintln!("{}", err.to_string().trim_end());
	}
}
