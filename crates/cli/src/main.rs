//! `vmflags` binary.
//!
//! Builds a flag registry for a host profile, applies the options
//! environment variable, an optional settings file and the command-line
//! options, then runs validation and compilation ergonomics and prints the
//! requested flag dumps.

mod cli;
mod profile;
mod run;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Overrides the log filter, e.g. `VMFLAGS_LOG=ergo=debug`.
const LOG_ENV: &str = "VMFLAGS_LOG";

fn setup_tracing(verbose: bool) {
	let filter = EnvFilter::try_from_env(LOG_ENV)
		.unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.without_time(),
		)
		.init();
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let env_options = std::env::var(run::OPTIONS_ENV).ok();
	let mut stdout = std::io::stdout().lock();
	let startup = run::run(&cli, env_options.as_deref(), &mut stdout)?;
	if let Some(report) = &startup.report {
		tracing::info!(
			domain = "cli",
			flags = startup.registry.len(),
			mode = %report.mode,
			adjustments = report.adjustments.len(),
			"flags resolved",
		);
	}
	Ok(())
}
