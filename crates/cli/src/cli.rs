use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "vmflags")]
#[command(about = "Resolve VM flags and compilation ergonomics for a host")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// VM options, e.g. -XX:+PrintFlagsFinal, -XX:CICompilerCount=4 or -Xint
	#[arg(allow_hyphen_values = true, trailing_var_arg = true, value_name = "OPTION")]
	pub options: Vec<String>,

	/// Settings file with whitespace-separated flags, without the -XX: prefix
	#[arg(long, value_name = "PATH")]
	pub flags_file: Option<PathBuf>,

	/// TOML host profile: backends, build flavor, execution mode, processors
	#[arg(long, value_name = "PATH")]
	pub profile: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}
