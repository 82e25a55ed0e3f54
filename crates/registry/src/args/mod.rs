//! Startup argument processing.
//!
//! Handles the `-XX:` flag syntax, execution mode switches, the options
//! environment variable and settings files. Deprecated flags warn, obsolete
//! flags are ignored with a warning and aliases map to their replacement.

mod special;
mod tokenize;

use thiserror::Error;

pub use special::{ALIASES, CURRENT_VERSION, SPECIAL_FLAGS, SpecialFlag, SpecialStatus, real_flag_name};
pub use tokenize::{settings_file_tokens, split_options};

use crate::builtins::IgnoreUnrecognizedVMOptions;
use crate::compiler::ExecMode;
use crate::core::{FlagError, FlagType, FlagValue, Origin};
use crate::flags::FlagId;
use crate::parse;
use crate::registry::Registry;

/// Errors produced while processing one startup argument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgError {
	#[error("Missing +/- setting for VM option '{name}'")]
	MissingSign { name: String },
	#[error("Unexpected +/- setting in VM option '{name}'")]
	UnexpectedSign { name: String },
	#[error("Improperly specified VM option '{arg}'")]
	Improper { arg: String },
	#[error("Unrecognized VM option '{name}'{hint}")]
	Unrecognized { name: String, hint: String },
	#[error("Unrecognized option: {0}")]
	UnrecognizedOption(String),
	#[error("Unmatched quote in {0}")]
	UnmatchedQuote(String),
	#[error(transparent)]
	Flag(#[from] FlagError),
}

/// Which spelling an argument used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form<'a> {
	/// `+Name` or `-Name`.
	Switch(bool),
	/// `Name=value`.
	Assign(&'a str),
	/// `Name:=value`, resets a string.
	Reset(&'a str),
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Splits an argument into its name and form, or `None` when malformed.
fn split_argument(arg: &str) -> Option<(&str, Form<'_>)> {
	if let Some(rest) = arg.strip_prefix('+').or_else(|| arg.strip_prefix('-')) {
		let name_ok = !rest.is_empty() && rest.chars().all(is_name_char);
		return name_ok.then_some((rest, Form::Switch(arg.starts_with('+'))));
	}
	let end = arg.find(|c: char| !is_name_char(c))?;
	let (name, tail) = arg.split_at(end);
	if name.is_empty() {
		return None;
	}
	if let Some(value) = tail.strip_prefix(":=") {
		return Some((name, Form::Reset(value)));
	}
	tail.strip_prefix('=').map(|value| (name, Form::Assign(value)))
}

/// Name part of an argument with any sign and value stripped.
fn bare_name(arg: &str) -> &str {
	let name = arg.strip_prefix(['+', '-']).unwrap_or(arg);
	let end = name.find(['=', ':']).unwrap_or(name.len());
	&name[..end]
}

/// Processes one flag argument, given without its `-XX:` prefix.
///
/// `ignore_unrecognized` silences unknown flags and build-only flags of a
/// product build. Arguments starting with `#` are comments.
pub fn process_argument(
	registry: &mut Registry,
	arg: &str,
	ignore_unrecognized: bool,
	origin: Origin,
) -> Result<(), ArgError> {
	let name = bare_name(arg);
	match special::status(name) {
		SpecialStatus::Obsolete(version) => {
			tracing::warn!(
				domain = "args",
				flag = name,
				"Ignoring option {name}; support was removed in {version}",
			);
			return Ok(());
		}
		SpecialStatus::Deprecated(version) => {
			let real = real_flag_name(name);
			if real != name {
				tracing::warn!(
					domain = "args",
					flag = name,
					"Option {name} was deprecated in version {version} and will likely be removed in a future release. Use option {real} instead.",
				);
			} else {
				tracing::warn!(
					domain = "args",
					flag = name,
					"Option {name} was deprecated in version {version} and will likely be removed in a future release.",
				);
			}
		}
		SpecialStatus::Expired | SpecialStatus::Current => {}
	}

	let real = real_flag_name(name);
	let Some(id) = registry.find(real) else {
		if arg.starts_with('#') || ignore_unrecognized {
			return Ok(());
		}
		let hint = registry
			.fuzzy_find(name, true)
			.map(|id| {
				let def = registry.table().def(id);
				if def.is_bool() {
					format!("\nDid you mean '(+/-){}'? ", def.name)
				} else {
					format!("\nDid you mean '{}=<value>'? ", def.name)
				}
			})
			.unwrap_or_default();
		return Err(ArgError::Unrecognized {
			name: name.to_string(),
			hint,
		});
	};

	if let Some(reason) = registry.locked_message(id) {
		if ignore_unrecognized && reason.is_build_mismatch() {
			return Ok(());
		}
		return Err(FlagError::locked(real, reason).into());
	}

	let def = registry.table().def(id);
	let Some((_, form)) = split_argument(arg) else {
		return Err(malformed(arg, def.is_bool()));
	};
	apply(registry, id, arg, form, origin)
}

fn malformed(arg: &str, is_bool: bool) -> ArgError {
	let has_sign = arg.starts_with(['+', '-']);
	let name = arg.strip_prefix(['+', '-']).unwrap_or(arg).to_string();
	match (is_bool, has_sign) {
		(true, false) => ArgError::MissingSign { name },
		(false, true) => ArgError::UnexpectedSign { name },
		_ => ArgError::Improper { arg: name },
	}
}

fn apply(registry: &mut Registry, id: FlagId, arg: &str, form: Form<'_>, origin: Origin) -> Result<(), ArgError> {
	let def = registry.table().def(id);
	match (def.flag_type(), form) {
		(FlagType::Bool, Form::Switch(on)) => registry.set(id, on, origin).map(drop)?,
		(_, Form::Switch(_)) | (FlagType::Bool, _) => return Err(malformed(arg, def.is_bool())),
		(FlagType::CcstrList, Form::Assign(value)) => registry.append_string(id, value, origin)?,
		(ty, Form::Assign(value) | Form::Reset(value)) if ty.is_string() => {
			let value = (!value.is_empty()).then(|| value.to_string());
			registry.set_string(id, value, origin).map(drop)?;
		}
		(_, Form::Reset(_)) => return Err(malformed(arg, false)),
		(ty, Form::Assign(text)) => {
			let value = parse::parse_value(ty, text).map_err(|_| ArgError::Improper {
				arg: arg.to_string(),
			})?;
			store_numeric(registry, id, value, origin)?;
		}
	}
	Ok(())
}

fn store_numeric(registry: &mut Registry, id: FlagId, value: FlagValue, origin: Origin) -> Result<(), FlagError> {
	let name = registry.table().def(id).name;
	registry.set_from_value(name, value, origin).map(drop)
}

/// Processes one startup option.
///
/// `-XX:` options go through [`process_argument`]; `-Xint`, `-Xmixed` and
/// `-Xcomp` select the execution mode.
pub fn process_option(
	registry: &mut Registry,
	option: &str,
	ignore_unrecognized: bool,
	origin: Origin,
) -> Result<(), ArgError> {
	if let Some(arg) = option.strip_prefix("-XX:") {
		if registry.value(crate::builtins::PrintVMOptions) {
			tracing::info!(domain = "args", "VM option '{arg}'");
		}
		return process_argument(registry, arg, ignore_unrecognized, origin);
	}
	let mode = match option {
		"-Xint" => ExecMode::Interpreted,
		"-Xmixed" => ExecMode::Mixed,
		"-Xcomp" => ExecMode::Compiled,
		_ => return Err(ArgError::UnrecognizedOption(option.to_string())),
	};
	registry.set_exec_mode(mode);
	Ok(())
}

/// Whether any option turns on `IgnoreUnrecognizedVMOptions`; later
/// occurrences win.
pub fn ignore_unrecognized_requested<S: AsRef<str>>(registry: &Registry, options: &[S]) -> bool {
	options
		.iter()
		.filter_map(|option| match option.as_ref() {
			"-XX:+IgnoreUnrecognizedVMOptions" => Some(true),
			"-XX:-IgnoreUnrecognizedVMOptions" => Some(false),
			_ => None,
		})
		.last()
		.unwrap_or_else(|| registry.value(IgnoreUnrecognizedVMOptions))
}

/// Processes every option, collecting all failures.
pub fn process_options<S: AsRef<str>>(
	registry: &mut Registry,
	options: &[S],
	ignore_unrecognized: bool,
	origin: Origin,
) -> Result<(), Vec<ArgError>> {
	let errors: Vec<ArgError> = options
		.iter()
		.filter_map(|option| process_option(registry, option.as_ref(), ignore_unrecognized, origin).err())
		.collect();
	if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Processes the contents of a settings file with the `ConfigFile` origin.
///
/// Tokens are flag arguments without the `-XX:` prefix.
pub fn process_settings_file(
	registry: &mut Registry,
	text: &str,
	ignore_unrecognized: bool,
) -> Result<(), Vec<ArgError>> {
	let errors: Vec<ArgError> = settings_file_tokens(text)
		.iter()
		.filter_map(|token| process_argument(registry, token, ignore_unrecognized, Origin::ConfigFile).err())
		.collect();
	if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Processes an options environment variable with the `Environment` origin.
pub fn parse_options_env(
	registry: &mut Registry,
	var_name: &str,
	text: &str,
	ignore_unrecognized: bool,
) -> Result<(), Vec<ArgError>> {
	let options = split_options(text).ok_or_else(|| vec![ArgError::UnmatchedQuote(var_name.to_string())])?;
	process_options(registry, &options, ignore_unrecognized, Origin::Environment)
}
