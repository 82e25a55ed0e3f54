//! Runtime VM flag registry.
//!
//! A statically declared table of typed flags with a hashed name index,
//! ranges and cross-flag constraints validated in phases, and gated access
//! that records where every value came from.
//!
//! # Modules
//!
//! - [`builtins`] - the built-in flag table and its typed keys (also [`keys`])
//! - [`flags`] - descriptors, limits and the lookup index
//! - [`compiler`] - host setup, execution and compilation modes
//! - [`args`] - startup argument, environment and settings file processing
//! - [`print`] - column dump of flags and ranges
//!
//! # Example
//!
//! ```ignore
//! use vmflags_registry::{HostSetup, Origin, Phase, Registry, keys};
//!
//! let mut registry = Registry::new(HostSetup::default());
//! registry.set_from_text("CICompilerCount", "4", Origin::CommandLine)?;
//! registry.validate_phase(Phase::AtParse)?;
//! assert_eq!(registry.value(keys::CICompilerCount), 4);
//! ```

pub mod args;
pub mod builtins;
pub mod compiler;
pub mod core;
pub mod flags;
pub mod parse;
pub mod print;
mod registry;

pub use args::ArgError;
pub use builtins as keys;
pub use bytesize;
pub use compiler::{BuildFlavor, CompilerConfig, CompilerMode, ExecMode, HostSetup, ModeCell};
pub use crate::core::{
	Backend, Backends, ErrorCode, FlagDefault, FlagError, FlagKind, FlagScalar, FlagType, FlagValue,
	LockedMessage, Origin, Provenance, ValidationError,
};
pub use flags::{
	Bounds, Check, ConstraintCx, FlagDef, FlagId, FlagLimit, FlagTable, Phase, TypedFlagKey, Violation,
};
pub use print::{PrintOptions, print_all};
pub use registry::{FUZZY_THRESHOLD, Registry};
