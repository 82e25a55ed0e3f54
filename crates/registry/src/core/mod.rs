//! Value, kind and provenance model shared by every flag.

mod error;
mod kind;
mod origin;
mod value;

pub use error::{ErrorCode, FlagError, LockedMessage, Result, ValidationError};
pub use kind::{Backend, Backends, FlagKind};
pub use origin::{Origin, Provenance};
pub use value::{FlagDefault, FlagScalar, FlagType, FlagValue};
