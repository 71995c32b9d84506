//! CLI library for testing purposes

pub mod compile;
pub mod extract;
pub mod formats;
pub mod plurals;
pub mod stringset;
pub mod validation;
pub mod view;

pub use formats::{HandlerArgs, NewlineArg, get_supported_formats, resolve_format};
pub use stringset::{read_stringset, write_stringset};
