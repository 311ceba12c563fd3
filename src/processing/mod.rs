//! Tags evaluated while loading: `!IncludeFile` and `!ToString`.

pub mod include;
pub mod stringify;

pub use include::{guess_media_type, IncludeFormat};
pub use stringify::{stringify, ConvertTo, StringifyOptions};
