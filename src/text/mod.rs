//! Label and text codec.
//!
//! Cleans raw transcriptions, converts between Tibetan script and the EWTS
//! transliteration the recognizer works in, and maps text to charset indices.

pub mod charset;
pub mod clean;
pub mod codec;
pub mod wylie;

pub use charset::Charset;
pub use clean::clean;
pub use codec::{read_label, restore_separators, to_native_script, to_transliteration};
