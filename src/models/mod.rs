//! ONNX-backed networks of the pipeline.
//!
//! Each model owns its inference engine together with the pre- and
//! post-processing that turns images into tensors and tensors back into
//! masks or text. Models are created through their builders.

pub mod easter;
pub mod line_model;

pub use easter::{EasterModel, EasterModelBuilder};
pub use line_model::{LineModel, LineModelBuilder};
