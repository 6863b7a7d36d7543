//! ONNX Runtime inference engine.
//!
//! [`OrtInfer`] owns one or more sessions for a single model and binds one named
//! input tensor to one output tensor. Models in this crate take a single input,
//! so no multi-input plumbing is provided.

pub mod ort_infer;

pub use ort_infer::OrtInfer;
