//! Tensor aliases used by the models and the batch loader.

/// A 1D tensor of f32 values.
pub type Tensor1D = ndarray::Array1<f32>;

/// A 2D tensor of f32 values.
pub type Tensor2D = ndarray::Array2<f32>;

/// A 3D tensor of f32 values.
pub type Tensor3D = ndarray::Array3<f32>;

/// A 4D tensor of f32 values.
pub type Tensor4D = ndarray::Array4<f32>;
