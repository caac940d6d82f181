pub mod buffer;
pub mod error;
pub mod glutils;
pub mod input;
pub mod shaders;
pub mod system;
pub mod texture;
pub mod vao;

#[cfg(any(test, feature = "headless"))]
pub mod headless;

pub use error::BackendError;
