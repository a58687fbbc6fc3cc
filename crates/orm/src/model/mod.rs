//! Model System - handles for defined models and their bound instances

pub mod handle;
pub mod instance;

pub use handle::Model;
pub use instance::{DestroyOptions, Instance};
