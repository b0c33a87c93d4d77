//! Component factory: variant constructors and detached blueprints

mod registry;
pub mod templates;

pub use registry::{Blueprint, ComponentFactory, Constructor, FactoryError};
pub use templates::{register_builtins, style_header_actions};
