//! Configuration-driven construction of module pipelines
//!
//! A YAML file names a registered model class and its constructor arguments.
//! The four component slots are read from the same `init_args` mapping:
//!
//! ```yaml
//! model:
//!   class_path: PixelStats
//!   init_args:
//!     eps: 0.001
//!     pre_processor:
//!       image_size: [128, 128]
//!     visualizer: false
//! ```
//!
//! Dotted `key=value` overrides are applied to the document before it is
//! interpreted.

mod components;
mod loader;
mod overrides;
mod registry;
mod schema;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

pub use components::ComponentArgs;
pub use loader::{instantiate, load_config, load_module};
pub use overrides::{apply_override, apply_overrides};
pub use registry::{Factory, Instance, ModelRegistry};
pub use schema::{ModelSection, ModuleConfig};
