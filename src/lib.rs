pub mod config;
pub mod convert;
pub mod error;
pub mod options;
pub mod query;
pub mod registry;
pub mod result;
pub mod source;
pub mod stage;
pub mod value;
pub mod walker;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::EngineConfig;
pub use error::QueryError;
pub use options::Options;
pub use query::CostQuery;
pub use registry::{StageFactory, StageRegistry};
pub use result::{Group, QueryResult};
pub use source::{EntrySource, JsonFileSource};
pub use stage::{Axis, Category, Stage, StageRef};
pub use value::Value;
pub use walker::{WalkOrder, Walker};
