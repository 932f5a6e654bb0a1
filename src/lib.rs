pub mod dominance;
pub mod engine;
pub mod error;
pub mod graph;
pub mod params;
pub mod path;
pub mod result;
pub mod state;

mod explore;
mod transfer;
mod utils;

pub use engine::RaptorEngine;
pub use error::RaptorError;
pub use graph::{GraphView, GraphViewBuilder, RaptorModel};
pub use params::RaptorParameters;
pub use path::InitialStop;
pub use result::{Leg, NonPtMode, RaptorRoute};

pub type Timestamp = u32;
pub type Cost = f32;
pub type RouteIndex = u32;
pub type RouteStopIndex = u32;
pub type StopIndex = u32;
