//! Sluice Pipe - re-entrant lazy pipelines
//!
//! A pipeline is built once from named stages and then fed any number of
//! times. Data enters through a refillable [`Reservoir`], flows lazily
//! through the chain and leaves either as a stream of elements or, behind
//! a terminal stage, as one aggregate computed by a [`Valve`].
//!
//! - [`Registry`] maps stage names to descriptors and loads add-ins
//! - [`Pipe`] is the fluent, immutable chain handle
//! - [`Bypass`] carries values around a sub-chain
//! - [`Confluence`] fans many input streams into one chain
//!
//! # Example
//!
//! ```ignore
//! let mut registry = Registry::new().with_catalog([sluice_test::add_in()]);
//! registry.load(&["fixtures"])?;
//! let max = registry.pipe().then("max")?.into_pipe()?;
//! assert_eq!(max.run([3, 9, 4])?.into_value()?, Value::Int(9));
//! assert_eq!(max.run([1, 2])?.into_value()?, Value::Int(2));
//! ```

mod assemble;
pub mod bypass;
pub mod confluence;
mod map_stage;
pub mod pipe;
pub mod registry;
pub mod reservoir;
pub mod valve;

pub use bypass::{Bypass, BypassDef, Drip, MergeFn, SplitFn};
pub use confluence::{Confluence, HandleId, StreamHandle};
pub use pipe::{Outcome, Pipe};
pub use registry::{Entry, Registry};
pub use reservoir::Reservoir;
pub use valve::{Primed, Valve};
