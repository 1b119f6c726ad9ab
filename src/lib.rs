#![doc = "County revenue join pipeline public API"]
pub mod cli;
pub mod commands;
mod error;
mod fips;
mod geom;
mod ingest;
mod pipeline;
mod revenue;
mod states;
mod topo;

#[doc(inline)]
pub use error::JoinError;

#[doc(inline)]
pub use fips::Fips;

#[doc(inline)]
pub use geom::{Feature, STATE_COUNT, aggregate_states, filter_counties};

#[doc(inline)]
pub use pipeline::{Config, Summary, run};

#[doc(inline)]
pub use revenue::{Normalizer, RawRevenueRow, RevenueIndex, RevenueRecord};

#[doc(inline)]
pub use states::{StateMeta, StateTable, TERRITORIES};

#[doc(inline)]
pub use topo::{EncodeOptions, Topology, encode, featurize};
