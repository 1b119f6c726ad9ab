mod decode;
mod doc;
mod encode;

pub use decode::featurize;
pub use doc::{TopoGeometry, TopoObject, Topology, Transform};
pub use encode::{EncodeOptions, encode};
