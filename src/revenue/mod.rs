mod index;
mod normalize;
mod record;

pub use index::RevenueIndex;
pub use normalize::Normalizer;
pub use record::{RawRevenueRow, RevenueRecord};
