mod aggregate;
mod feature;
mod filter;

pub use aggregate::{aggregate_states, STATE_COUNT};
pub use feature::Feature;
pub use filter::filter_counties;
