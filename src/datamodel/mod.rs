pub mod aggregated;
pub mod label;
pub mod sample;

pub use aggregated::{AggregatedLabel, AggregatedTimeseries, SamplePoint};
pub use label::{Label, Labels, NAME_LABEL};
pub use sample::Sample;
