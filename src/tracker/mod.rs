pub mod streak;

pub use streak::{StableFrame, StableLabels, TemporalSmoother};
