pub mod aggregator;
pub mod merge;
pub mod normalize;
pub mod summarizer;
pub mod units;

pub use crate::domain::model::{CarProfile, ProviderRecord};
pub use crate::domain::ports::{LookupQuery, ProviderAdapter};
pub use crate::utils::error::Result;
