pub mod dashboard;
pub mod dataset;
pub mod detail;
pub mod error;
pub mod filter;
pub mod time_range;
pub mod types;
pub mod version_tree;
pub mod workflow;

pub use dashboard::*;
pub use dataset::*;
pub use detail::*;
pub use error::*;
pub use filter::*;
pub use time_range::*;
pub use types::*;
pub use version_tree::*;
pub use workflow::*;
