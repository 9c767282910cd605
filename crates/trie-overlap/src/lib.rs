pub mod locate;
pub mod output;
pub mod partition;

pub use locate::{OverlapConfig, OverlapFormat, OverlapLocator, OverlapRecord};
pub use output::OverlapWriter;
pub use partition::{Partition, Role};
