pub mod aggregate;
pub mod render;
pub mod sort;

pub use aggregate::aggregate;
pub use render::{flat_json, paths_table, referrers_table, summary_json, summary_table};
pub use sort::{sort_flat, sort_summary, FlatRecord};
