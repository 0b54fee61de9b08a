//! Static game data consumed by the guide: the achievement category layout.

mod category;
pub use category::Category;
mod schema;
pub use schema::{CategoryEntry, CategorySchema};
