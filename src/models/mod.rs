pub mod price_history;
pub mod product;

pub use price_history::*;
pub use product::*;
