//! Text and date clean-up applied to feed entries before they are merged.

pub mod date;
pub mod title;

pub use date::{normalize as normalize_date, DateInput};
pub use title::clean_title;
