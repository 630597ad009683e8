//! NAV history: validated per-fund series and holiday-safe date resolution

mod series;
pub mod loader;
pub mod synthetic;

pub use series::{NavHistory, NavPoint, NavSeries};
pub use loader::{load_nav_history, load_nav_history_from_reader};
