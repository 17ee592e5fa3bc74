//! Grip loads and load histories

mod grip_load;
mod load_history;

pub use grip_load::GripLoad;
pub use load_history::LoadHistory;
