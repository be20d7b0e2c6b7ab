mod board;
mod delta;
mod reset;
mod service;

pub use board::{LeaderboardPage, NavAction, PageState};
pub use delta::{CounterUpdate, accumulate};
pub use reset::plan_reset;
pub use service::{Privilege, Tracker};
