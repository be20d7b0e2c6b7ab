mod reset_scheduler;
mod trophy_poller;

pub use reset_scheduler::start_reset_schedule;
pub use trophy_poller::start_polling;
