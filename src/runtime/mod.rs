//! Long-running drivers and status reporting.

pub mod cycle_loop;
pub mod interrupt;
pub mod status;

pub use cycle_loop::{run_cycles, run_cycles_with_clock};
pub use interrupt::relay_interrupts;
pub use status::{queue_status, QueueStatus};
