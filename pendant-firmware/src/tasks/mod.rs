//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! [`crate::channels`].

pub mod pendant;
pub mod persist;
pub mod serial_rx;
pub mod serial_tx;
pub mod wheel;

pub use pendant::{pendant_task, Display, Renderer};
pub use persist::persist_task;
pub use serial_rx::serial_rx_task;
pub use serial_tx::serial_tx_task;
pub use wheel::wheel_task;
