//! Concurrency primitives for independently scheduled execution units.
//!
//! Execution units (see [`unit`]) never share ambient state. Everything they
//! coordinate through is created up front and handed to them explicitly:
//!
//! * [`SharedRegister`]: a lock-protected integer cell.
//! * [`SharedSequence`]: a fixed-length sequence whose slots are read and
//!   written without a lock.
//! * [`channel`]: ordered two-endpoint message transport with an explicit
//!   end-of-stream sentinel.
//! * [`WorkQueue`]: an unbounded multi-producer FIFO queue.
//! * [`WorkerPool`]: `N` long-lived units that map a function over a batch of
//!   arguments and hand the results back in submission order.
//!
//! # Examples
//!
//! ```
//! use procsync::{unit, SharedRegister};
//!
//! let balance = SharedRegister::new(10_000);
//!
//! let deposits = {
//!     let balance = balance.clone();
//!     unit::spawn("deposit", move || (0..500).for_each(|_| balance.apply(10)))
//! };
//! let withdrawals = {
//!     let balance = balance.clone();
//!     unit::spawn("withdraw", move || (0..500).for_each(|_| balance.apply(-5)))
//! };
//!
//! deposits.join().unwrap();
//! withdrawals.join().unwrap();
//! assert_eq!(balance.read(), 12_500);
//! ```
pub mod channel;
pub mod error;
pub mod pool;
pub mod queue;
pub mod register;
pub mod sequence;
pub(crate) mod sync;
pub mod unit;

pub use error::{Error, Result};
pub use pool::{Batch, PoolConfig, PoolState, WorkerPool};
pub use queue::WorkQueue;
pub use register::{Register, SharedRegister};
pub use sequence::{Element, ElementType, SharedSequence};
