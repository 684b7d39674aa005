//! Timing primitives: block heights, soft deadlines, oracle prices.

pub mod blocks;
pub mod deadline;
pub mod prices;

pub use blocks::BlockWaiter;
pub use deadline::{with_soft_deadline, IterationHealth};
pub use prices::{NextPriceUpdate, PriceListener, PriceSynchronizer};
