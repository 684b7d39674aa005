pub mod pool;

pub use pool::{TxPool, TxPoolError};
