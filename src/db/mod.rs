//! Database layer: driver resolution and the connection pool.

mod driver;
mod pool;

pub use driver::Driver;
pub use pool::*;
