pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod stats;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, PoolError};
pub use pool::ChannelPool;
pub use stats::{Counters, Empirical, Snapshot};
pub use types::{Admission, ChannelIndex, RequestId};
