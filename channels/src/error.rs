use thiserror::Error;

use crate::types::ChannelIndex;

/// Pool failures are invariant violations, never runtime conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("a loss system needs at least one channel")]
    NoChannels,

    #[error("{0} is out of range for a pool of {1} channels")]
    OutOfRange(ChannelIndex, usize),

    #[error("{0} released while not busy")]
    SlotNotBusy(ChannelIndex),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("dispatcher must be created inside a tokio runtime")]
    NoRuntime,

    #[error("service task failed: {0}")]
    ServiceTask(String),
}
