//! Result codes
//!
//! Every fallible operation in the stack reports one of these codes.
//! Hardware and runtime failures are converted at the driver boundary
//! and propagated unchanged from there.

/// Flat result code enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Required object or driver is missing
    NullPointer,
    /// Parameter out of range or inconsistent
    BadParameter,
    /// Item is not in the state the operation expects
    InvalidItem,
    /// Operation not supported by this implementation
    NotImplemented,
    /// Stored data failed its checksum
    BadChecksum,
    /// Resource is in use, try again later
    Busy,
    /// Fixed capacity exhausted
    Overflow,
    /// Operation cannot be executed in the current state
    CannotExecute,
    /// Task queue is full
    QueueWrite,
    /// Task queue is empty
    QueueRead,
    /// Timer could not be started
    TimerStart,
    /// Mutex could not be taken in time
    MutexLock,
    /// Semaphore wait timed out
    SemaphoreTake,
    /// Generic peripheral bus failure
    Bus,
    /// Peripheral bus is busy
    BusBusy,
    /// Peripheral bus transfer timed out
    BusTimeout,
    /// Peripheral bus reported an unknown condition
    BusUnknown,
}

/// Result type used across the stack
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Check if the error came from a peripheral bus
    pub const fn is_bus_error(&self) -> bool {
        matches!(
            self,
            Error::Bus | Error::BusBusy | Error::BusTimeout | Error::BusUnknown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_error_classification() {
        assert!(Error::BusTimeout.is_bus_error());
        assert!(Error::Bus.is_bus_error());
        assert!(!Error::Overflow.is_bus_error());
        assert!(!Error::MutexLock.is_bus_error());
    }
}
