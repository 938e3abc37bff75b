//! Error types for the runtime
//!
//! Queue structural errors and task lifecycle errors are kept apart so a
//! caller can tell "structural bug" from "not present".

/// Ring mutation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum QueueError {
    /// Queue handle does not name a queue
    NullQueue = 1001,
    /// Element index does not name a node
    NullElem = 1002,
    /// Element is already linked into some queue
    AlreadyMember = 1003,
    /// Removal from an empty queue
    EmptyQueue = 1004,
    /// Element is not linked into this queue
    NotFound = 1005,
}

/// Result type alias for ring operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Runtime error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsError {
    // ============ Queue errors ============
    /// A ready/waiting/user queue mutation failed
    Queue(QueueError),

    // ============ Stack errors ============
    /// Stack allocation failed
    StkAlloc,
    /// Requested stack size is below the minimum or not representable
    StkSizeInvalid,

    // ============ Task errors ============
    /// Task handle is not valid for this operation
    TaskInvalid,
    /// Task does not exist
    TaskNotExist,
    /// Task has already terminated
    TaskTerminated,
    /// A task cannot wait on itself
    TaskWaitSelf,
    /// Operation is not permitted on a system task
    TaskSystem,

    // ============ Runtime state errors ============
    /// Operation is reserved to the bootstrap task
    NotBootstrap,
    /// The ready queue drained while the caller was still blocked
    Deadlock,

    // ============ Timer errors ============
    /// The preemption timer could not be armed
    TimerArm,
}

/// Result type alias for runtime operations
pub type OsResult<T> = Result<T, OsError>;

impl From<QueueError> for OsError {
    #[inline]
    fn from(err: QueueError) -> Self {
        OsError::Queue(err)
    }
}

impl OsError {
    /// True when the error reports queue corruption rather than a bad request
    #[inline]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            OsError::Queue(QueueError::AlreadyMember | QueueError::NullElem | QueueError::EmptyQueue)
        )
    }
}
