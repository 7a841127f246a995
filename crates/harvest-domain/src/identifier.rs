//! Run-scoped identifier allocation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier attached to every record when allocation is disabled
pub const DEFAULT_ASSIGNED_ID: AssignedId = AssignedId(1);

/// External identifier given to an emitted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignedId(u64);

impl AssignedId {
    /// Create an identifier from a raw value
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssignedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run-level identifier allocation switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum IdAllocation {
    /// Allocate sequential identifiers starting at `starting_value`
    Enabled {
        /// First identifier handed out
        starting_value: u64,
    },
    /// Attach [`DEFAULT_ASSIGNED_ID`] to every record
    Disabled,
}

/// Strictly increasing identifier counter for a whole run
///
/// The counter is never reset or rolled back: identifiers consumed by a
/// domain that later fails stay consumed. Once `u64::MAX` has been handed
/// out the counter is exhausted and [`peek`](Self::peek) returns `None`.
///
/// # Examples
///
/// ```
/// use harvest_domain::{IdAllocation, IdAllocator};
///
/// let mut ids = IdAllocator::new(IdAllocation::Enabled { starting_value: 100 });
/// assert_eq!(ids.next_id().map(|id| id.value()), Some(100));
/// assert_eq!(ids.next_id().map(|id| id.value()), Some(101));
///
/// let mut disabled = IdAllocator::new(IdAllocation::Disabled);
/// assert_eq!(disabled.next_id().map(|id| id.value()), Some(1));
/// assert_eq!(disabled.next_id().map(|id| id.value()), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct IdAllocator {
    allocation: IdAllocation,
    current: Option<u64>,
    issued: u64,
}

impl IdAllocator {
    /// Initialise the counter for a run
    pub fn new(allocation: IdAllocation) -> Self {
        let current = match allocation {
            IdAllocation::Enabled { starting_value } => starting_value,
            IdAllocation::Disabled => DEFAULT_ASSIGNED_ID.value(),
        };
        Self {
            allocation,
            current: Some(current),
            issued: 0,
        }
    }

    /// Whether identifiers are distinct per record
    pub fn is_enabled(&self) -> bool {
        matches!(self.allocation, IdAllocation::Enabled { .. })
    }

    /// The identifier the next emitted record will receive
    ///
    /// `None` once the counter is exhausted.
    pub fn peek(&self) -> Option<AssignedId> {
        self.current.map(AssignedId)
    }

    /// Consume the identifier returned by [`peek`](Self::peek)
    ///
    /// Does nothing on an exhausted counter.
    pub fn advance(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        self.issued += 1;
        if self.is_enabled() {
            self.current = current.checked_add(1);
        }
    }

    /// Return the current identifier and advance the counter
    pub fn next_id(&mut self) -> Option<AssignedId> {
        let id = self.peek()?;
        self.advance();
        Some(id)
    }

    /// Number of identifiers consumed so far
    pub fn issued(&self) -> u64 {
        self.issued
    }
}
