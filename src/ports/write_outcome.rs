//! Result of a version-checked write.

/// Outcome of a conditional update keyed on the version read earlier.
///
/// Absence of the entity is reported as `Conflict` too: a record that
/// vanished between read and write is a concurrent change like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write landed; the entity now has `version`.
    Applied { version: u64 },
    /// The stored version no longer matched.
    Conflict,
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}
