//! Store-level operation status.

use serde::{Deserialize, Serialize};

/// In-flight and error state of a store.
///
/// There is one status per store, not per record. Every operation resets it
/// when it starts and overwrites it when it settles, so concurrent operations
/// may clobber each other's flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub pending: bool,
    pub last_error: Option<String>,
}

impl OperationStatus {
    /// Mark an attempt as started, discarding any previous error.
    pub fn begin(&mut self) {
        self.pending = true;
        self.last_error = None;
    }

    pub fn succeed(&mut self) {
        self.pending = false;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.pending = false;
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_clears_previous_error() {
        let mut status = OperationStatus::default();
        status.fail("Failed to fetch sweets");
        assert!(!status.pending);

        status.begin();
        assert!(status.pending);
        assert_eq!(status.last_error, None);
    }

    #[test]
    fn test_settle() {
        let mut status = OperationStatus::default();
        status.begin();
        status.succeed();
        assert_eq!(status, OperationStatus::default());

        status.begin();
        status.fail("Insufficient stock");
        assert!(!status.pending);
        assert_eq!(status.last_error.as_deref(), Some("Insufficient stock"));

        status.clear_error();
        assert_eq!(status.last_error, None);
    }
}
