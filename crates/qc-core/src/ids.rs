//! Run identifiers.
//!
//! Run ids are `run-` followed by a zero-padded sequence number issued by the
//! controller that created the run. They are only unique within one
//! controller.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PREFIX_RUN: &str = "run";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX_RUN}-{:04}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_and_padded() {
        assert_eq!(RunId::new(7).to_string(), "run-0007");
        assert_eq!(RunId::new(12345).to_string(), "run-12345");
    }
}
