//! Stage descriptors and stage plans.
//!
//! A stage is one declared, timed step of a simulated process: a label, an
//! offset from run start, and the message delivered when the offset elapses.
//! A [`StagePlan`] is the ordered stage list for one run kind.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::enums::RunKind;
use crate::errors::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub label: String,
    /// Milliseconds after run start at which `message` is delivered.
    pub offset_ms: u64,
    pub message: String,
}

impl Stage {
    pub fn new(label: impl Into<String>, offset_ms: u64, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            offset_ms,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }
}

/// Ordered stages for one run kind.
///
/// Declaration order is preserved as given. [`StagePlan::ordered`] yields the
/// delivery order: ascending offset, ties kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    pub kind: RunKind,
    pub stages: Vec<Stage>,
}

impl StagePlan {
    /// Build a plan, rejecting stages with empty labels.
    pub fn new(kind: RunKind, stages: Vec<Stage>) -> Result<Self, CoreError> {
        if let Some(index) = stages.iter().position(|s| s.label.trim().is_empty()) {
            return Err(CoreError::Validation(format!(
                "{kind} stage #{index} has an empty label"
            )));
        }
        Ok(Self { kind, stages })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages in delivery order. `sort_by_key` is stable, so equal offsets
    /// keep their declaration order.
    #[must_use]
    pub fn ordered(&self) -> Vec<Stage> {
        let mut stages = self.stages.clone();
        stages.sort_by_key(|stage| stage.offset_ms);
        stages
    }

    /// Offset of the last delivery, i.e. the nominal run duration.
    #[must_use]
    pub fn span(&self) -> Duration {
        self.stages
            .iter()
            .map(Stage::offset)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Copy of this plan with every offset multiplied by `factor`.
    ///
    /// `factor` must be finite and non-negative.
    pub fn scaled(&self, factor: f64) -> Result<Self, CoreError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(CoreError::Validation(format!(
                "time scale must be a finite, non-negative number (got {factor})"
            )));
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let stages = self
            .stages
            .iter()
            .map(|stage| Stage {
                offset_ms: (stage.offset_ms as f64 * factor).round() as u64,
                ..stage.clone()
            })
            .collect();
        Ok(Self {
            kind: self.kind,
            stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(stages: &[Stage]) -> Vec<&str> {
        stages.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn ordered_sorts_by_offset() {
        let plan = StagePlan::new(
            RunKind::Build,
            vec![
                Stage::new("c", 300, "third"),
                Stage::new("a", 100, "first"),
                Stage::new("b", 200, "second"),
            ],
        )
        .unwrap();
        assert_eq!(labels(&plan.ordered()), vec!["a", "b", "c"]);
    }

    #[test]
    fn ordered_keeps_declaration_order_on_ties() {
        let plan = StagePlan::new(
            RunKind::Audit,
            vec![
                Stage::new("late", 50, "x"),
                Stage::new("one", 0, "1"),
                Stage::new("two", 0, "2"),
                Stage::new("three", 0, "3"),
            ],
        )
        .unwrap();
        assert_eq!(labels(&plan.ordered()), vec!["one", "two", "three", "late"]);
    }

    #[test]
    fn empty_label_is_rejected() {
        let err = StagePlan::new(RunKind::Build, vec![Stage::new(" ", 0, "x")]).unwrap_err();
        assert!(err.to_string().contains("empty label"));
    }

    #[test]
    fn scaled_multiplies_offsets() {
        let plan = StagePlan::new(
            RunKind::Build,
            vec![Stage::new("a", 500, "x"), Stage::new("b", 1500, "y")],
        )
        .unwrap();
        let half = plan.scaled(0.5).unwrap();
        assert_eq!(half.stages[0].offset_ms, 250);
        assert_eq!(half.stages[1].offset_ms, 750);
        assert_eq!(half.span(), Duration::from_millis(750));

        let instant = plan.scaled(0.0).unwrap();
        assert_eq!(instant.span(), Duration::ZERO);
    }

    #[test]
    fn scaled_rejects_negative_and_nan() {
        let plan = StagePlan::new(RunKind::Build, vec![Stage::new("a", 1, "x")]).unwrap();
        assert!(plan.scaled(-1.0).is_err());
        assert!(plan.scaled(f64::NAN).is_err());
    }
}
