//! Event payloads carried over the wire.
//!
//! [`Event`] is a closed set of variants. Each variant wraps its own
//! payload struct so a [`Dispatcher`](crate::handler::Dispatcher) can route
//! by type:
//!
//! ```
//! use eventwire::event::{Event, TestData, TestDiscovered};
//!
//! let event: Event = TestDiscovered {
//!     test: TestData::new("root", "Root"),
//!     parent_test_id: None,
//! }
//! .into();
//!
//! assert!(event.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fieldless tag identifying an [`Event`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TestDiscovered,
    AnnotationDiscovered,
    TestStepStarted,
    TestStepFinished,
}

/// A unit of application data relayed between endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    TestDiscovered(TestDiscovered),
    AnnotationDiscovered(AnnotationDiscovered),
    TestStepStarted(TestStepStarted),
    TestStepFinished(TestStepFinished),
}

impl Event {
    /// Get the variant tag.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TestDiscovered(_) => EventKind::TestDiscovered,
            Event::AnnotationDiscovered(_) => EventKind::AnnotationDiscovered,
            Event::TestStepStarted(_) => EventKind::TestStepStarted,
            Event::TestStepFinished(_) => EventKind::TestStepFinished,
        }
    }

    /// Check the event's invariants.
    ///
    /// Sinks call this before any I/O so bad events are caught where they
    /// are produced rather than on the far side of the connection.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Event::TestDiscovered(e) => e.validate(),
            Event::AnnotationDiscovered(e) => e.validate(),
            Event::TestStepStarted(e) => e.validate(),
            Event::TestStepFinished(e) => e.validate(),
        }
    }
}

/// A payload type that is exactly one [`Event`] variant.
pub trait Variant: Into<Event> + Sized {
    /// Tag of the variant this type wraps.
    const KIND: EventKind;

    /// Unwrap the payload if `event` is this variant.
    fn from_event(event: Event) -> Option<Self>;
}

macro_rules! impl_variant {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Event {
                fn from(value: $ty) -> Self {
                    Event::$ty(value)
                }
            }

            impl Variant for $ty {
                const KIND: EventKind = EventKind::$ty;

                fn from_event(event: Event) -> Option<Self> {
                    match event {
                        Event::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_variant!(
    TestDiscovered,
    AnnotationDiscovered,
    TestStepStarted,
    TestStepFinished
);

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

// ============================================================================
// Exploration
// ============================================================================

/// Description of a discovered test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestData {
    pub id: String,
    pub name: String,
    /// Free-form kind, e.g. "Fixture" or "Test".
    #[serde(default)]
    pub kind: Option<String>,
    /// Source location or type name the test was discovered from.
    #[serde(default)]
    pub code_reference: Option<String>,
}

impl TestData {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: None,
            code_reference: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_code_reference(mut self, reference: impl Into<String>) -> Self {
        self.code_reference = Some(reference.into());
        self
    }
}

/// A test was found. Parents are always announced before their children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDiscovered {
    pub test: TestData,
    /// `None` for the root of a tree.
    pub parent_test_id: Option<String>,
}

impl TestDiscovered {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.test.id, "test.id")?;
        require(&self.test.name, "test.name")?;

        if let Some(parent) = &self.parent_test_id {
            require(parent, "parent_test_id")?;
            if *parent == self.test.id {
                return Err(ValidationError::Inconsistent(format!(
                    "test `{}` cannot be its own parent",
                    self.test.id
                )));
            }
        }
        Ok(())
    }
}

/// Severity of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Info,
    Warning,
    Error,
}

/// A diagnostic attached to the exploration, not to a specific node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationData {
    pub kind: AnnotationKind,
    pub message: String,
    #[serde(default)]
    pub code_reference: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl AnnotationData {
    pub fn new(kind: AnnotationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code_reference: None,
            details: None,
        }
    }
}

/// An annotation was produced during exploration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDiscovered {
    pub annotation: AnnotationData,
}

impl AnnotationDiscovered {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.annotation.message, "annotation.message")
    }
}

// ============================================================================
// Execution
// ============================================================================

/// One execution of a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStepData {
    pub id: String,
    pub test_id: String,
    pub name: String,
    #[serde(default)]
    pub parent_step_id: Option<String>,
}

/// A test step began running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStepStarted {
    pub step: TestStepData,
}

impl TestStepStarted {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.step.id, "step.id")?;
        require(&self.step.test_id, "step.test_id")?;

        if self.step.parent_step_id.as_deref() == Some(self.step.id.as_str()) {
            return Err(ValidationError::Inconsistent(format!(
                "step `{}` cannot be its own parent",
                self.step.id
            )));
        }
        Ok(())
    }
}

/// Final state of a test step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Inconclusive,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub outcome: TestOutcome,
    pub assert_count: u32,
    pub duration_secs: f64,
}

/// A test step finished running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStepFinished {
    pub step_id: String,
    pub result: TestResult,
}

impl TestStepFinished {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.step_id, "step_id")?;

        let duration = self.result.duration_secs;
        if !duration.is_finite() || duration < 0.0 {
            return Err(ValidationError::Inconsistent(format!(
                "step `{}` has invalid duration {}",
                self.step_id, duration
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(id: &str, parent: Option<&str>) -> TestDiscovered {
        TestDiscovered {
            test: TestData::new(id, format!("Test {}", id)),
            parent_test_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_kind_matches_variant() {
        let event: Event = discovered("a", None).into();
        assert_eq!(event.kind(), EventKind::TestDiscovered);

        let event: Event = AnnotationDiscovered {
            annotation: AnnotationData::new(AnnotationKind::Info, "note"),
        }
        .into();
        assert_eq!(event.kind(), EventKind::AnnotationDiscovered);
    }

    #[test]
    fn test_from_event_extracts_only_own_variant() {
        let event: Event = discovered("a", None).into();

        assert!(AnnotationDiscovered::from_event(event.clone()).is_none());
        let inner = TestDiscovered::from_event(event).unwrap();
        assert_eq!(inner.test.id, "a");
    }

    #[test]
    fn test_valid_discovery() {
        assert!(discovered("root", None).validate().is_ok());
        assert!(discovered("child", Some("root")).validate().is_ok());
    }

    #[test]
    fn test_missing_test_id() {
        let err = discovered("", None).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("test.id"));
    }

    #[test]
    fn test_blank_name_is_missing() {
        let mut event = discovered("a", None);
        event.test.name = "   ".to_string();
        assert_eq!(
            event.validate().unwrap_err(),
            ValidationError::MissingField("test.name")
        );
    }

    #[test]
    fn test_empty_parent_id() {
        let err = discovered("a", Some("")).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("parent_test_id"));
    }

    #[test]
    fn test_self_parent_is_inconsistent() {
        let err = discovered("a", Some("a")).validate().unwrap_err();
        assert!(matches!(err, ValidationError::Inconsistent(_)));
    }

    #[test]
    fn test_annotation_requires_message() {
        let event = AnnotationDiscovered {
            annotation: AnnotationData::new(AnnotationKind::Warning, ""),
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_step_started_validation() {
        let mut event = TestStepStarted {
            step: TestStepData {
                id: "s1".to_string(),
                test_id: "t1".to_string(),
                name: "Step".to_string(),
                parent_step_id: None,
            },
        };
        assert!(event.validate().is_ok());

        event.step.parent_step_id = Some("s1".to_string());
        assert!(matches!(
            event.validate(),
            Err(ValidationError::Inconsistent(_))
        ));

        event.step.parent_step_id = None;
        event.step.test_id.clear();
        assert_eq!(
            event.validate().unwrap_err(),
            ValidationError::MissingField("step.test_id")
        );
    }

    #[test]
    fn test_step_finished_rejects_bad_duration() {
        let mut event = TestStepFinished {
            step_id: "s1".to_string(),
            result: TestResult {
                outcome: TestOutcome::Passed,
                assert_count: 3,
                duration_secs: 0.25,
            },
        };
        assert!(event.validate().is_ok());

        event.result.duration_secs = -1.0;
        assert!(event.validate().is_err());

        event.result.duration_secs = f64::NAN;
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_event_validate_delegates() {
        let event: Event = discovered("", None).into();
        assert!(event.validate().is_err());
    }
}
