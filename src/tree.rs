//! Rebuilding a test tree from a flat stream of discovery events.
//!
//! The producer announces every test with the id of its parent, parents
//! first. [`TreeBuilder`] is a [`Dispatcher`] with two handlers: one attaches
//! each discovered test under its parent, the other collects annotations.
//!
//! # Example
//!
//! ```
//! use eventwire::event::{Event, TestData, TestDiscovered};
//! use eventwire::sink::EventSink;
//! use eventwire::tree::TreeBuilder;
//!
//! let discovered = |id: &str, parent: Option<&str>| -> Event {
//!     TestDiscovered {
//!         test: TestData::new(id, id),
//!         parent_test_id: parent.map(str::to_string),
//!     }
//!     .into()
//! };
//!
//! let mut builder = TreeBuilder::new();
//! builder.publish(discovered("root", None)).unwrap();
//! builder.publish(discovered("child", Some("root"))).unwrap();
//! assert!(builder.publish(discovered("orphan", Some("nowhere"))).is_err());
//!
//! let tree = builder.into_tree();
//! assert_eq!(tree.roots(), ["root".to_string()]);
//! assert_eq!(tree.children("root"), ["child".to_string()]);
//! ```

use std::collections::HashMap;

use crate::error::{IntegrityError, Result};
use crate::event::{AnnotationData, AnnotationDiscovered, Event, TestData, TestDiscovered};
use crate::handler::Dispatcher;
use crate::sink::EventSink;

/// One integrated test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestNode {
    pub test: TestData,
    pub parent_id: Option<String>,
    children: Vec<String>,
}

impl TestNode {
    /// Ids of the direct children, in arrival order.
    pub fn children(&self) -> &[String] {
        &self.children
    }
}

/// Hierarchical model of discovered tests plus loose annotations.
#[derive(Debug, Clone, Default)]
pub struct TestTree {
    nodes: HashMap<String, TestNode>,
    /// Ids in arrival order.
    order: Vec<String>,
    roots: Vec<String>,
    annotations: Vec<AnnotationData>,
}

impl TestTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a discovered test under its parent, or as a root.
    ///
    /// An id that is already present is ignored; the first announcement wins.
    ///
    /// # Errors
    ///
    /// `MissingParent` if the parent id has not been integrated yet. The tree
    /// is left unchanged.
    pub fn integrate_test(
        &mut self,
        event: TestDiscovered,
    ) -> std::result::Result<(), IntegrityError> {
        let TestDiscovered {
            test,
            parent_test_id,
        } = event;

        if self.nodes.contains_key(&test.id) {
            tracing::debug!("Ignoring duplicate test {}", test.id);
            return Ok(());
        }

        match &parent_test_id {
            Some(parent_id) => {
                let parent = self.nodes.get_mut(parent_id).ok_or_else(|| {
                    IntegrityError::MissingParent {
                        test_id: test.id.clone(),
                        parent_id: parent_id.clone(),
                    }
                })?;
                parent.children.push(test.id.clone());
            }
            None => self.roots.push(test.id.clone()),
        }

        let id = test.id.clone();
        self.order.push(id.clone());
        self.nodes.insert(
            id,
            TestNode {
                test,
                parent_id: parent_test_id,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn add_annotation(&mut self, event: AnnotationDiscovered) {
        self.annotations.push(event.annotation);
    }

    pub fn node(&self, id: &str) -> Option<&TestNode> {
        self.nodes.get(id)
    }

    /// Ids of the parentless tests, in arrival order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Children of `id`; empty if `id` is unknown or a leaf.
    pub fn children(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: &str) -> Option<&TestNode> {
        self.nodes
            .get(id)
            .and_then(|node| node.parent_id.as_deref())
            .and_then(|parent_id| self.nodes.get(parent_id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in the order they were integrated.
    pub fn iter(&self) -> impl Iterator<Item = &TestNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn annotations(&self) -> &[AnnotationData] {
        &self.annotations
    }
}

/// Sink that rebuilds a [`TestTree`] from discovery events.
///
/// Every other event variant is ignored.
pub struct TreeBuilder {
    dispatcher: Dispatcher<TestTree>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let dispatcher = Dispatcher::with_context(TestTree::new())
            .handle(|tree: &mut TestTree, event: TestDiscovered| {
                tree.integrate_test(event)?;
                Ok(())
            })
            .handle(|tree: &mut TestTree, event: AnnotationDiscovered| {
                tree.add_annotation(event);
                Ok(())
            });

        Self { dispatcher }
    }

    /// The tree built so far.
    pub fn tree(&self) -> &TestTree {
        self.dispatcher.context()
    }

    pub fn into_tree(self) -> TestTree {
        self.dispatcher.into_context()
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for TreeBuilder {
    fn publish(&mut self, event: Event) -> Result<()> {
        self.dispatcher.publish(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::event::{AnnotationKind, TestOutcome, TestResult, TestStepFinished};

    fn discovered(id: &str, parent: Option<&str>) -> Event {
        TestDiscovered {
            test: TestData::new(id, format!("Test {}", id)),
            parent_test_id: parent.map(str::to_string),
        }
        .into()
    }

    #[test]
    fn test_root_then_children() {
        let mut builder = TreeBuilder::new();
        builder.publish(discovered("root", None)).unwrap();
        builder.publish(discovered("a", Some("root"))).unwrap();
        builder.publish(discovered("b", Some("root"))).unwrap();
        builder.publish(discovered("a1", Some("a"))).unwrap();

        let tree = builder.into_tree();

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots(), ["root".to_string()]);
        assert_eq!(tree.children("root"), ["a".to_string(), "b".to_string()]);
        assert_eq!(tree.children("a"), ["a1".to_string()]);
        assert!(tree.children("b").is_empty());
        assert_eq!(tree.parent("a1").unwrap().test.id, "a");
        assert!(tree.parent("root").is_none());
    }

    #[test]
    fn test_missing_parent_only_fails_offender() {
        let mut builder = TreeBuilder::new();

        assert!(builder.publish(discovered("root", None)).is_ok());
        assert!(builder.publish(discovered("child", Some("root"))).is_ok());

        let err = builder
            .publish(discovered("orphan", Some("ghost")))
            .unwrap_err();
        match err {
            RelayError::Integrity(IntegrityError::MissingParent { test_id, parent_id }) => {
                assert_eq!(test_id, "orphan");
                assert_eq!(parent_id, "ghost");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let tree = builder.tree();
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains("orphan"));
        assert_eq!(tree.children("root"), ["child".to_string()]);
        assert_eq!(tree.node("child").unwrap().parent_id.as_deref(), Some("root"));
    }

    #[test]
    fn test_child_before_parent_is_rejected() {
        let mut tree = TestTree::new();
        let child = TestDiscovered {
            test: TestData::new("child", "Child"),
            parent_test_id: Some("root".to_string()),
        };

        assert!(tree.integrate_test(child).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_duplicate_id_first_wins() {
        let mut builder = TreeBuilder::new();
        builder.publish(discovered("root", None)).unwrap();
        builder.publish(discovered("other", None)).unwrap();
        builder.publish(discovered("x", Some("root"))).unwrap();
        builder.publish(discovered("x", Some("other"))).unwrap();

        let tree = builder.tree();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children("root"), ["x".to_string()]);
        assert!(tree.children("other").is_empty());
    }

    #[test]
    fn test_multiple_roots() {
        let mut builder = TreeBuilder::new();
        builder.publish(discovered("r1", None)).unwrap();
        builder.publish(discovered("r2", None)).unwrap();

        assert_eq!(
            builder.tree().roots(),
            ["r1".to_string(), "r2".to_string()]
        );
    }

    #[test]
    fn test_annotations_collected_without_ordering() {
        let mut builder = TreeBuilder::new();
        let note = |message: &str| -> Event {
            AnnotationDiscovered {
                annotation: AnnotationData::new(AnnotationKind::Error, message),
            }
            .into()
        };

        builder.publish(note("before any test")).unwrap();
        builder.publish(discovered("root", None)).unwrap();
        builder.publish(note("after")).unwrap();

        let tree = builder.into_tree();
        let messages: Vec<_> = tree.annotations().iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["before any test", "after"]);
    }

    #[test]
    fn test_other_variants_ignored() {
        let mut builder = TreeBuilder::new();
        let finished: Event = TestStepFinished {
            step_id: "s1".to_string(),
            result: TestResult {
                outcome: TestOutcome::Passed,
                assert_count: 1,
                duration_secs: 0.1,
            },
        }
        .into();

        assert!(builder.publish(finished).is_ok());
        assert!(builder.tree().is_empty());
    }

    #[test]
    fn test_iter_in_arrival_order() {
        let mut builder = TreeBuilder::new();
        builder.publish(discovered("root", None)).unwrap();
        builder.publish(discovered("z", Some("root"))).unwrap();
        builder.publish(discovered("a", Some("root"))).unwrap();

        let ids: Vec<_> = builder.tree().iter().map(|n| n.test.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "z", "a"]);
    }
}
