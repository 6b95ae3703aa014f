use crate::ports::{AuditEvent, AuditSink, LogLevel};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

const QUEUE_SERVICE: &str = "CallQueue";

/// Opaque label for one unit of work, e.g. a contact to call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem(String);

impl WorkItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkItem {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for WorkItem {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// FIFO of pending work items; each item is handed out once
pub struct CallQueue {
    items: VecDeque<WorkItem>,
    audit: Arc<dyn AuditSink>,
}

impl CallQueue {
    pub fn new<I, T>(items: I, audit: Arc<dyn AuditSink>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<WorkItem>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            audit,
        }
    }

    pub fn has_next(&self) -> bool {
        !self.items.is_empty()
    }

    /// Take the next item off the front of the queue
    pub fn next_call(&mut self) -> Option<WorkItem> {
        let item = self.items.pop_front()?;
        self.audit.record(&AuditEvent::new(
            LogLevel::Info,
            QUEUE_SERVICE,
            format!("Processing next contact: {item}"),
        ));
        Some(item)
    }

    pub fn push(&mut self, item: impl Into<WorkItem>) {
        self.items.push_back(item.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items not yet handed out, front first
    pub fn remaining(&self) -> Vec<WorkItem> {
        self.items.iter().cloned().collect()
    }
}

impl fmt::Debug for CallQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallQueue")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
