//! Validation context for tracking state during a run

use std::fmt::Write as _;

/// One step in the path from the root value to the value being checked
#[derive(Debug, Clone)]
enum PathSegment {
    Field(String),
    Index(usize),
}

/// Tracks the JSON path to the value under inspection and the nested-record
/// depth of the current descent.
#[derive(Debug, Default)]
pub struct ValidationContext {
    segments: Vec<PathSegment>,
    record_depth: usize,
}

impl ValidationContext {
    /// Create a fresh context rooted at `$`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current JSON path, e.g. `$`, `$.author.id`, `$.tags[1]`
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => {
                    let _ = write!(path, ".{name}");
                }
                PathSegment::Index(index) => {
                    let _ = write!(path, "[{index}]");
                }
            }
        }
        path
    }

    /// Path of a child field of the current value, without pushing it
    #[must_use]
    pub fn child_path(&self, field: &str) -> String {
        format!("{}.{field}", self.path())
    }

    /// Descend into a named field
    pub fn push_field(&mut self, name: impl Into<String>) {
        self.segments.push(PathSegment::Field(name.into()));
    }

    /// Descend into a list element
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Step back out of the last field or element
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Current nested-record depth
    #[must_use]
    pub fn depth(&self) -> usize {
        self.record_depth
    }

    /// Enter a nested record
    pub fn enter_record(&mut self) {
        self.record_depth += 1;
    }

    /// Leave a nested record
    pub fn leave_record(&mut self) {
        self.record_depth = self.record_depth.saturating_sub(1);
    }
}
