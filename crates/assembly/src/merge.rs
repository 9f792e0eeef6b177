//! Override merge across the three scope levels.
//!
//! For each of the fifteen fields, independently, the most specific
//! non-empty value wins: task first, then work-group, then project.
//! Lists are taken whole from the winning level — never concatenated
//! across levels — and cloned so mutating the merged record cannot touch
//! a source record. Scalars treat whitespace-only strings as absent.
//!
//! One generic loop over [`Field::ALL`] drives both the merge and the
//! per-field provenance lookup; there is no per-field merge statement.

use serde::{Deserialize, Serialize};
use taskbrief_core::record::{ContextRecord, Field, FieldKind, SixDimensions};

/// Which scope level supplied a merged field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Task,
    WorkGroup,
    Project,
    None,
}

/// Merges three optional scope records into one six-dimension record.
pub struct ContextMerger<'a> {
    task: Option<&'a ContextRecord>,
    work_group: Option<&'a ContextRecord>,
    project: Option<&'a ContextRecord>,
}

impl<'a> ContextMerger<'a> {
    pub fn new(
        task: Option<&'a ContextRecord>,
        work_group: Option<&'a ContextRecord>,
        project: Option<&'a ContextRecord>,
    ) -> Self {
        Self {
            task,
            work_group,
            project,
        }
    }

    /// Precedence order: most specific first.
    fn levels(&self) -> [(Provenance, Option<&'a ContextRecord>); 3] {
        [
            (Provenance::Task, self.task),
            (Provenance::WorkGroup, self.work_group),
            (Provenance::Project, self.project),
        ]
    }

    /// Produce the merged record. Owned entirely by the caller; no borrow
    /// of the source records survives.
    pub fn merge(&self) -> SixDimensions {
        let mut merged = SixDimensions::default();
        for field in Field::ALL {
            match field.kind() {
                FieldKind::List => {
                    if let Some(values) = self.winning_list(field) {
                        merged.set_list(field, values.to_vec());
                    }
                }
                FieldKind::Text => {
                    if let Some(value) = self.winning_text(field) {
                        merged.set_text(field, Some(value.to_string()));
                    }
                }
                FieldKind::Timestamp => {
                    merged.deadline = self.winning_deadline();
                }
            }
        }
        merged
    }

    /// Which level a field's merged value came from. Re-runs the same
    /// precedence check the merge uses; purely diagnostic.
    pub fn provenance(&self, field: Field) -> Provenance {
        for (level, record) in self.levels() {
            if let Some(record) = record {
                if record.dimensions.is_populated(field) {
                    return level;
                }
            }
        }
        Provenance::None
    }

    fn winning_list(&self, field: Field) -> Option<&'a [String]> {
        self.levels().into_iter().find_map(|(_, record)| {
            let list = record?.dimensions.list(field);
            (!list.is_empty()).then_some(list)
        })
    }

    fn winning_text(&self, field: Field) -> Option<&'a str> {
        self.levels().into_iter().find_map(|(_, record)| {
            let text = record?.dimensions.text(field)?;
            (!text.trim().is_empty()).then_some(text)
        })
    }

    fn winning_deadline(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.levels()
            .into_iter()
            .find_map(|(_, record)| record?.dimensions.deadline)
    }
}
