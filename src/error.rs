use crate::models::ValidationIssue;
use crate::randomizer::SelectionError;
use crate::skin::SkinConflict;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Section,
    Question,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Section => f.write_str("section"),
            NodeKind::Question => f.write_str("question"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid exam specification: {}", summarize(.0))]
    InvalidSpecification(Vec<ValidationIssue>),

    #[error("invalid roster: {}", summarize(.0))]
    InvalidRoster(Vec<ValidationIssue>),

    #[error("selection failed for student `{uniqname}` at {slot}: {source}")]
    Selection {
        uniqname: String,
        slot: String,
        #[source]
        source: SelectionError,
    },

    #[error("student `{uniqname}`: {slot} yielded {count} skins, expected exactly one")]
    SkinCount {
        uniqname: String,
        slot: String,
        count: usize,
    },

    #[error("student `{uniqname}`, question `{question_id}` in section `{section_id}`: {source}")]
    SkinConflict {
        uniqname: String,
        section_id: String,
        question_id: String,
        #[source]
        source: SkinConflict,
    },

    #[error("student `{uniqname}` was assigned {kind} `{id}` more than once")]
    DuplicateAssignment {
        uniqname: String,
        kind: NodeKind,
        id: String,
    },

    #[error("{kind} id `{id}` assigned to student `{uniqname}` refers to a different specification than earlier assignments of the same id")]
    SpecificationDrift {
        uniqname: String,
        kind: NodeKind,
        id: String,
    },

    #[error("student `{uniqname}` has {actual} points possible but student `{reference}` has {expected}")]
    PointTotalMismatch {
        uniqname: String,
        actual: f64,
        reference: String,
        expected: f64,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{} {}", i.field, i.issue))
        .collect::<Vec<_>>()
        .join("; ")
}
