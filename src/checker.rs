use crate::assigned::AssignedExam;
use crate::error::{GenerationError, NodeKind};
use crate::models::{QuestionSpecification, SectionSpecification};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct UsageEntry<T> {
    representative: Arc<T>,
    count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub sections: BTreeMap<String, usize>,
    pub questions: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct ConsistencyChecker {
    sections: HashMap<String, UsageEntry<SectionSpecification>>,
    questions: HashMap<String, UsageEntry<QuestionSpecification>>,
    reference_points: Option<(String, f64)>,
}

fn record<T>(
    table: &mut HashMap<String, UsageEntry<T>>,
    kind: NodeKind,
    id: &str,
    spec: &Arc<T>,
    uniqname: &str,
) -> Result<(), GenerationError> {
    match table.get_mut(id) {
        Some(entry) if Arc::ptr_eq(&entry.representative, spec) => {
            entry.count += 1;
            Ok(())
        }
        Some(_) => Err(GenerationError::SpecificationDrift {
            uniqname: uniqname.to_string(),
            kind,
            id: id.to_string(),
        }),
        None => {
            table.insert(
                id.to_string(),
                UsageEntry {
                    representative: Arc::clone(spec),
                    count: 1,
                },
            );
            Ok(())
        }
    }
}

impl ConsistencyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, exam: &AssignedExam) -> Result<(), GenerationError> {
        let uniqname = exam.student().uniqname.as_str();
        for section in exam.sections() {
            record(
                &mut self.sections,
                NodeKind::Section,
                section.section_id(),
                section.section(),
                uniqname,
            )?;
            for question in section.questions() {
                record(
                    &mut self.questions,
                    NodeKind::Question,
                    question.question_id(),
                    question.question(),
                    uniqname,
                )?;
            }
        }

        match &self.reference_points {
            None => {
                debug!(
                    student = uniqname,
                    points = exam.points_possible(),
                    "reference point total set"
                );
                self.reference_points = Some((uniqname.to_string(), exam.points_possible()));
            }
            Some((reference, expected)) if *expected != exam.points_possible() => {
                return Err(GenerationError::PointTotalMismatch {
                    uniqname: uniqname.to_string(),
                    actual: exam.points_possible(),
                    reference: reference.clone(),
                    expected: *expected,
                });
            }
            Some(_) => {}
        }
        Ok(())
    }

    pub fn points_possible(&self) -> Option<f64> {
        self.reference_points.as_ref().map(|(_, points)| *points)
    }

    pub fn stats(&self) -> UsageStats {
        UsageStats {
            sections: self
                .sections
                .iter()
                .map(|(id, e)| (id.clone(), e.count))
                .collect(),
            questions: self
                .questions
                .iter()
                .map(|(id, e)| (id.clone(), e.count))
                .collect(),
        }
    }
}
