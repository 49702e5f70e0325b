use crate::assigned::AssignedExam;
use crate::assignment::AssignmentBuilder;
use crate::checker::{ConsistencyChecker, UsageStats};
use crate::error::GenerationError;
use crate::manifest::{ExamManifest, FilenameStrategy, StudentFilename};
use crate::models::{validate_exam, validate_roster, ExamSpecification, StudentInfo, ValidationIssue};
use crate::uuids::{UuidOptions, UuidStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    #[serde(default)]
    pub uuid_strategy: UuidStrategy,
    #[serde(default)]
    pub uuidv5_namespace: Option<String>,
    #[serde(default)]
    pub choose_all: bool,
    #[serde(default)]
    pub allow_duplicates: bool,
    #[serde(default)]
    pub consistent_randomization: bool,
    #[serde(default)]
    pub filenames: FilenameStrategy,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub exams: Vec<AssignedExam>,
    pub manifests: Vec<ExamManifest>,
    pub stats: UsageStats,
    pub filenames: Vec<StudentFilename>,
}

pub struct ExamGenerator {
    exam: Arc<ExamSpecification>,
    options: GeneratorOptions,
    uuids: UuidOptions,
    checker: ConsistencyChecker,
    assigned: Vec<AssignedExam>,
    uniqnames: HashSet<String>,
}

impl ExamGenerator {
    pub fn new(exam: Arc<ExamSpecification>, options: GeneratorOptions) -> Result<Self, GenerationError> {
        let uuids = UuidOptions::new(options.uuid_strategy, options.uuidv5_namespace.as_deref())?;
        validate_exam(&exam).map_err(GenerationError::InvalidSpecification)?;
        if !uuids.is_reproducible() {
            warn!(
                exam = %exam.exam_id,
                "uuidv4 strategy selected; uuids will differ between runs"
            );
        }
        Ok(Self {
            exam,
            options,
            uuids,
            checker: ConsistencyChecker::new(),
            assigned: Vec::new(),
            uniqnames: HashSet::new(),
        })
    }

    pub fn exam(&self) -> &Arc<ExamSpecification> {
        &self.exam
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn assign_exam(&mut self, student: &StudentInfo) -> Result<&AssignedExam, GenerationError> {
        validate_roster(std::slice::from_ref(student)).map_err(GenerationError::InvalidRoster)?;
        if self.uniqnames.contains(&student.uniqname) {
            return Err(GenerationError::InvalidRoster(vec![ValidationIssue {
                field: "uniqname".into(),
                issue: format!("`{}` already has an assigned exam", student.uniqname),
            }]));
        }
        let builder = AssignmentBuilder::new(
            &self.exam,
            Arc::new(student.clone()),
            &self.options,
            &self.uuids,
        );
        let exam = builder.build()?;
        self.checker.check(&exam)?;
        self.uniqnames.insert(student.uniqname.clone());
        self.assigned.push(exam);
        Ok(&self.assigned[self.assigned.len() - 1])
    }

    pub fn assign_exams(&mut self, roster: &[StudentInfo]) -> Result<(), GenerationError> {
        validate_roster(roster).map_err(GenerationError::InvalidRoster)?;
        info!(
            exam = %self.exam.exam_id,
            students = roster.len(),
            uuid_strategy = %self.options.uuid_strategy,
            choose_all = self.options.choose_all,
            consistent_randomization = self.options.consistent_randomization,
            "assigning exams"
        );
        for student in roster {
            self.assign_exam(student)?;
        }
        info!(
            exam = %self.exam.exam_id,
            students = self.assigned.len(),
            points = self.checker.points_possible().unwrap_or_default(),
            "all exams assigned and checked"
        );
        Ok(())
    }

    pub fn assigned_exams(&self) -> &[AssignedExam] {
        &self.assigned
    }

    pub fn stats(&self) -> UsageStats {
        self.checker.stats()
    }

    pub fn finish(self, timestamp: DateTime<Utc>) -> GenerationOutput {
        let manifests = self
            .assigned
            .iter()
            .map(|exam| ExamManifest::from_assigned(exam, timestamp))
            .collect();
        let filenames = self
            .assigned
            .iter()
            .map(|exam| StudentFilename::for_exam(exam, self.options.filenames))
            .collect();
        GenerationOutput {
            stats: self.checker.stats(),
            exams: self.assigned,
            manifests,
            filenames,
        }
    }
}

pub fn generate(
    exam: Arc<ExamSpecification>,
    roster: &[StudentInfo],
    options: GeneratorOptions,
) -> Result<GenerationOutput, GenerationError> {
    let mut generator = ExamGenerator::new(exam, options)?;
    generator.assign_exams(roster)?;
    Ok(generator.finish(Utc::now()))
}
