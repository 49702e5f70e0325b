use crate::models::{ExamSpecification, QuestionSpecification, SectionSpecification, StudentInfo};
use crate::skin::{CompositeSkin, Skin};
use std::sync::Arc;

pub type Submission = serde_json::Value;

#[derive(Debug, Clone)]
pub struct AssignedQuestion {
    uuid: String,
    exam: Arc<ExamSpecification>,
    student: Arc<StudentInfo>,
    question: Arc<QuestionSpecification>,
    skin: CompositeSkin,
    section_index: usize,
    part_index: usize,
    submission: Option<Submission>,
}

impl AssignedQuestion {
    pub fn new(
        uuid: String,
        exam: Arc<ExamSpecification>,
        student: Arc<StudentInfo>,
        question: Arc<QuestionSpecification>,
        skin: CompositeSkin,
        section_index: usize,
        part_index: usize,
    ) -> Self {
        Self {
            uuid,
            exam,
            student,
            question,
            skin,
            section_index,
            part_index,
            submission: None,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn exam(&self) -> &Arc<ExamSpecification> {
        &self.exam
    }

    pub fn student(&self) -> &StudentInfo {
        &self.student
    }

    pub fn question(&self) -> &Arc<QuestionSpecification> {
        &self.question
    }

    pub fn question_id(&self) -> &str {
        &self.question.question_id
    }

    pub fn skin(&self) -> &CompositeSkin {
        &self.skin
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn part_index(&self) -> usize {
        self.part_index
    }

    pub fn points_possible(&self) -> f64 {
        self.question.points_possible
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    pub fn attach_submission(&mut self, submission: Submission) {
        self.submission = Some(submission);
    }
}

#[derive(Debug, Clone)]
pub struct AssignedSection {
    uuid: String,
    section: Arc<SectionSpecification>,
    section_index: usize,
    skin: Arc<Skin>,
    questions: Vec<AssignedQuestion>,
}

impl AssignedSection {
    pub fn new(
        uuid: String,
        section: Arc<SectionSpecification>,
        section_index: usize,
        skin: Arc<Skin>,
        questions: Vec<AssignedQuestion>,
    ) -> Self {
        Self {
            uuid,
            section,
            section_index,
            skin,
            questions,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn section(&self) -> &Arc<SectionSpecification> {
        &self.section
    }

    pub fn section_id(&self) -> &str {
        &self.section.section_id
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn skin(&self) -> &Arc<Skin> {
        &self.skin
    }

    pub fn questions(&self) -> &[AssignedQuestion] {
        &self.questions
    }

    pub fn points_possible(&self) -> f64 {
        self.questions.iter().map(AssignedQuestion::points_possible).sum()
    }
}

#[derive(Debug, Clone)]
pub struct AssignedExam {
    uuid: String,
    exam: Arc<ExamSpecification>,
    student: Arc<StudentInfo>,
    sections: Vec<AssignedSection>,
    points_possible: f64,
    allow_duplicates: bool,
}

impl AssignedExam {
    pub fn new(
        uuid: String,
        exam: Arc<ExamSpecification>,
        student: Arc<StudentInfo>,
        sections: Vec<AssignedSection>,
        allow_duplicates: bool,
    ) -> Self {
        let points_possible = sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .map(AssignedQuestion::points_possible)
            .sum();
        Self {
            uuid,
            exam,
            student,
            sections,
            points_possible,
            allow_duplicates,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn exam(&self) -> &Arc<ExamSpecification> {
        &self.exam
    }

    pub fn student(&self) -> &StudentInfo {
        &self.student
    }

    pub fn sections(&self) -> &[AssignedSection] {
        &self.sections
    }

    pub fn points_possible(&self) -> f64 {
        self.points_possible
    }

    pub fn allow_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    pub fn questions(&self) -> impl Iterator<Item = &AssignedQuestion> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question(&self, uuid: &str) -> Option<&AssignedQuestion> {
        self.questions().find(|q| q.uuid == uuid)
    }

    pub fn question_mut(&mut self, uuid: &str) -> Option<&mut AssignedQuestion> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.questions.iter_mut())
            .find(|q| q.uuid == uuid)
    }
}
