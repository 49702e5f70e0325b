use crate::error::GenerationError;
use crate::models::{
    validate_roster, ExamSpecification, QuestionSpecification, SectionSpecification, StudentInfo,
    ValidationIssue,
};
use crate::skin::Skin;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const SERIALIZED_REGEX_KEY: &str = "__serialized_regex";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedRegex {
    pub source: String,
    #[serde(default)]
    pub flags: String,
}

impl SerializedRegex {
    pub fn from_value(value: &Value) -> Option<Result<Self, serde_json::Error>> {
        let inner = value.as_object()?.get(SERIALIZED_REGEX_KEY)?;
        Some(serde_json::from_value(inner.clone()))
    }

    pub fn compile(&self) -> Result<Regex, String> {
        let mut builder = RegexBuilder::new(&self.source);
        for flag in self.flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                // matching-state flags with no meaning for a compiled pattern
                'g' | 'y' | 'u' => {}
                other => return Err(format!("unsupported regex flag `{other}`")),
            }
        }
        builder.build().map_err(|err| err.to_string())
    }
}

fn check_regexes(value: &Value, field: &str, issues: &mut Vec<ValidationIssue>) {
    if let Some(decoded) = SerializedRegex::from_value(value) {
        let outcome = decoded
            .map_err(|err| err.to_string())
            .and_then(|re| re.compile().map(|_| ()));
        if let Err(issue) = outcome {
            issues.push(ValidationIssue {
                field: field.to_string(),
                issue,
            });
        }
        return;
    }
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                check_regexes(item, &format!("{field}[{i}]"), issues);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                check_regexes(item, &format!("{field}.{key}"), issues);
            }
        }
        _ => {}
    }
}

// equal nodes sharing an id collapse to one Arc; differing ones stay distinct
#[derive(Default)]
struct Interner {
    sections: HashMap<String, Vec<Arc<SectionSpecification>>>,
    questions: HashMap<String, Vec<Arc<QuestionSpecification>>>,
    skins: HashMap<String, Vec<Arc<Skin>>>,
}

fn intern<T: PartialEq>(table: &mut HashMap<String, Vec<Arc<T>>>, id: String, value: T) -> Arc<T> {
    let bucket = table.entry(id).or_default();
    if let Some(existing) = bucket.iter().find(|e| ***e == value) {
        return Arc::clone(existing);
    }
    let shared = Arc::new(value);
    bucket.push(Arc::clone(&shared));
    shared
}

impl Interner {
    fn skin(&mut self, skin: Arc<Skin>) -> Arc<Skin> {
        if skin.is_default() {
            return Skin::default_skin();
        }
        let skin = Arc::unwrap_or_clone(skin);
        intern(&mut self.skins, skin.skin_id.clone(), skin)
    }

    fn question(&mut self, question: Arc<QuestionSpecification>) -> Arc<QuestionSpecification> {
        let mut question = Arc::unwrap_or_clone(question);
        question.skin = question.skin.map(|s| self.skin(s));
        intern(&mut self.questions, question.question_id.clone(), question)
    }

    fn section(&mut self, section: Arc<SectionSpecification>) -> Arc<SectionSpecification> {
        let mut section = Arc::unwrap_or_clone(section);
        section.skin = section.skin.map(|s| self.skin(s));
        section.questions = section
            .questions
            .into_iter()
            .map(|chooser| chooser.map(|q| self.question(q)))
            .collect();
        intern(&mut self.sections, section.section_id.clone(), section)
    }

    fn exam(&mut self, mut exam: ExamSpecification) -> ExamSpecification {
        exam.sections = exam
            .sections
            .into_iter()
            .map(|chooser| chooser.map(|s| self.section(s)))
            .collect();
        exam
    }
}

pub fn parse_exam(raw: &str) -> Result<Arc<ExamSpecification>> {
    let exam: ExamSpecification = serde_json::from_str(raw).context("exam specification is not valid JSON")?;
    let exam = Interner::default().exam(exam);

    let mut issues = Vec::new();
    for (i, chooser) in exam.sections.iter().enumerate() {
        for section in chooser.candidates() {
            for question in section.questions.iter().flat_map(|c| c.candidates()) {
                check_regexes(
                    &question.response,
                    &format!(
                        "sections[{i}].{}.{}.response",
                        section.section_id, question.question_id
                    ),
                    &mut issues,
                );
            }
        }
    }
    if !issues.is_empty() {
        return Err(GenerationError::InvalidSpecification(issues).into());
    }
    Ok(Arc::new(exam))
}

pub async fn load_exam(path: &Path) -> Result<Arc<ExamSpecification>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read exam specification {}", path.display()))?;
    let exam = parse_exam(&raw).with_context(|| format!("failed to load {}", path.display()))?;
    info!(exam = %exam.exam_id, path = %path.display(), "exam specification loaded");
    Ok(exam)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    uniqname: String,
    name: String,
}

/// Extra columns are ignored.
pub fn parse_roster(raw: &str) -> Result<Vec<StudentInfo>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let mut students = Vec::new();
    for (i, row) in reader.deserialize::<RosterRow>().enumerate() {
        // +2: one-based, after the header
        let row = row.with_context(|| format!("malformed roster row {}", i + 2))?;
        students.push(StudentInfo {
            uniqname: row.uniqname,
            name: row.name,
        });
    }
    validate_roster(&students).map_err(GenerationError::InvalidRoster)?;
    Ok(students)
}

pub async fn load_roster(path: &Path) -> Result<Vec<StudentInfo>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    let students = parse_roster(&raw).with_context(|| format!("failed to load {}", path.display()))?;
    info!(path = %path.display(), students = students.len(), "roster loaded");
    Ok(students)
}
