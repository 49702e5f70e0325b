use crate::chooser::Chooser;
use crate::skin::Skin;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

pub type SkinChooser = Chooser<Arc<Skin>>;
pub type QuestionChooser = Chooser<Arc<QuestionSpecification>>;
pub type SectionChooser = Chooser<Arc<SectionSpecification>>;

fn default_skin_chooser() -> SkinChooser {
    Chooser::fixed(Skin::default_skin())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StudentInfo {
    pub uniqname: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionSpecification {
    pub question_id: String,
    #[serde(rename = "points", alias = "pointsPossible")]
    pub points_possible: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mk_description: Option<String>,
    #[serde(default)]
    pub response: serde_json::Value,
    #[serde(default = "default_skin_chooser")]
    pub skin: SkinChooser,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionSpecification {
    pub section_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mk_intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mk_reference: Option<String>,
    pub questions: Vec<QuestionChooser>,
    #[serde(default = "default_skin_chooser")]
    pub skin: SkinChooser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamSpecification {
    pub exam_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mk_intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mk_bottom_message: Option<String>,
    pub sections: Vec<SectionChooser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: issue.into(),
        }
    }
}

// uniqnames and exam ids end up in artifact file names
fn is_path_safe(id: &str) -> bool {
    !id.contains(['/', '\\']) && !id.contains("..")
}

fn candidate_field<T>(base: &str, chooser: &Chooser<T>, idx: usize) -> String {
    match chooser {
        Chooser::Fixed { .. } => format!("{base}.choice"),
        Chooser::Weighted { .. } => format!("{base}.choices[{idx}].choice"),
        _ => format!("{base}.choices[{idx}]"),
    }
}

fn validate_pool<T>(
    chooser: &Chooser<T>,
    field: &str,
    id_of: impl Fn(&T) -> &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let candidates = chooser.candidates();
    if candidates.is_empty() {
        issues.push(ValidationIssue::new(field, "must offer at least one candidate"));
    }
    match chooser {
        Chooser::Random { count: 0, .. } | Chooser::Weighted { count: 0, .. } => {
            issues.push(ValidationIssue::new(format!("{field}.count"), "must be positive"));
        }
        Chooser::Weighted { choices, .. } => {
            for (j, c) in choices.iter().enumerate() {
                if !c.weight.is_finite() || c.weight < 0.0 {
                    issues.push(ValidationIssue::new(
                        format!("{field}.choices[{j}].weight"),
                        "must be finite and non-negative",
                    ));
                }
            }
        }
        _ => {}
    }

    let mut ids = HashSet::new();
    for (j, candidate) in candidates.into_iter().enumerate() {
        let id = id_of(candidate);
        if id.trim().is_empty() {
            issues.push(ValidationIssue::new(
                candidate_field(field, chooser, j),
                "id must not be empty",
            ));
        } else if !ids.insert(id.to_string()) {
            issues.push(ValidationIssue::new(
                candidate_field(field, chooser, j),
                format!("id `{id}` must be unique within its pool"),
            ));
        }
    }
}

fn validate_skins(chooser: &SkinChooser, field: &str, issues: &mut Vec<ValidationIssue>) {
    validate_pool(chooser, field, |s| s.skin_id.as_str(), issues);
    for (j, skin) in chooser.candidates().into_iter().enumerate() {
        if skin.replacements.keys().any(|k| k.trim().is_empty()) {
            issues.push(ValidationIssue::new(
                format!("{}.replacements", candidate_field(field, chooser, j)),
                "keys must not be empty",
            ));
        }
    }
}

fn validate_question(question: &QuestionSpecification, field: &str, issues: &mut Vec<ValidationIssue>) {
    if !question.points_possible.is_finite() || question.points_possible < 0.0 {
        issues.push(ValidationIssue::new(
            format!("{field}.points"),
            "must be finite and non-negative",
        ));
    }
    validate_skins(&question.skin, &format!("{field}.skin"), issues);
}

fn validate_section(section: &SectionSpecification, field: &str, issues: &mut Vec<ValidationIssue>) {
    if section.questions.is_empty() {
        issues.push(ValidationIssue::new(
            format!("{field}.questions"),
            "must contain at least one question chooser",
        ));
    }
    validate_skins(&section.skin, &format!("{field}.skin"), issues);
    for (i, chooser) in section.questions.iter().enumerate() {
        let chooser_field = format!("{field}.questions[{i}]");
        validate_pool(chooser, &chooser_field, |q| q.question_id.as_str(), issues);
        for (j, question) in chooser.candidates().into_iter().enumerate() {
            validate_question(question, &candidate_field(&chooser_field, chooser, j), issues);
        }
    }
}

pub fn validate_exam(exam: &ExamSpecification) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if exam.exam_id.trim().is_empty() {
        issues.push(ValidationIssue::new("exam_id", "must not be empty"));
    } else if !is_path_safe(&exam.exam_id) {
        issues.push(ValidationIssue::new(
            "exam_id",
            "must not contain path separators or `..`",
        ));
    }
    if exam.title.trim().is_empty() {
        issues.push(ValidationIssue::new("title", "must not be empty"));
    }
    if exam.sections.is_empty() {
        issues.push(ValidationIssue::new(
            "sections",
            "must contain at least one section chooser",
        ));
    }
    for (i, chooser) in exam.sections.iter().enumerate() {
        let chooser_field = format!("sections[{i}]");
        validate_pool(chooser, &chooser_field, |s| s.section_id.as_str(), &mut issues);
        for (j, section) in chooser.candidates().into_iter().enumerate() {
            validate_section(section, &candidate_field(&chooser_field, chooser, j), &mut issues);
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

pub fn validate_roster(roster: &[StudentInfo]) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut uniqnames = HashSet::new();
    for (i, student) in roster.iter().enumerate() {
        if student.uniqname.trim().is_empty() {
            issues.push(ValidationIssue::new(
                format!("students[{i}].uniqname"),
                "must not be empty",
            ));
        } else if !is_path_safe(&student.uniqname) {
            issues.push(ValidationIssue::new(
                format!("students[{i}].uniqname"),
                format!("`{}` must not contain path separators or `..`", student.uniqname),
            ));
        } else if !uniqnames.insert(student.uniqname.as_str()) {
            issues.push(ValidationIssue::new(
                format!("students[{i}].uniqname"),
                format!("`{}` must be unique", student.uniqname),
            ));
        }
        if student.name.trim().is_empty() {
            issues.push(ValidationIssue::new(
                format!("students[{i}].name"),
                "must not be empty",
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chooser::WeightedCandidate;
    use std::collections::BTreeMap;

    fn question(id: &str, points: f64) -> Arc<QuestionSpecification> {
        Arc::new(QuestionSpecification {
            question_id: id.into(),
            points_possible: points,
            mk_description: Some(format!("Describe {id}")),
            response: serde_json::json!({"kind": "fitb"}),
            skin: default_skin_chooser(),
            tags: Vec::new(),
            media_dir: None,
        })
    }

    fn sample_exam() -> ExamSpecification {
        let section = Arc::new(SectionSpecification {
            section_id: "pointers".into(),
            title: "Pointers".into(),
            mk_intro: None,
            mk_reference: None,
            questions: vec![
                Chooser::fixed(question("q1", 3.0)),
                Chooser::Random {
                    count: 1,
                    choices: vec![question("q2a", 5.0), question("q2b", 5.0)],
                },
            ],
            skin: Chooser::All {
                choices: vec![Arc::new(Skin {
                    skin_id: "ptr".into(),
                    replacements: BTreeMap::from([("name".to_string(), "p".to_string())]),
                })],
            },
            media_dir: None,
        });
        ExamSpecification {
            exam_id: "eecs280_f22".into(),
            title: "Final".into(),
            mk_intro: None,
            mk_bottom_message: None,
            sections: vec![Chooser::fixed(section)],
        }
    }

    #[test]
    fn validate_exam_ok() {
        assert!(validate_exam(&sample_exam()).is_ok());
    }

    #[test]
    fn validate_exam_negative() {
        let mut exam = sample_exam();
        exam.title = " ".into();
        let mut section = (*exam.sections[0].candidates()[0].clone()).clone();
        section.questions.push(Chooser::Weighted {
            count: 1,
            choices: vec![
                WeightedCandidate { weight: 1.0, choice: question("dup", 1.0) },
                WeightedCandidate { weight: -2.0, choice: question("dup", f64::NAN) },
            ],
        });
        exam.sections[0] = Chooser::fixed(Arc::new(section));

        let issues = validate_exam(&exam).unwrap_err();
        assert!(issues.iter().any(|i| i.field == "title"));
        assert!(issues
            .iter()
            .any(|i| i.field == "sections[0].choice.questions[2].choices[1].choice"
                && i.issue.contains("unique")));
        assert!(issues
            .iter()
            .any(|i| i.field == "sections[0].choice.questions[2].choices[1].weight"));
        assert!(issues
            .iter()
            .any(|i| i.field == "sections[0].choice.questions[2].choices[1].choice.points"));
    }

    #[test]
    fn validate_roster_rejects_blank_and_duplicate_rows() {
        let roster = vec![
            StudentInfo { uniqname: "abc".into(), name: "A".into() },
            StudentInfo { uniqname: "abc".into(), name: "B".into() },
            StudentInfo { uniqname: "".into(), name: " ".into() },
        ];
        let issues = validate_roster(&roster).unwrap_err();
        assert_eq!(issues.len(), 3);
        assert!(issues[0].issue.contains("unique"));
        assert!(validate_roster(&roster[..1]).is_ok());
    }

    #[test]
    fn validate_roster_rejects_path_like_uniqnames() {
        for uniqname in ["../escape", "a/b", "a\\b", ".."] {
            let roster = vec![StudentInfo { uniqname: uniqname.into(), name: "A".into() }];
            let issues = validate_roster(&roster).unwrap_err();
            assert_eq!(issues[0].field, "students[0].uniqname");
        }
        let roster = vec![StudentInfo { uniqname: "a.b".into(), name: "A".into() }];
        assert!(validate_roster(&roster).is_ok());

        let mut exam = sample_exam();
        exam.exam_id = "../exam".into();
        assert_eq!(validate_exam(&exam).unwrap_err()[0].field, "exam_id");
    }

    #[test]
    fn question_json_uses_points_field() {
        let raw = r#"{"question_id": "q", "pointsPossible": 2.5, "response": {"kind": "mc"}}"#;
        let parsed: QuestionSpecification = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.points_possible, 2.5);
        assert!(parsed.skin.candidates()[0].is_default());
        let out = serde_json::to_value(&parsed).unwrap();
        assert_eq!(out["points"], 2.5);
    }
}
