use crate::assigned::{AssignedExam, AssignedQuestion, AssignedSection};
use crate::models::{ExamSpecification, StudentInfo, ValidationIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionManifest {
    pub question_id: String,
    pub uuid: String,
    pub part_index: usize,
    pub skin_id: String,
    #[serde(rename = "pointsPossible")]
    pub points_possible: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionManifest {
    pub section_id: String,
    pub uuid: String,
    pub section_index: usize,
    pub skin_id: String,
    pub questions: Vec<QuestionManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamManifest {
    pub exam_id: String,
    pub uuid: String,
    pub student: StudentInfo,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "pointsPossible")]
    pub points_possible: f64,
    pub sections: Vec<SectionManifest>,
}

impl From<&AssignedQuestion> for QuestionManifest {
    fn from(q: &AssignedQuestion) -> Self {
        Self {
            question_id: q.question_id().to_string(),
            uuid: q.uuid().to_string(),
            part_index: q.part_index(),
            skin_id: q.skin().skin_id.clone(),
            points_possible: q.points_possible(),
        }
    }
}

impl From<&AssignedSection> for SectionManifest {
    fn from(s: &AssignedSection) -> Self {
        Self {
            section_id: s.section_id().to_string(),
            uuid: s.uuid().to_string(),
            section_index: s.section_index(),
            skin_id: s.skin().skin_id.clone(),
            questions: s.questions().iter().map(QuestionManifest::from).collect(),
        }
    }
}

impl ExamManifest {
    pub fn from_assigned(exam: &AssignedExam, timestamp: DateTime<Utc>) -> Self {
        Self {
            exam_id: exam.exam().exam_id.clone(),
            uuid: exam.uuid().to_string(),
            student: exam.student().clone(),
            timestamp,
            points_possible: exam.points_possible(),
            sections: exam.sections().iter().map(SectionManifest::from).collect(),
        }
    }

    pub fn question(&self, uuid: &str) -> Option<&QuestionManifest> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .find(|q| q.uuid == uuid)
    }

    /// Every section and question id the manifest mentions must exist in `exam`.
    pub fn check_against(&self, exam: &ExamSpecification) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        if self.exam_id != exam.exam_id {
            issues.push(ValidationIssue {
                field: "exam_id".into(),
                issue: format!("`{}` does not match exam `{}`", self.exam_id, exam.exam_id),
            });
        }

        let mut section_ids = HashSet::new();
        let mut question_ids = HashSet::new();
        for section in exam.sections.iter().flat_map(|c| c.candidates()) {
            section_ids.insert(section.section_id.as_str());
            for question in section.questions.iter().flat_map(|c| c.candidates()) {
                question_ids.insert(question.question_id.as_str());
            }
        }

        for (i, section) in self.sections.iter().enumerate() {
            if !section_ids.contains(section.section_id.as_str()) {
                issues.push(ValidationIssue {
                    field: format!("sections[{i}].section_id"),
                    issue: format!("unknown section `{}`", section.section_id),
                });
            }
            for (j, question) in section.questions.iter().enumerate() {
                if !question_ids.contains(question.question_id.as_str()) {
                    issues.push(ValidationIssue {
                        field: format!("sections[{i}].questions[{j}].question_id"),
                        issue: format!("unknown question `{}`", question.question_id),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameStrategy {
    #[default]
    Uniqname,
    Uuid,
}

impl FromStr for FilenameStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniqname" => Ok(FilenameStrategy::Uniqname),
            "uuid" => Ok(FilenameStrategy::Uuid),
            other => Err(format!(
                "unknown filename strategy `{other}` (expected uniqname or uuid)"
            )),
        }
    }
}

impl fmt::Display for FilenameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameStrategy::Uniqname => f.write_str("uniqname"),
            FilenameStrategy::Uuid => f.write_str("uuid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFilename {
    pub uniqname: String,
    pub filename_base: String,
}

impl StudentFilename {
    pub fn for_exam(exam: &AssignedExam, strategy: FilenameStrategy) -> Self {
        let uniqname = exam.student().uniqname.clone();
        let filename_base = match strategy {
            FilenameStrategy::Uniqname => format!("{}-{}", uniqname, exam.exam().exam_id),
            FilenameStrategy::Uuid => exam.uuid().to_string(),
        };
        Self {
            uniqname,
            filename_base,
        }
    }
}

pub fn filenames_csv(rows: &[StudentFilename]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chooser::Chooser;
    use crate::models::{QuestionSpecification, SectionSpecification};
    use crate::skin::Skin;
    use std::sync::Arc;

    fn manifest() -> ExamManifest {
        ExamManifest {
            exam_id: "exam".into(),
            uuid: "abc-exam".into(),
            student: StudentInfo {
                uniqname: "abc".into(),
                name: "A".into(),
            },
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            points_possible: 8.0,
            sections: vec![SectionManifest {
                section_id: "s1".into(),
                uuid: "abc-exam-s1".into(),
                section_index: 0,
                skin_id: "default".into(),
                questions: vec![QuestionManifest {
                    question_id: "q1".into(),
                    uuid: "abc-exam-s1-q1".into(),
                    part_index: 0,
                    skin_id: "default".into(),
                    points_possible: 8.0,
                }],
            }],
        }
    }

    fn exam_spec(question_id: &str) -> ExamSpecification {
        let question = Arc::new(QuestionSpecification {
            question_id: question_id.into(),
            points_possible: 8.0,
            mk_description: None,
            response: serde_json::Value::Null,
            skin: Chooser::fixed(Skin::default_skin()),
            tags: Vec::new(),
            media_dir: None,
        });
        let section = Arc::new(SectionSpecification {
            section_id: "s1".into(),
            title: "S".into(),
            mk_intro: None,
            mk_reference: None,
            questions: vec![Chooser::fixed(question)],
            skin: Chooser::fixed(Skin::default_skin()),
            media_dir: None,
        });
        ExamSpecification {
            exam_id: "exam".into(),
            title: "Exam".into(),
            mk_intro: None,
            mk_bottom_message: None,
            sections: vec![Chooser::fixed(section)],
        }
    }

    #[test]
    fn manifest_json_field_names() {
        let value = serde_json::to_value(manifest()).unwrap();
        assert_eq!(value["uuid"], "abc-exam");
        assert_eq!(value["student"]["uniqname"], "abc");
        assert_eq!(value["pointsPossible"], 8.0);
        assert_eq!(value["sections"][0]["questions"][0]["pointsPossible"], 8.0);
        assert_eq!(value["sections"][0]["questions"][0]["question_id"], "q1");
        assert!(value.get("points_possible").is_none());
    }

    #[test]
    fn lookup_question_by_uuid() {
        let m = manifest();
        assert_eq!(m.question("abc-exam-s1-q1").unwrap().question_id, "q1");
        assert!(m.question("nope").is_none());
    }

    #[test]
    fn check_against_flags_unknown_ids() {
        assert!(manifest().check_against(&exam_spec("q1")).is_ok());
        let issues = manifest().check_against(&exam_spec("q9")).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "sections[0].questions[0].question_id");
    }

    #[test]
    fn filenames_render_as_csv() {
        let csv = filenames_csv(&[
            StudentFilename {
                uniqname: "abc".into(),
                filename_base: "abc-exam".into(),
            },
            StudentFilename {
                uniqname: "o,neil".into(),
                filename_base: "x".into(),
            },
        ])
        .unwrap();
        assert_eq!(csv, "uniqname,filename_base\nabc,abc-exam\n\"o,neil\",x\n");
    }
}
