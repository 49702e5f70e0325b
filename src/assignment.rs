use crate::assigned::{AssignedExam, AssignedQuestion, AssignedSection};
use crate::chooser::{ChoiceContext, Chooser};
use crate::error::{GenerationError, NodeKind};
use crate::generator::GeneratorOptions;
use crate::models::{ExamSpecification, SectionSpecification, StudentInfo};
use crate::randomizer::{Randomizer, SelectionMode};
use crate::skin::{composite, Skin};
use crate::uuids::{create_student_uuid, UuidOptions};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub struct AssignmentBuilder<'a> {
    exam: &'a Arc<ExamSpecification>,
    student: Arc<StudentInfo>,
    options: &'a GeneratorOptions,
    uuids: &'a UuidOptions,
    choice_seed: String,
    skin_seed: String,
    occurrences: HashMap<String, usize>,
    emitted: HashSet<String>,
}

impl<'a> AssignmentBuilder<'a> {
    pub fn new(
        exam: &'a Arc<ExamSpecification>,
        student: Arc<StudentInfo>,
        options: &'a GeneratorOptions,
        uuids: &'a UuidOptions,
    ) -> Self {
        let skin_seed = format!("{}-{}", student.uniqname, exam.exam_id);
        let choice_seed = if options.consistent_randomization {
            exam.exam_id.clone()
        } else {
            skin_seed.clone()
        };
        Self {
            exam,
            student,
            options,
            uuids,
            choice_seed,
            skin_seed,
            occurrences: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    fn mode(&self) -> SelectionMode {
        if self.options.choose_all {
            SelectionMode::ChooseAll
        } else {
            SelectionMode::Seeded
        }
    }

    fn select<T: Clone>(
        &self,
        chooser: &Chooser<T>,
        seed: String,
        slot: impl FnOnce() -> String,
    ) -> Result<Vec<T>, GenerationError> {
        let mut rand = Randomizer::new(self.mode(), &seed);
        let ctx = ChoiceContext {
            exam: self.exam,
            student: &self.student,
        };
        chooser
            .choose(&ctx, &mut rand)
            .map_err(|source| GenerationError::Selection {
                uniqname: self.student.uniqname.clone(),
                slot: slot(),
                source,
            })
    }

    fn select_skins(
        &self,
        chooser: &Chooser<Arc<Skin>>,
        seed: String,
        slot: impl Fn() -> String,
    ) -> Result<Vec<Arc<Skin>>, GenerationError> {
        let skins = self.select(chooser, seed, &slot)?;
        if skins.is_empty() || (skins.len() > 1 && !self.options.allow_duplicates) {
            return Err(GenerationError::SkinCount {
                uniqname: self.student.uniqname.clone(),
                slot: slot(),
                count: skins.len(),
            });
        }
        Ok(skins)
    }

    /// `<id>` for the first occurrence inside this exam, `<id>-<n>` after,
    /// skipping any suffixed form another node already holds.
    fn occurrence_id(&mut self, base: String) -> String {
        let seen = self.occurrences.entry(base.clone()).or_insert(0);
        loop {
            *seen += 1;
            let id = if *seen == 1 {
                base.clone()
            } else {
                format!("{base}-{seen}")
            };
            if self.emitted.insert(id.clone()) {
                return id;
            }
        }
    }

    fn uuid_for(&self, id: &str) -> String {
        create_student_uuid(self.uuids, &self.student, id)
    }

    pub fn build(mut self) -> Result<AssignedExam, GenerationError> {
        let exam_id = self.exam.exam_id.clone();

        let mut sections: Vec<Arc<SectionSpecification>> = Vec::new();
        for (i, chooser) in self.exam.sections.iter().enumerate() {
            let seed = format!("{}_sections_{i}", self.choice_seed);
            sections.extend(self.select(chooser, seed, || format!("sections[{i}]"))?);
        }
        self.reject_duplicates(
            NodeKind::Section,
            sections.iter().map(|s| s.section_id.as_str()),
        )?;

        let mut assigned_sections = Vec::new();
        for section in &sections {
            let skin_seed = format!("{}_{}_skin", self.skin_seed, section.section_id);
            let section_skins = self.select_skins(&section.skin, skin_seed, || {
                format!("skin of section `{}`", section.section_id)
            })?;

            let mut questions = Vec::new();
            for (i, chooser) in section.questions.iter().enumerate() {
                let seed = format!("{}_{}_questions_{i}", self.choice_seed, section.section_id);
                questions.extend(self.select(chooser, seed, || {
                    format!("questions[{i}] of section `{}`", section.section_id)
                })?);
            }

            for section_skin in section_skins {
                let section_index = assigned_sections.len();
                let mut assigned_questions = Vec::new();
                for question in &questions {
                    let seed = format!(
                        "{}_{}_{}_skin",
                        self.skin_seed, section.section_id, question.question_id
                    );
                    let question_skins = self.select_skins(&question.skin, seed, || {
                        format!(
                            "skin of question `{}` in section `{}`",
                            question.question_id, section.section_id
                        )
                    })?;
                    for question_skin in question_skins {
                        let skin = composite(&section_skin, &question_skin).map_err(|source| {
                            GenerationError::SkinConflict {
                                uniqname: self.student.uniqname.clone(),
                                section_id: section.section_id.clone(),
                                question_id: question.question_id.clone(),
                                source,
                            }
                        })?;
                        let id = self.occurrence_id(format!(
                            "{exam_id}-{}-{}",
                            section.section_id, question.question_id
                        ));
                        assigned_questions.push(AssignedQuestion::new(
                            self.uuid_for(&id),
                            Arc::clone(self.exam),
                            Arc::clone(&self.student),
                            Arc::clone(question),
                            skin,
                            section_index,
                            assigned_questions.len(),
                        ));
                    }
                }
                self.reject_duplicates(
                    NodeKind::Question,
                    assigned_sections
                        .iter()
                        .flat_map(|s: &AssignedSection| s.questions())
                        .chain(assigned_questions.iter())
                        .map(|q| q.question_id()),
                )?;

                let id = self.occurrence_id(format!("{exam_id}-{}", section.section_id));
                assigned_sections.push(AssignedSection::new(
                    self.uuid_for(&id),
                    Arc::clone(section),
                    section_index,
                    section_skin,
                    assigned_questions,
                ));
            }
        }

        let exam = AssignedExam::new(
            self.uuid_for(&exam_id),
            Arc::clone(self.exam),
            Arc::clone(&self.student),
            assigned_sections,
            self.options.allow_duplicates,
        );
        debug!(
            student = %self.student.uniqname,
            uuid = exam.uuid(),
            sections = exam.sections().len(),
            questions = exam.questions().count(),
            points = exam.points_possible(),
            "exam assigned"
        );
        Ok(exam)
    }

    fn reject_duplicates<'i>(
        &self,
        kind: NodeKind,
        ids: impl Iterator<Item = &'i str>,
    ) -> Result<(), GenerationError> {
        if self.options.allow_duplicates {
            return Ok(());
        }
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                return Err(GenerationError::DuplicateAssignment {
                    uniqname: self.student.uniqname.clone(),
                    kind,
                    id: id.to_string(),
                });
            }
        }
        Ok(())
    }
}
