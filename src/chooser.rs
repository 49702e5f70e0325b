use crate::models::{ExamSpecification, StudentInfo};
use crate::randomizer::{Randomizer, SelectionError};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct ChoiceContext<'a> {
    pub exam: &'a ExamSpecification,
    pub student: &'a StudentInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate<T> {
    pub weight: f64,
    pub choice: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chooser<T> {
    Fixed {
        choice: T,
    },
    All {
        choices: Vec<T>,
    },
    Random {
        count: usize,
        choices: Vec<T>,
    },
    Weighted {
        #[serde(default = "default_weighted_count")]
        count: usize,
        choices: Vec<WeightedCandidate<T>>,
    },
}

fn default_weighted_count() -> usize {
    1
}

impl<T> Chooser<T> {
    pub fn fixed(choice: T) -> Self {
        Chooser::Fixed { choice }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Chooser::Fixed { .. } => "fixed",
            Chooser::All { .. } => "all",
            Chooser::Random { .. } => "random",
            Chooser::Weighted { .. } => "weighted",
        }
    }

    pub fn candidates(&self) -> Vec<&T> {
        match self {
            Chooser::Fixed { choice } => vec![choice],
            Chooser::All { choices } | Chooser::Random { choices, .. } => choices.iter().collect(),
            Chooser::Weighted { choices, .. } => choices.iter().map(|c| &c.choice).collect(),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Chooser<U> {
        match self {
            Chooser::Fixed { choice } => Chooser::Fixed { choice: f(choice) },
            Chooser::All { choices } => Chooser::All {
                choices: choices.into_iter().map(f).collect(),
            },
            Chooser::Random { count, choices } => Chooser::Random {
                count,
                choices: choices.into_iter().map(f).collect(),
            },
            Chooser::Weighted { count, choices } => Chooser::Weighted {
                count,
                choices: choices
                    .into_iter()
                    .map(|c| WeightedCandidate {
                        weight: c.weight,
                        choice: f(c.choice),
                    })
                    .collect(),
            },
        }
    }
}

impl<T: Clone> Chooser<T> {
    pub fn choose(
        &self,
        ctx: &ChoiceContext<'_>,
        rand: &mut Randomizer,
    ) -> Result<Vec<T>, SelectionError> {
        let selected = match self {
            Chooser::Fixed { choice } => vec![choice.clone()],
            Chooser::All { choices } => rand.choose_n(choices, choices.len())?,
            Chooser::Random { count, choices } => rand.choose_n(choices, *count)?,
            Chooser::Weighted { count, choices } => {
                let pool: Vec<(T, f64)> = choices
                    .iter()
                    .map(|c| (c.choice.clone(), c.weight))
                    .collect();
                rand.choose_weighted(&pool, *count)?
            }
        };
        trace!(
            exam = %ctx.exam.exam_id,
            student = %ctx.student.uniqname,
            kind = self.kind(),
            selected = selected.len(),
            "chooser resolved"
        );
        Ok(selected)
    }
}
