use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_SKIN_ID: &str = "default";

static DEFAULT_SKIN: Lazy<Arc<Skin>> = Lazy::new(|| {
    Arc::new(Skin {
        skin_id: DEFAULT_SKIN_ID.to_string(),
        replacements: BTreeMap::new(),
    })
});

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub skin_id: String,
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
}

impl Skin {
    pub fn default_skin() -> Arc<Skin> {
        Arc::clone(&DEFAULT_SKIN)
    }

    pub fn is_default(&self) -> bool {
        self.skin_id == DEFAULT_SKIN_ID && self.replacements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeSkin {
    pub skin_id: String,
    pub section_skin_id: String,
    pub question_skin_id: String,
    pub replacements: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "replacement `{key}` is `{section_value}` in section skin `{section_skin_id}` \
     but `{question_value}` in question skin `{question_skin_id}`"
)]
pub struct SkinConflict {
    pub key: String,
    pub section_skin_id: String,
    pub question_skin_id: String,
    pub section_value: String,
    pub question_value: String,
}

/// Merges a section skin with a question skin.
///
/// A key defined on both sides must carry the same value on both; any
/// disagreement is a conflict rather than a silent override.
pub fn composite(section: &Skin, question: &Skin) -> Result<CompositeSkin, SkinConflict> {
    let mut replacements = section.replacements.clone();
    for (key, value) in &question.replacements {
        match replacements.get(key) {
            Some(existing) if existing != value => {
                return Err(SkinConflict {
                    key: key.clone(),
                    section_skin_id: section.skin_id.clone(),
                    question_skin_id: question.skin_id.clone(),
                    section_value: existing.clone(),
                    question_value: value.clone(),
                });
            }
            Some(_) => {}
            None => {
                replacements.insert(key.clone(), value.clone());
            }
        }
    }

    let skin_id = match (section.is_default(), question.is_default()) {
        (true, true) => DEFAULT_SKIN_ID.to_string(),
        (true, false) => question.skin_id.clone(),
        (false, true) => section.skin_id.clone(),
        (false, false) => format!("{}-{}", section.skin_id, question.skin_id),
    };

    Ok(CompositeSkin {
        skin_id,
        section_skin_id: section.skin_id.clone(),
        question_skin_id: question.skin_id.clone(),
        replacements,
    })
}

impl CompositeSkin {
    pub fn apply(&self, text: &str) -> String {
        apply_replacements(&self.replacements, text)
    }
}

pub fn apply_replacements(replacements: &BTreeMap<String, String>, text: &str) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| match replacements.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skin(id: &str, pairs: &[(&str, &str)]) -> Skin {
        Skin {
            skin_id: id.into(),
            replacements: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn disjoint_keys_are_merged() {
        let merged = composite(&skin("s", &[("a", "1")]), &skin("q", &[("b", "2")])).unwrap();
        assert_eq!(merged.replacements.len(), 2);
        assert_eq!(merged.replacements["a"], "1");
        assert_eq!(merged.replacements["b"], "2");
        assert_eq!(merged.skin_id, "s-q");
    }

    #[test]
    fn conflicting_values_fail() {
        let err = composite(&skin("s", &[("a", "1")]), &skin("q", &[("a", "2")])).unwrap_err();
        assert_eq!(err.key, "a");
        assert_eq!(err.section_value, "1");
        assert_eq!(err.question_value, "2");
        assert!(err.to_string().contains("section skin `s`"));
    }

    #[test]
    fn agreeing_values_are_accepted() {
        let merged = composite(&skin("s", &[("a", "1")]), &skin("q", &[("a", "1")])).unwrap();
        assert_eq!(merged.replacements["a"], "1");
    }

    #[test]
    fn default_side_passes_the_other_through() {
        let question = skin("vars_x", &[("var", "x")]);
        let merged = composite(&Skin::default_skin(), &question).unwrap();
        assert_eq!(merged.skin_id, "vars_x");
        assert_eq!(merged.replacements, question.replacements);

        let both = composite(&Skin::default_skin(), &Skin::default_skin()).unwrap();
        assert_eq!(both.skin_id, DEFAULT_SKIN_ID);
    }

    #[test]
    fn apply_substitutes_known_placeholders() {
        let merged = composite(&skin("s", &[("name", "ptr")]), &skin("q", &[("n", "3")])).unwrap();
        assert_eq!(
            merged.apply("int *{{name}} = arr + {{ n }}; // {{unknown}}"),
            "int *ptr = arr + 3; // {{unknown}}"
        );
    }
}
