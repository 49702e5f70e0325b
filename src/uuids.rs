use crate::error::GenerationError;
use crate::models::StudentInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MIN_NAMESPACE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidStrategy {
    #[default]
    Plain,
    Uuidv4,
    Uuidv5,
}

impl FromStr for UuidStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(UuidStrategy::Plain),
            "uuidv4" => Ok(UuidStrategy::Uuidv4),
            "uuidv5" => Ok(UuidStrategy::Uuidv5),
            other => Err(format!(
                "unknown uuid strategy `{other}` (expected plain, uuidv4 or uuidv5)"
            )),
        }
    }
}

impl fmt::Display for UuidStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UuidStrategy::Plain => f.write_str("plain"),
            UuidStrategy::Uuidv4 => f.write_str("uuidv4"),
            UuidStrategy::Uuidv5 => f.write_str("uuidv5"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidOptions {
    Plain,
    Uuidv4,
    Uuidv5 { namespace: Uuid },
}

impl UuidOptions {
    pub fn new(strategy: UuidStrategy, namespace: Option<&str>) -> Result<Self, GenerationError> {
        let namespace = namespace.map(parse_namespace).transpose()?;
        match (strategy, namespace) {
            (UuidStrategy::Plain, _) => Ok(UuidOptions::Plain),
            (UuidStrategy::Uuidv4, _) => Ok(UuidOptions::Uuidv4),
            (UuidStrategy::Uuidv5, Some(namespace)) => Ok(UuidOptions::Uuidv5 { namespace }),
            (UuidStrategy::Uuidv5, None) => Err(GenerationError::Configuration(
                "the uuidv5 strategy requires a uuidv5 namespace".into(),
            )),
        }
    }

    pub fn strategy(&self) -> UuidStrategy {
        match self {
            UuidOptions::Plain => UuidStrategy::Plain,
            UuidOptions::Uuidv4 => UuidStrategy::Uuidv4,
            UuidOptions::Uuidv5 { .. } => UuidStrategy::Uuidv5,
        }
    }

    pub fn is_reproducible(&self) -> bool {
        !matches!(self, UuidOptions::Uuidv4)
    }
}

fn parse_namespace(raw: &str) -> Result<Uuid, GenerationError> {
    if let Ok(parsed) = Uuid::parse_str(raw) {
        return Ok(parsed);
    }
    let bytes = raw.as_bytes();
    if bytes.len() < MIN_NAMESPACE_LEN {
        return Err(GenerationError::Configuration(format!(
            "uuidv5 namespace must be at least {MIN_NAMESPACE_LEN} characters, got {}",
            bytes.len()
        )));
    }
    let mut ns = [0u8; 16];
    ns.copy_from_slice(&bytes[..16]);
    Ok(Uuid::from_bytes(ns))
}

pub fn create_student_uuid(options: &UuidOptions, student: &StudentInfo, id: &str) -> String {
    let name = format!("{}-{}", student.uniqname, id);
    match options {
        UuidOptions::Plain => name,
        UuidOptions::Uuidv4 => Uuid::new_v4().to_string(),
        UuidOptions::Uuidv5 { namespace } => Uuid::new_v5(namespace, name.as_bytes()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentInfo {
        StudentInfo {
            uniqname: "abc123".into(),
            name: "Alex".into(),
        }
    }

    #[test]
    fn plain_concatenates() {
        let opts = UuidOptions::new(UuidStrategy::Plain, None).unwrap();
        assert_eq!(create_student_uuid(&opts, &student(), "examX"), "abc123-examX");
    }

    #[test]
    fn uuidv5_is_stable_per_id() {
        let opts = UuidOptions::new(UuidStrategy::Uuidv5, Some("0123456789abcdef")).unwrap();
        let first = create_student_uuid(&opts, &student(), "examX");
        let again = create_student_uuid(&opts, &student(), "examX");
        let other = create_student_uuid(&opts, &student(), "examY");
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(Uuid::parse_str(&first).unwrap().get_version_num(), 5);
    }

    #[test]
    fn uuidv5_accepts_uuid_namespace() {
        let opts = UuidOptions::new(
            UuidStrategy::Uuidv5,
            Some("6ba7b810-9dad-11d1-80b4-00c04fd430c8"),
        )
        .unwrap();
        assert_eq!(
            create_student_uuid(&opts, &student(), "examX"),
            Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"abc123-examX").to_string()
        );
    }

    #[test]
    fn uuidv5_namespace_is_required_and_long_enough() {
        assert!(matches!(
            UuidOptions::new(UuidStrategy::Uuidv5, None),
            Err(GenerationError::Configuration(_))
        ));
        assert!(matches!(
            UuidOptions::new(UuidStrategy::Uuidv5, Some("short")),
            Err(GenerationError::Configuration(_))
        ));
        assert!(matches!(
            UuidOptions::new(UuidStrategy::Plain, Some("short")),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn uuidv4_is_not_reproducible() {
        let opts = UuidOptions::new(UuidStrategy::Uuidv4, None).unwrap();
        assert!(!opts.is_reproducible());
        assert_ne!(
            create_student_uuid(&opts, &student(), "examX"),
            create_student_uuid(&opts, &student(), "examX")
        );
    }

    #[test]
    fn strategy_parses_from_text() {
        assert_eq!("UUIDv5".parse::<UuidStrategy>().unwrap(), UuidStrategy::Uuidv5);
        assert!("sha1".parse::<UuidStrategy>().is_err());
        assert_eq!(UuidStrategy::default().to_string(), "plain");
    }
}
