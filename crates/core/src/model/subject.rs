use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown subject label: {0}")]
pub struct SubjectError(pub String);

/// School subject a test belongs to.
///
/// The labels are the wire names shared with the store; filtering by subject
/// only works when they round-trip byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "Matematika")]
    Math,
    #[serde(rename = "Ingliz tili")]
    English,
    #[serde(rename = "Fizika")]
    Physics,
    #[serde(rename = "Biologiya")]
    Biology,
    #[serde(rename = "Kimyo")]
    Chemistry,
    #[serde(rename = "Ona tili")]
    NativeLanguage,
    #[serde(rename = "Adabiyot")]
    Literature,
}

impl Subject {
    pub const ALL: [Subject; 7] = [
        Subject::Math,
        Subject::English,
        Subject::Physics,
        Subject::Biology,
        Subject::Chemistry,
        Subject::NativeLanguage,
        Subject::Literature,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Subject::Math => "Matematika",
            Subject::English => "Ingliz tili",
            Subject::Physics => "Fizika",
            Subject::Biology => "Biologiya",
            Subject::Chemistry => "Kimyo",
            Subject::NativeLanguage => "Ona tili",
            Subject::Literature => "Adabiyot",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Subject {
    type Err = SubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.label() == s)
            .ok_or_else(|| SubjectError(s.to_owned()))
    }
}
