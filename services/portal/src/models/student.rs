//! Student profile payloads and the enumerations they use

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Preferred way of learning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningStyle {
    Visual,
    Auditory,
    #[serde(rename = "Reading/Writing")]
    ReadingWriting,
    Kinesthetic,
    Mixed,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 5] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::ReadingWriting,
        LearningStyle::Kinesthetic,
        LearningStyle::Mixed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::ReadingWriting => "Reading/Writing",
            LearningStyle::Kinesthetic => "Kinesthetic",
            LearningStyle::Mixed => "Mixed",
        }
    }
}

impl FromStr for LearningStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|style| style.as_str() == s).ok_or(())
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Myers-Briggs personality type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersonalityType {
    Intj,
    Intp,
    Entj,
    Entp,
    Infj,
    Infp,
    Enfj,
    Enfp,
    Istj,
    Isfj,
    Estj,
    Esfj,
    Istp,
    Isfp,
    Estp,
    Esfp,
}

impl PersonalityType {
    pub const ALL: [PersonalityType; 16] = [
        PersonalityType::Intj,
        PersonalityType::Intp,
        PersonalityType::Entj,
        PersonalityType::Entp,
        PersonalityType::Infj,
        PersonalityType::Infp,
        PersonalityType::Enfj,
        PersonalityType::Enfp,
        PersonalityType::Istj,
        PersonalityType::Isfj,
        PersonalityType::Estj,
        PersonalityType::Esfj,
        PersonalityType::Istp,
        PersonalityType::Isfp,
        PersonalityType::Estp,
        PersonalityType::Esfp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PersonalityType::Intj => "INTJ",
            PersonalityType::Intp => "INTP",
            PersonalityType::Entj => "ENTJ",
            PersonalityType::Entp => "ENTP",
            PersonalityType::Infj => "INFJ",
            PersonalityType::Infp => "INFP",
            PersonalityType::Enfj => "ENFJ",
            PersonalityType::Enfp => "ENFP",
            PersonalityType::Istj => "ISTJ",
            PersonalityType::Isfj => "ISFJ",
            PersonalityType::Estj => "ESTJ",
            PersonalityType::Esfj => "ESFJ",
            PersonalityType::Istp => "ISTP",
            PersonalityType::Isfp => "ISFP",
            PersonalityType::Estp => "ESTP",
            PersonalityType::Esfp => "ESFP",
        }
    }
}

impl FromStr for PersonalityType {
    type Err = ();

    // Case-sensitive, as stored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(())
    }
}

impl fmt::Display for PersonalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw registration payload; every field is checked by
/// `validation::validate_registration`
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Institutional (enrollment) id
    pub srn: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub major: Option<String>,
    pub year: Option<i64>,
    pub gpa: Option<f64>,
    pub learning_style: Option<String>,
    pub personality_type: Option<String>,
}

/// A validated registration, ready to be stored
#[derive(Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub srn: String,
    pub phone: String,
    pub password: String,
    pub major: String,
    pub year: i16,
    pub gpa: f64,
    pub learning_style: LearningStyle,
    pub personality_type: PersonalityType,
}

/// Raw partial profile update; absent or empty fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub major: Option<String>,
    pub year: Option<i64>,
    pub gpa: Option<f64>,
    pub learning_style: Option<String>,
    pub personality_type: Option<String>,
    pub needs_help: Option<bool>,
    pub can_teach: Option<bool>,
}

/// Validated profile changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub major: Option<String>,
    pub year: Option<i16>,
    pub gpa: Option<f64>,
    pub learning_style: Option<LearningStyle>,
    pub personality_type: Option<PersonalityType>,
    pub needs_help: Option<bool>,
    pub can_teach: Option<bool>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        *self == ProfileChanges::default()
    }
}
