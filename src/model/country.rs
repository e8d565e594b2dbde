use std::fmt;

use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;

/// Roster code of a country (`"persia"`, `"rome"`, ...). Ordering is the
/// canonical ordering used for relation rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(String);

impl CountryId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CountryId {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a human player on the messaging side.
pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Controller {
    Human,
    Ai,
}

string_enum!(Controller {
    Human => "HUMAN",
    Ai => "AI",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub specialty: String,
    pub controller: Controller,
    pub owner: Option<PlayerId>,
    /// When the current owner took the country; breaks season-winner ties.
    pub joined_at: Option<Timestamp>,
    pub active: bool,
}

impl Country {
    /// A fresh AI-controlled country.
    pub fn new(id: CountryId, name: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            specialty: specialty.into(),
            controller: Controller::Ai,
            owner: None,
            joined_at: None,
            active: true,
        }
    }

    pub fn is_human(&self) -> bool {
        self.controller == Controller::Human
    }

    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }
}
