//! Conversation turns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::System, Role::User, Role::Assistant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(TurnError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("unknown role '{0}', expected one of: {}", Role::ALL.map(|r| r.as_str()).join(", "))]
    UnknownRole(String),
    #[error("turn content must not be empty")]
    EmptyContent,
}

/// A single validated message in a conversation.
///
/// Fields are private so a `Turn` can only be obtained through [`Turn::new`]
/// or [`Turn::parse`], both of which reject empty content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Result<Self, TurnError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(TurnError::EmptyContent);
        }
        Ok(Self { role, content })
    }

    /// Build a turn from an untyped role string.
    pub fn parse(role: &str, content: impl Into<String>) -> Result<Self, TurnError> {
        Self::new(role.parse()?, content)
    }

    pub fn system(content: impl Into<String>) -> Result<Self, TurnError> {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Result<Self, TurnError> {
        Self::new(Role::User, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl TryFrom<&HistoryEntry> for Turn {
    type Error = TurnError;

    fn try_from(entry: &HistoryEntry) -> Result<Self, Self::Error> {
        Turn::parse(&entry.role, entry.content.clone())
    }
}

/// A prior turn as sent by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}
