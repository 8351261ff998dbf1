/// Indexing state definitions for tracked items
///
/// This module defines the closed enumerations describing what the remote
/// index knows about a URL and how a submission was triggered.
use std::fmt;

/// Represents what the search index currently reports for an item's URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexStatus {
    /// The URL is present in the index (or was just submitted successfully)
    InIndex,

    /// The URL is known to the index but excluded or not indexed
    NotInIndex,

    /// The index has given no conclusive answer yet
    Unknown,
}

impl IndexStatus {
    /// Returns true if the status is a conclusive answer from the index
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::InIndex => "in_index",
            Self::NotInIndex => "not_in_index",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "in_index" => Some(Self::InIndex),
            "not_in_index" => Some(Self::NotInIndex),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Notification type sent with an indexing submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// The URL was added or its content changed
    UrlUpdated,

    /// The URL was removed and should be dropped from the index
    UrlDeleted,
}

impl ActionType {
    /// Returns the wire value expected by the indexing endpoint
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::UrlUpdated => "URL_UPDATED",
            Self::UrlDeleted => "URL_DELETED",
        }
    }

    /// Parses an action type from a free-form string, normalizing anything
    /// unrecognized to `UrlUpdated`
    ///
    /// The remote API only accepts the two known values; callers passing
    /// arbitrary strings get the update action rather than an error. This
    /// matches how submissions have always behaved, so it is kept.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "URL_DELETED" => Self::UrlDeleted,
            _ => Self::UrlUpdated,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire_str())
    }
}

/// How a submission was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionSource {
    /// Triggered by the scheduler or a publish event
    Auto,

    /// Triggered explicitly by an operator
    Manual,
}

impl SubmissionSource {
    /// Converts the source to its log-store string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }

    /// Parses a source from a string, normalizing anything unrecognized
    /// to `Auto`
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "manual" => Self::Manual,
            _ => Self::Auto,
        }
    }
}

impl fmt::Display for SubmissionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
