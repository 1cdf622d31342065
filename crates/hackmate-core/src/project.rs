//! Project requests and their derived identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Default time budget when the request does not specify one
pub const DEFAULT_TIME_HOURS: u32 = 24;

/// Number of hex characters kept from the digest
const PROJECT_ID_LEN: usize = 8;

fn default_time_hours() -> u32 {
    DEFAULT_TIME_HOURS
}

/// A request to generate a hackathon project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub title: String,
    pub brief: String,
    #[serde(default = "default_time_hours", alias = "timeHours")]
    pub time_hours: u32,
}

impl ProjectRequest {
    /// Create a request with the default 24 hour budget
    pub fn new(title: impl Into<String>, brief: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            brief: brief.into(),
            time_hours: DEFAULT_TIME_HOURS,
        }
    }

    /// Set the time budget in hours
    pub fn with_time_hours(mut self, hours: u32) -> Self {
        self.time_hours = hours;
        self
    }

    /// Reject requests the agents cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        if self.brief.trim().is_empty() {
            return Err(Error::InvalidInput("brief must not be empty".to_string()));
        }
        if self.time_hours == 0 {
            return Err(Error::InvalidInput(
                "time_hours must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Identifier derived from title and brief
    pub fn project_id(&self) -> ProjectId {
        ProjectId::derive(&self.title, &self.brief)
    }
}

/// Short content-derived project identifier
///
/// The first 8 hex characters of `sha256(title ++ brief)`. Two distinct
/// requests can collide; nothing detects or prevents that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Derive the identifier for a title/brief pair
    pub fn derive(title: &str, brief: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(brief.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..PROJECT_ID_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == PROJECT_ID_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidInput(format!(
                "project id must be {} lowercase hex characters, got '{}'",
                PROJECT_ID_LEN, s
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_shape() {
        let id = ProjectId::derive("Recipe Bot", "helps find recipes from ingredients");
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(id.as_str(), id.as_str().to_lowercase());
    }

    #[test]
    fn test_project_id_deterministic() {
        let a = ProjectId::derive("Recipe Bot", "helps find recipes");
        let b = ProjectId::derive("Recipe Bot", "helps find recipes");
        assert_eq!(a, b);
        assert_ne!(a, ProjectId::derive("Recipe Bot", "helps find recipes!"));
    }

    #[test]
    fn test_project_id_is_digest_prefix_of_concatenation() {
        // No separator between title and brief
        assert_eq!(ProjectId::derive("ab", "c"), ProjectId::derive("a", "bc"));
    }

    #[test]
    fn test_project_id_ignores_time_budget() {
        let a = ProjectRequest::new("T", "B").with_time_hours(12);
        let b = ProjectRequest::new("T", "B").with_time_hours(48);
        assert_eq!(a.project_id(), b.project_id());
    }

    #[test]
    fn test_project_id_parse() {
        let id = ProjectId::derive("x", "y");
        assert_eq!(id.as_str().parse::<ProjectId>().unwrap(), id);
        assert!("ABCDEF12".parse::<ProjectId>().is_err());
        assert!("abc".parse::<ProjectId>().is_err());
        assert!("abcdefgh".parse::<ProjectId>().is_err());
        assert!("../../et".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_request_defaults_time_hours() {
        let request: ProjectRequest =
            serde_json::from_str(r#"{"title": "T", "brief": "B"}"#).unwrap();
        assert_eq!(request.time_hours, 24);
    }

    #[test]
    fn test_request_accepts_camel_case_alias() {
        let request: ProjectRequest =
            serde_json::from_str(r#"{"title": "T", "brief": "B", "timeHours": 6}"#).unwrap();
        assert_eq!(request.time_hours, 6);
    }

    #[test]
    fn test_validate() {
        assert!(ProjectRequest::new("T", "B").validate().is_ok());
        assert!(matches!(
            ProjectRequest::new("  ", "B").validate(),
            Err(Error::InvalidInput(_))
        ));
        assert!(ProjectRequest::new("T", "").validate().is_err());
        assert!(
            ProjectRequest::new("T", "B")
                .with_time_hours(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_missing_field_rejected() {
        assert!(serde_json::from_str::<ProjectRequest>(r#"{"title": "T"}"#).is_err());
    }
}
