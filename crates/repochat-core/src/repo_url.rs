use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

const HOST_MARKER: &str = "github.com/";

fn repo_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
            .expect("repository path regex is valid")
    })
}

/// A repository URL that passed validation.
///
/// The URL is kept exactly as the user typed it (minus surrounding
/// whitespace) because that is what the analyzer service receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    url: String,
    owner: String,
    name: String,
}

impl RepoUrl {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(ValidationError::Empty);
        }
        if !url.contains(HOST_MARKER) {
            return Err(ValidationError::MissingHost);
        }

        let caps = repo_path_regex()
            .captures(url)
            .ok_or(ValidationError::MissingRepository)?;

        let owner = caps[1].to_string();
        let name = caps[2].trim_end_matches(".git").to_string();
        if name.is_empty() || name == "." || name == ".." {
            return Err(ValidationError::MissingRepository);
        }

        Ok(Self {
            url: url.to_string(),
            owner,
            name,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// `owner/name`, for display.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
