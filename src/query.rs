use crate::error::{AccountPlanError, Result};
use std::fmt;

const RESEARCH_PREFIX: &str = "research";
const MIN_LETTERS: usize = 3;

/// A validated company name taken from free-form user input such as "Research Tesla".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyQuery {
    company_name: String,
}

impl CompanyQuery {
    pub fn parse(raw: &str) -> Result<Self> {
        let cleaned = raw.trim();
        let candidate = strip_research_keyword(cleaned);

        let letters = candidate.chars().filter(char::is_ascii_alphabetic).count();
        if letters < MIN_LETTERS {
            return Err(AccountPlanError::InvalidQuery(format!(
                "please enter a valid company name or research query (e.g. 'Research Tesla'), got '{}'",
                raw
            )));
        }

        Ok(Self {
            company_name: candidate.to_string(),
        })
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }
}

/// Drops a leading "research" only when it stands as its own word.
fn strip_research_keyword(input: &str) -> &str {
    let (Some(prefix), Some(rest)) = (
        input.get(..RESEARCH_PREFIX.len()),
        input.get(RESEARCH_PREFIX.len()..),
    ) else {
        return input;
    };

    let is_word = rest.is_empty() || rest.starts_with(char::is_whitespace);
    if prefix.eq_ignore_ascii_case(RESEARCH_PREFIX) && is_word {
        rest.trim()
    } else {
        input
    }
}

impl fmt::Display for CompanyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.company_name)
    }
}
