//! Domain name validation and normalization
//!
//! A block request names one domain; the router needs two static DNS entries
//! for it (the bare domain and its `www.` form). This module validates the
//! user-supplied string against host-name grammar and expands it into that
//! pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length of a host name
pub const MAX_DOMAIN_LEN: usize = 253;

/// A validated host name: lowercase, no scheme, no trailing dot, no path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Validate a raw string as a host name
    ///
    /// Trims surrounding whitespace, lowercases, strips a single trailing
    /// dot, and checks host-name grammar (labels of 1-63 alphanumeric or
    /// hyphen characters, no leading/trailing hyphen, total length <= 253).
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Empty);
        }
        if trimmed.contains("://") || trimmed.starts_with("//") {
            return Err(DomainError::ContainsScheme(trimmed.to_string()));
        }
        if trimmed.contains('/') || trimmed.contains('?') || trimmed.contains('#') {
            return Err(DomainError::ContainsPath(trimmed.to_string()));
        }
        if trimmed.contains(':') {
            return Err(DomainError::ContainsPort(trimmed.to_string()));
        }

        let lowered = trimmed.to_lowercase();
        let name = lowered.strip_suffix('.').unwrap_or(&lowered);

        if name.is_empty() {
            return Err(DomainError::Empty);
        }
        if name.len() > MAX_DOMAIN_LEN {
            return Err(DomainError::TooLong);
        }

        for label in name.split('.') {
            if label.is_empty()
                || label.len() > 63
                || label.starts_with('-')
                || label.ends_with('-')
                || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(DomainError::InvalidLabel(label.to_string()));
            }
        }

        Ok(Self(name.to_string()))
    }

    /// Normalize a raw string into the root and `www.` pair to block
    ///
    /// If the input already carries the `www.` prefix, it becomes the www
    /// variant and the prefix is stripped for the root; otherwise the www
    /// variant is synthesized by prepending `www.`.
    pub fn normalize(input: &str) -> Result<DomainPair, DomainError> {
        let domain = Self::parse(input)?;

        let (root, www) = match domain.0.strip_prefix("www.") {
            Some(rest) if !rest.is_empty() => (Self(rest.to_string()), domain),
            _ => {
                let www = Self(format!("www.{}", domain.0));
                (domain, www)
            }
        };

        Ok(DomainPair { root, www })
    }

    /// The host name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two DNS names blocked for one requested domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPair {
    /// The bare domain
    pub root: Domain,

    /// The `www.`-prefixed form
    pub www: Domain,
}
