//! Member name rules for attribute, relationship and meta keys

use crate::{DocumentError, Result};

fn globally_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Check that `name` is a valid member name.
///
/// Names must be non-empty, start and end with an ASCII letter or digit, and may
/// additionally contain `-` and `_` in between.
pub fn validate_member_name(name: &str) -> Result<()> {
    let (Some(first), Some(last)) = (name.chars().next(), name.chars().last()) else {
        return Err(DocumentError::InvalidMemberName(
            "a valid member name must have at least one character".to_string(),
        ));
    };

    if !globally_allowed(first) {
        return Err(DocumentError::InvalidMemberName(
            "a valid member name must start with a globally allowed character".to_string(),
        ));
    }
    if !globally_allowed(last) {
        return Err(DocumentError::InvalidMemberName(
            "a valid member name must end with a globally allowed character".to_string(),
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|&c| c != '_' && c != '-' && !globally_allowed(c))
    {
        return Err(DocumentError::InvalidMemberName(format!(
            "a valid member name must only have valid characters, '{}' is not allowed",
            c
        )));
    }
    Ok(())
}
