//! Ref name validation (spec §4.5): a slash-separated sequence of
//! components, none empty, none starting/ending with `.`, none containing
//! `..`, control characters, space, `~^:?*[\`, or ending with `.lock`. `HEAD`
//! is specifically allowed despite being all-uppercase with no slash.

use crate::Error;

pub fn validate(name: &str) -> Result<(), Error> {
    if name == "HEAD" {
        return Ok(());
    }
    if name.is_empty() {
        return Err(Error::InvalidName("empty name"));
    }
    for component in name.split('/') {
        validate_component(component)?;
    }
    Ok(())
}

fn validate_component(component: &str) -> Result<(), Error> {
    if component.is_empty() {
        return Err(Error::InvalidName("empty path component"));
    }
    if component.starts_with('.') {
        return Err(Error::InvalidName("component starts with '.'"));
    }
    if component.ends_with('.') {
        return Err(Error::InvalidName("component ends with '.'"));
    }
    if component.ends_with(".lock") {
        return Err(Error::InvalidName("component ends with '.lock'"));
    }
    if component.contains("..") {
        return Err(Error::InvalidName("component contains '..'"));
    }
    for ch in component.chars() {
        if ch.is_control() || matches!(ch, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\') {
            return Err(Error::InvalidName("component contains a forbidden character"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_head() {
        validate("HEAD").unwrap();
    }

    #[test]
    fn accepts_typical_branch_name() {
        validate("refs/heads/main").unwrap();
    }

    #[test]
    fn rejects_empty_component() {
        assert!(validate("refs//heads").is_err());
    }

    #[test]
    fn rejects_dotdot() {
        assert!(validate("refs/heads/../etc").is_err());
    }

    #[test]
    fn rejects_lock_suffix() {
        assert!(validate("refs/heads/main.lock").is_err());
    }

    #[test]
    fn rejects_forbidden_characters() {
        for bad in ["refs/heads/a b", "refs/heads/a~b", "refs/heads/a:b", "refs/heads/a*b"] {
            assert!(validate(bad).is_err(), "expected {bad} to be rejected");
        }
    }
}
