use std::path::Path;

use git2::{ConfigLevel, ErrorCode, Repository};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("git repository not found: {0}")]
    NoRepo(#[source] git2::Error),

    #[error("failed to update repository config: {0}")]
    Config(#[source] git2::Error),
}

/// Domain used for generated committer emails.
const EMAIL_DOMAIN: &str = "gitgym.invalid";

/// Set or clear the repository-local committer identity.
///
/// With a name, `user.name` is set to it and `user.email` to an address
/// derived from it. With no name, both keys are removed; keys that were
/// never set are not an error.
///
/// # Errors
///
/// Returns `IdentityError::NoRepo` if no git repository is found and
/// `IdentityError::Config` on config access failure.
pub fn run(cwd: &Path, name: Option<&str>) -> Result<(), IdentityError> {
    let repo = Repository::discover(cwd).map_err(IdentityError::NoRepo)?;
    let mut config = repo
        .config()
        .and_then(|config| config.open_level(ConfigLevel::Local))
        .map_err(IdentityError::Config)?;

    match name {
        Some(name) => {
            let email = email_for(name);
            config
                .set_str("user.name", name)
                .map_err(IdentityError::Config)?;
            config
                .set_str("user.email", &email)
                .map_err(IdentityError::Config)?;
            debug!("Set local identity to {name} <{email}>");
            println!("Committing as {name} <{email}>");
        }
        None => {
            remove_entry(&mut config, "user.name")?;
            remove_entry(&mut config, "user.email")?;
            debug!("Cleared local identity");
            println!("Cleared local committer identity");
        }
    }
    Ok(())
}

fn remove_entry(config: &mut git2::Config, key: &str) -> Result<(), IdentityError> {
    match config.remove(key) {
        Ok(()) => Ok(()),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
        Err(e) => Err(IdentityError::Config(e)),
    }
}

/// Derive a deterministic email from a display name: lowercased, with runs
/// of non-alphanumerics collapsed to single dots.
fn email_for(name: &str) -> String {
    let mut local = String::new();
    let mut pending_dot = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dot && !local.is_empty() {
                local.push('.');
            }
            local.push(c.to_ascii_lowercase());
            pending_dot = false;
        } else {
            pending_dot = true;
        }
    }
    if local.is_empty() {
        format!("anonymous@{EMAIL_DOMAIN}")
    } else {
        format!("{local}@{EMAIL_DOMAIN}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_for_simple_name() {
        assert_eq!(email_for("Ada Lovelace"), "ada.lovelace@gitgym.invalid");
    }

    #[test]
    fn test_email_for_collapses_punctuation() {
        assert_eq!(email_for("  Grace -- Hopper  "), "grace.hopper@gitgym.invalid");
    }

    #[test]
    fn test_email_for_empty_name() {
        assert_eq!(email_for("!!!"), "anonymous@gitgym.invalid");
    }

    #[test]
    fn test_set_and_clear_identity() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        run(dir.path(), Some("Ada Lovelace")).unwrap();
        {
            let config = repo
                .config()
                .unwrap()
                .open_level(ConfigLevel::Local)
                .unwrap()
                .snapshot()
                .unwrap();
            assert_eq!(config.get_string("user.name").unwrap(), "Ada Lovelace");
            assert_eq!(
                config.get_string("user.email").unwrap(),
                "ada.lovelace@gitgym.invalid"
            );
        }

        run(dir.path(), None).unwrap();
        {
            let config = repo
                .config()
                .unwrap()
                .open_level(ConfigLevel::Local)
                .unwrap()
                .snapshot()
                .unwrap();
            assert!(config.get_string("user.name").is_err());
            assert!(config.get_string("user.email").is_err());
        }

        // Clearing an already-clear identity is not an error
        run(dir.path(), None).unwrap();
    }
}
