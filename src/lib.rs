//! Core implementation of the gitgym exercise trainer
//!
//! Gitgym is a trainer for learning git. A course repository carries a manifest
//! enumerating branch-based exercises; learners start an exercise on its work
//! branch, solve it with ordinary git commands, and have the repository state
//! graded against the exercise's goals.

use std::collections::HashSet;
use std::path::PathBuf;

use log::{debug, warn};

use crate::exercises::exercise::Exercise;
use crate::exercises::inherit::{Defaults, Inheritable};
use crate::exercises::track::Track;
use crate::manifest::{Manifest, ManifestError};

pub mod cheatsheet;
pub mod exercises;
pub mod identity;
pub mod logger;
pub mod manifest;
pub mod probes;
pub mod progress;
pub mod session;

/// Load the manifest (from a file or auto-detected), returning the root `Track`,
/// the directory checks run in, and the manifest file path.
///
/// # Errors
///
/// Returns `ManifestError` if the manifest is not found, cannot be parsed,
/// contains invalid values, or fails validation.
pub fn load_manifest(
    manifest_file: Option<&str>,
) -> Result<(Track, PathBuf, PathBuf), ManifestError> {
    let manifest_path = match manifest_file {
        Some(file) => {
            let manifest_path = PathBuf::from(file);
            if !manifest_path.exists() {
                return Err(ManifestError::ManifestNotFound(manifest_path));
            }
            manifest_path
        }
        None => Manifest::find_manifest()?,
    };
    let cwd = manifest_path
        .parent()
        .ok_or_else(|| ManifestError::ManifestNotFound(manifest_path.clone()))?
        .to_path_buf();
    debug!(
        "Loading exercises from {} (cwd: {})",
        manifest_path.display(),
        cwd.display()
    );
    let parsed = Manifest::from_file(&manifest_path)?;
    validate_version(&parsed.gitgym_version);
    let mut track: Track = parsed.root.try_into()?;
    validate_tree(&track)?;
    validate_requirements(&track)?;
    track.inherit(&Defaults::default());
    Ok((track, cwd, manifest_path))
}

/// Warn if the manifest's `gitgym_version` doesn't match the binary version
fn validate_version(manifest_version: &str) {
    let binary_version = env!("CARGO_PKG_VERSION");
    if manifest_version != binary_version {
        warn!(
            "Manifest gitgym_version '{manifest_version}' differs from binary version '{binary_version}'"
        );
    }
}

/// Validate the exercise tree for duplicate slugs, empty names, and slugs
/// that cannot name a branch
fn validate_tree(root: &Track) -> Result<(), ManifestError> {
    let mut seen = HashSet::new();
    check_duplicates(root, &mut seen)?;
    check_empty_names(root)?;
    check_slugs(root)?;
    check_empty_tracks(root);
    check_goalless_exercises(root);
    Ok(())
}

fn check_duplicates(track: &Track, seen: &mut HashSet<String>) -> Result<(), ManifestError> {
    if !seen.insert(track.id.clone()) {
        return Err(ManifestError::DuplicateSlug(track.id.clone()));
    }
    for exercise in &track.exercises {
        if !seen.insert(exercise.slug.clone()) {
            return Err(ManifestError::DuplicateSlug(exercise.slug.clone()));
        }
    }
    for child in &track.children {
        check_duplicates(child, seen)?;
    }
    Ok(())
}

fn check_empty_names(track: &Track) -> Result<(), ManifestError> {
    if track.name.trim().is_empty() {
        return Err(ManifestError::Validation(format!(
            "Track with id '{}' has an empty name",
            track.id
        )));
    }
    for exercise in &track.exercises {
        if exercise.name.trim().is_empty() {
            return Err(ManifestError::Validation(format!(
                "Exercise with slug '{}' has an empty name",
                exercise.slug
            )));
        }
    }
    for child in &track.children {
        check_empty_names(child)?;
    }
    Ok(())
}

/// Slugs become branch name fragments, so only a conservative charset is allowed
fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !slug.starts_with(['-', '.'])
        && !slug.ends_with(['-', '.'])
}

fn check_slugs(track: &Track) -> Result<(), ManifestError> {
    for exercise in &track.exercises {
        if !valid_slug(&exercise.slug) {
            return Err(ManifestError::Validation(format!(
                "Exercise slug '{}' is not usable as a branch name",
                exercise.slug
            )));
        }
    }
    for child in &track.children {
        check_slugs(child)?;
    }
    Ok(())
}

/// Validate that all `requires` references resolve and there are no cycles
fn validate_requirements(root: &Track) -> Result<(), ManifestError> {
    // Collect all exercise slugs
    let mut all_slugs = HashSet::new();
    collect_slugs(root, &mut all_slugs);

    // Validate references
    for exercise in root.all_exercises() {
        for req in &exercise.requires {
            if !all_slugs.contains(req.as_str()) {
                return Err(ManifestError::Validation(format!(
                    "Exercise '{}' requires '{}' which does not exist",
                    exercise.slug, req
                )));
            }
        }
    }

    // Cycle detection via DFS
    let exercises: Vec<&Exercise> = root.all_exercises();
    let mut visited = HashSet::new();
    let mut stack = HashSet::new();
    for exercise in &exercises {
        if !visited.contains(exercise.slug.as_str()) {
            detect_cycle(exercise.slug.as_str(), &exercises, &mut visited, &mut stack)?;
        }
    }

    Ok(())
}

fn collect_slugs<'a>(track: &'a Track, slugs: &mut HashSet<&'a str>) {
    for exercise in &track.exercises {
        slugs.insert(&exercise.slug);
    }
    for child in &track.children {
        collect_slugs(child, slugs);
    }
}

fn detect_cycle<'a>(
    slug: &'a str,
    exercises: &[&'a Exercise],
    visited: &mut HashSet<&'a str>,
    stack: &mut HashSet<&'a str>,
) -> Result<(), ManifestError> {
    visited.insert(slug);
    stack.insert(slug);

    if let Some(exercise) = exercises.iter().find(|e| e.slug == slug) {
        for req in &exercise.requires {
            let req_str: &str = req.as_str();
            if !visited.contains(req_str) {
                detect_cycle(req_str, exercises, visited, stack)?;
            } else if stack.contains(req_str) {
                return Err(ManifestError::Validation(format!(
                    "Circular requirement detected involving '{req}'"
                )));
            }
        }
    }

    stack.remove(slug);
    Ok(())
}

fn check_empty_tracks(track: &Track) {
    for child in &track.children {
        if child.exercises.is_empty() && child.children.is_empty() {
            warn!("Track '{}' has no exercises and no children", child.name);
        }
        check_empty_tracks(child);
    }
}

fn check_goalless_exercises(track: &Track) {
    for exercise in track.all_exercises() {
        if exercise.goals.is_empty() {
            warn!("Exercise '{}' has no goals and always passes", exercise.slug);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_exercise(slug: &str) -> Exercise {
        Exercise {
            slug: slug.to_string(),
            name: slug.to_string(),
            ..Default::default()
        }
    }

    fn make_track(id: &str, children: Vec<Track>, exercises: Vec<Exercise>) -> Track {
        Track {
            id: id.to_string(),
            name: id.to_string(),
            children,
            exercises,
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_slug_detection() {
        let track = make_track(
            "root",
            vec![make_track("dup", vec![], vec![make_exercise("dup")])],
            vec![],
        );
        let result = validate_tree(&track);
        assert!(result.is_err());
        match result.unwrap_err() {
            ManifestError::DuplicateSlug(slug) => assert_eq!(slug, "dup"),
            other => panic!("Expected DuplicateSlug, got: {other:?}"),
        }
    }

    #[test]
    fn test_unique_slugs_pass() {
        let track = make_track(
            "root",
            vec![make_track("track1", vec![], vec![make_exercise("ex1")])],
            vec![make_exercise("ex2")],
        );
        assert!(validate_tree(&track).is_ok());
    }

    #[test]
    fn test_invalid_slug_rejected() {
        let track = make_track("root", vec![], vec![make_exercise("bad slug!")]);
        let result = validate_tree(&track);
        assert!(result.is_err());
        match result.unwrap_err() {
            ManifestError::Validation(msg) => {
                assert!(msg.contains("not usable as a branch name"), "got: {msg}");
            }
            other => panic!("Expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn test_slug_must_not_start_with_dash() {
        assert!(!valid_slug("-leading"));
        assert!(!valid_slug("trailing-"));
        assert!(!valid_slug(""));
        assert!(valid_slug("first-commit"));
        assert!(valid_slug("v1.2_rc"));
    }

    #[test]
    fn test_unknown_requirement_rejected() {
        let mut exercise = make_exercise("ex1");
        exercise.requires = vec!["ghost".to_string()];
        let track = make_track("root", vec![], vec![exercise]);
        let result = validate_requirements(&track);
        assert!(result.is_err());
        match result.unwrap_err() {
            ManifestError::Validation(msg) => {
                assert!(msg.contains("does not exist"), "got: {msg}");
            }
            other => panic!("Expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn test_requirement_cycle_rejected() {
        let mut a = make_exercise("a");
        a.requires = vec!["b".to_string()];
        let mut b = make_exercise("b");
        b.requires = vec!["a".to_string()];
        let track = make_track("root", vec![], vec![a, b]);
        let result = validate_requirements(&track);
        assert!(result.is_err());
        match result.unwrap_err() {
            ManifestError::Validation(msg) => {
                assert!(msg.contains("Circular"), "got: {msg}");
            }
            other => panic!("Expected Validation, got: {other:?}"),
        }
    }
}
