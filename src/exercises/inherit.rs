use crate::exercises::exercise::Exercise;
use crate::exercises::track::Track;

/// Branch settings that flow from a track down to its exercises and child tracks.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    pub base: Option<String>,
    pub suffix: Option<String>,
}

impl Defaults {
    /// Layer a track's own settings over the inherited ones. The track wins.
    fn layered(&self, base: &Option<String>, suffix: &Option<String>) -> Defaults {
        Defaults {
            base: base.clone().or_else(|| self.base.clone()),
            suffix: suffix.clone().or_else(|| self.suffix.clone()),
        }
    }
}

/// A trait for types that can inherit branch defaults from an enclosing track.
pub trait Inheritable {
    /// Fill in unset fields from the inherited defaults.
    fn inherit(&mut self, defaults: &Defaults);
}

impl Inheritable for Exercise {
    fn inherit(&mut self, defaults: &Defaults) {
        if self.base.is_none() {
            self.base = defaults.base.clone();
        }
        if self.suffix.is_none() {
            self.suffix = defaults.suffix.clone();
        }
    }
}

impl Inheritable for Track {
    fn inherit(&mut self, defaults: &Defaults) {
        let layered = defaults.layered(&self.base, &self.suffix);
        for exercise in &mut self.exercises {
            exercise.inherit(&layered);
        }
        for child in &mut self.children {
            child.inherit(&layered);
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

    #[test]
    fn test_track_defaults_reach_exercises() {
        let mut track = Track {
            id: "root".to_string(),
            name: "root".to_string(),
            base: Some("main".to_string()),
            suffix: Some("sandbox".to_string()),
            exercises: vec![make_exercise("a")],
            ..Default::default()
        };
        track.inherit(&Defaults::default());
        assert_eq!(track.exercises[0].base.as_deref(), Some("main"));
        assert_eq!(track.exercises[0].work_branch(), "a-sandbox");
    }

    #[test]
    fn test_nested_inheritance() {
        let mut track = Track {
            id: "root".to_string(),
            name: "root".to_string(),
            suffix: Some("sandbox".to_string()),
            children: vec![Track {
                id: "child".to_string(),
                name: "child".to_string(),
                exercises: vec![make_exercise("nested")],
                ..Default::default()
            }],
            ..Default::default()
        };
        track.inherit(&Defaults::default());
        assert_eq!(track.children[0].exercises[0].work_branch(), "nested-sandbox");
    }

    #[test]
    fn test_exercise_override_wins() {
        let mut track = Track {
            id: "root".to_string(),
            name: "root".to_string(),
            base: Some("main".to_string()),
            exercises: vec![Exercise {
                slug: "a".to_string(),
                name: "a".to_string(),
                base: Some("develop".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        track.inherit(&Defaults::default());
        assert_eq!(track.exercises[0].base.as_deref(), Some("develop"));
    }

    #[test]
    fn test_child_track_override_wins() {
        let mut track = Track {
            id: "root".to_string(),
            name: "root".to_string(),
            suffix: Some("sandbox".to_string()),
            children: vec![Track {
                id: "child".to_string(),
                name: "child".to_string(),
                suffix: Some("lab".to_string()),
                exercises: vec![make_exercise("nested")],
                ..Default::default()
            }],
            ..Default::default()
        };
        track.inherit(&Defaults::default());
        assert_eq!(track.children[0].exercises[0].work_branch(), "nested-lab");
    }
}
