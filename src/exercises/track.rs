use crate::exercises::exercise::Exercise;

/// Hierarchical grouping of related exercises
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub base: Option<String>,
    pub suffix: Option<String>,
    pub exercises: Vec<Exercise>,
    pub children: Vec<Track>,
}

impl Track {
    /// Returns a flattened list of all exercises in this track and its children
    #[must_use]
    pub fn all_exercises(&self) -> Vec<&Exercise> {
        self.exercises
            .iter()
            .chain(self.children.iter().flat_map(|child| child.all_exercises()))
            .collect()
    }

    /// Look up an exercise anywhere in the tree by its slug
    #[must_use]
    pub fn find_exercise(&self, slug: &str) -> Option<&Exercise> {
        self.all_exercises()
            .into_iter()
            .find(|exercise| exercise.slug == slug)
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
    fn test_all_exercises_flattens_children() {
        let track = Track {
            id: "root".to_string(),
            name: "root".to_string(),
            exercises: vec![make_exercise("a")],
            children: vec![Track {
                id: "child".to_string(),
                name: "child".to_string(),
                exercises: vec![make_exercise("b"), make_exercise("c")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let slugs: Vec<&str> = track
            .all_exercises()
            .into_iter()
            .map(|e| e.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_exercise_searches_tree() {
        let track = Track {
            id: "root".to_string(),
            name: "root".to_string(),
            children: vec![Track {
                id: "child".to_string(),
                name: "child".to_string(),
                exercises: vec![make_exercise("nested")],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(track.find_exercise("nested").is_some());
        assert!(track.find_exercise("missing").is_none());
    }
}
