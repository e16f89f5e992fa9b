//! Pronunciation exercise catalog

use serde::{Deserialize, Serialize};

const BUILTIN_EXERCISES: &str = include_str!("../data/exercises.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseDifficulty {
    Beginner,
    Intermediate,
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationExercise {
    pub id: String,
    pub text: String,
    pub language: String,
    pub difficulty: ExerciseDifficulty,
    pub scenario: String,
    pub expected_pronunciation: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    exercises: Vec<PronunciationExercise>,
}

impl ExerciseCatalog {
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Ok(Self {
            exercises: serde_json::from_str(BUILTIN_EXERCISES)?,
        })
    }

    pub fn get(&self, id: &str) -> Option<&PronunciationExercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn by_difficulty(
        &self,
        difficulty: ExerciseDifficulty,
    ) -> impl Iterator<Item = &PronunciationExercise> {
        self.exercises
            .iter()
            .filter(move |e| e.difficulty == difficulty)
    }

    pub fn all(&self) -> &[PronunciationExercise] {
        &self.exercises
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_two_per_level() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        assert_eq!(catalog.all().len(), 6);
        for level in [
            ExerciseDifficulty::Beginner,
            ExerciseDifficulty::Intermediate,
            ExerciseDifficulty::Native,
        ] {
            assert_eq!(catalog.by_difficulty(level).count(), 2, "{level:?}");
        }
    }

    #[test]
    fn lookup_by_id() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let ex = catalog.get("business-1").unwrap();
        assert_eq!(ex.difficulty, ExerciseDifficulty::Native);
        assert_eq!(ex.scenario, "Business Meeting");
        assert!(catalog.get("nope").is_none());
    }
}
