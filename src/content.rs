use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::LearnError;
use crate::models::{Course, Unit};

const BUNDLED_LESSONS: &str = include_str!("../data/lessons.json");

/// Immutable course content, loaded once before any session starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub courses: Vec<Course>,
}

impl Catalog {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let catalog: Catalog = serde_json::from_str(json).context("invalid lesson catalog")?;
        let items: usize = catalog
            .courses
            .iter()
            .flat_map(|c| &c.units)
            .map(|u| u.items.len())
            .sum();
        log::info!("loaded {} courses, {} items", catalog.courses.len(), items);
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lessons from {}", path.display()))?;
        Self::from_json(&json)
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json(BUNDLED_LESSONS)
    }

    pub fn default_course(&self) -> Option<&Course> {
        self.courses.first()
    }

    pub fn course(&self, course_id: &str) -> Result<&Course, LearnError> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| LearnError::UnknownCourse(course_id.to_string()))
    }

    pub fn unit(&self, course_id: &str, unit_id: &str) -> Result<&Unit, LearnError> {
        self.course(course_id)?
            .units
            .iter()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| LearnError::UnknownUnit(unit_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use std::io::Write;

    #[test]
    fn parses_lesson_file_format() {
        let json = r#"{"courses":[{"id":"es","name":"Spanish","flag":"🇪🇸","units":[
            {"id":"u1","name":"Basics","items":[
                {"id":"a","type":"mc","front":"Hello","options":["Hola","Adiós"],"answer":"Hola","xp":10},
                {"id":"b","type":"type","front":"Thanks","answer":"gracias","xp":15}
            ]}]}]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        let unit = catalog.unit("es", "u1").unwrap();

        assert_eq!(
            unit.items[0].kind,
            ItemKind::MultipleChoice {
                options: vec!["Hola".to_string(), "Adiós".to_string()]
            }
        );
        assert_eq!(unit.items[0].prompt, "Hello");
        assert_eq!(unit.items[1].kind, ItemKind::TypedAnswer);
        assert_eq!(unit.items[1].reward_points, 15);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(
            catalog.course("de").unwrap_err(),
            LearnError::UnknownCourse("de".to_string())
        );
        assert_eq!(
            catalog.unit("es", "nope").unwrap_err(),
            LearnError::UnknownUnit("nope".to_string())
        );
    }

    #[test]
    fn bundled_catalog_is_usable() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.default_course().unwrap().id, "es");
        assert!(catalog
            .courses
            .iter()
            .flat_map(|c| &c.units)
            .all(|u| !u.items.is_empty()));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"courses":[{{"id":"x","name":"X","units":[]}}]}}"#).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.courses.len(), 1);

        assert!(Catalog::load("/definitely/not/here.json").is_err());
    }
}
