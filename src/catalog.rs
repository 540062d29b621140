use std::collections::HashSet;
use std::path::Path;

use crate::limits::*;
use crate::model::Hall;

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "catalog read error: {e}"),
            CatalogError::Json(e) => write!(f, "catalog parse error: {e}"),
            CatalogError::Invalid(msg) => write!(f, "invalid catalog: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Json(e)
    }
}

/// Read-only list of bookable halls, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HallCatalog {
    halls: Vec<Hall>,
}

impl HallCatalog {
    pub fn new(halls: Vec<Hall>) -> Result<Self, CatalogError> {
        if halls.len() > MAX_HALLS {
            return Err(CatalogError::Invalid(format!("more than {MAX_HALLS} halls")));
        }
        let mut seen = HashSet::new();
        for hall in &halls {
            if hall.id.is_empty() || hall.id.len() > MAX_ID_LEN {
                return Err(CatalogError::Invalid(format!("bad hall id {:?}", hall.id)));
            }
            if hall.name.trim().is_empty() || hall.name.len() > MAX_NAME_LEN {
                return Err(CatalogError::Invalid(format!("bad name for hall {}", hall.id)));
            }
            if hall.capacity == 0 {
                return Err(CatalogError::Invalid(format!("hall {} has zero capacity", hall.id)));
            }
            if !seen.insert(hall.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate hall id {}", hall.id)));
            }
        }
        Ok(Self { halls })
    }

    /// JSON array of halls.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let halls: Vec<Hall> = serde_json::from_str(json)?;
        Self::new(halls)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The three halls the campus ships with.
    pub fn builtin() -> Self {
        fn hall(id: &str, name: &str, capacity: u32, facilities: &[&str], location: &str, description: &str) -> Hall {
            Hall {
                id: id.into(),
                name: name.into(),
                capacity,
                facilities: facilities.iter().map(|f| f.to_string()).collect(),
                location: location.into(),
                description: description.into(),
            }
        }

        Self {
            halls: vec![
                hall(
                    "1",
                    "Main Seminar Hall",
                    200,
                    &["Projector", "Sound System", "Air Conditioning", "WiFi", "Podium", "Stage"],
                    "Building A, Ground Floor",
                    "Flagship seminar hall for large conferences, workshops and corporate events.",
                ),
                hall(
                    "2",
                    "Mini Auditorium",
                    120,
                    &["Projector", "Sound System", "Air Conditioning", "Recording Equipment"],
                    "Building B, First Floor",
                    "Auditorium for medium-sized gatherings, presentations and cultural programs.",
                ),
                hall(
                    "3",
                    "Conference Hall",
                    50,
                    &["Smart Board", "Video Conferencing", "Air Conditioning", "WiFi"],
                    "Building A, Second Floor",
                    "Meeting room for seminars and focused discussions with conferencing equipment.",
                ),
            ],
        }
    }

    pub fn halls(&self) -> &[Hall] {
        &self.halls
    }

    pub fn get(&self, id: &str) -> Option<&Hall> {
        self.halls.iter().find(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.halls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.halls.is_empty()
    }
}

impl Default for HallCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_three_halls() {
        let catalog = HallCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("1").unwrap().name, "Main Seminar Hall");
        assert_eq!(catalog.get("1").unwrap().capacity, 200);
        assert_eq!(catalog.get("3").unwrap().capacity, 50);
        assert!(catalog.get("4").is_none());
        // Builtin data must pass its own validation.
        assert!(HallCatalog::new(catalog.halls().to_vec()).is_ok());
    }

    #[test]
    fn parse_json_catalog() {
        let json = r#"[
            {"id": "a", "name": "Annex", "capacity": 30, "facilities": ["WiFi"]},
            {"id": "b", "name": "Barn", "capacity": 80}
        ]"#;
        let catalog = HallCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().facilities, vec!["WiFi".to_string()]);
        assert!(catalog.get("b").unwrap().facilities.is_empty());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let json = r#"[
            {"id": "a", "name": "Annex", "capacity": 30},
            {"id": "a", "name": "Again", "capacity": 10}
        ]"#;
        let err = HallCatalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate hall id"));
    }

    #[test]
    fn zero_capacity_rejected() {
        let json = r#"[{"id": "a", "name": "Annex", "capacity": 0}]"#;
        let err = HallCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = HallCatalog::from_json_str("[{").unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("hallbook_test_catalog_missing.json");
        let _ = std::fs::remove_file(&path);
        let err = HallCatalog::from_json_file(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("hallbook_test_catalog");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("halls.json");
        std::fs::write(&path, r#"[{"id": "x", "name": "Studio", "capacity": 12}]"#).unwrap();
        let catalog = HallCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.halls()[0].id, "x");
    }
}
