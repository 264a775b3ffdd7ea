//! Catalog store - the read-only song table loaded at startup

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::CatalogRow;

const REQUIRED_COLUMNS: [&str; 3] = ["track_name", "artist_name", "valence"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] io::Error),
    #[error("malformed catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog is missing the `{0}` column")]
    MissingColumn(&'static str),
}

/// In-memory song catalog.
///
/// Rows are fixed once loaded; share it behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
}

impl Catalog {
    #[cfg(test)]
    pub fn new(rows: Vec<CatalogRow>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog CSV, degrading to an empty catalog on any failure
    pub fn load(path: &Path) -> Self {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Catalog not found at {:?}; starting with an empty catalog", path);
                return Self::empty();
            }
            Err(e) => {
                error!("Failed to open catalog {:?}: {}", path, e);
                return Self::empty();
            }
        };

        match Self::from_reader(file) {
            Ok(catalog) => {
                info!("Loaded {} catalog rows from {:?}", catalog.len(), path);
                catalog
            }
            Err(e) => {
                error!("Failed to load catalog {:?}: {}", path, e);
                Self::empty()
            }
        }
    }

    /// Parse catalog rows from CSV.
    ///
    /// Rows that don't deserialize are skipped. Rows with a valence outside
    /// [0, 1] are kept with an unknown (NaN) valence, so their artist still
    /// matches but no mood selects them.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column));
            }
        }

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        let mut unknown_valence = 0usize;

        for result in rdr.deserialize::<CatalogRow>() {
            match result {
                Ok(mut row) => {
                    if !row.has_valid_valence() {
                        row.valence = f64::NAN;
                        unknown_valence += 1;
                    }
                    rows.push(row);
                }
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Skipped {} malformed catalog rows", skipped);
        }
        if unknown_valence > 0 {
            warn!(
                "{} catalog rows have no usable valence and will never be recommended",
                unknown_valence
            );
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
track_id,track_name,artist_name,popularity,valence
1,Shape of Sleep,X,10,0.8
2,Blue,X,5,0.2
3,\"Hello, Goodbye\",The Band,40,0.61
";

    #[test]
    fn test_parses_rows_and_ignores_extra_columns() {
        let catalog = Catalog::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.rows()[0], CatalogRow::new("Shape of Sleep", "X", 0.8));
        assert_eq!(catalog.rows()[2].track_name, "Hello, Goodbye");
    }

    #[test]
    fn test_bad_valence_is_kept_as_unknown() {
        let data = "\
track_name,artist_name,valence
Good,A,0.4
Bad,A,not-a-number
Loud,A,1.7
Quiet,A,
Short,A
Fine,B,1.0
";
        let catalog = Catalog::from_reader(data.as_bytes()).unwrap();
        let names: Vec<_> = catalog.rows().iter().map(|r| r.track_name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Bad", "Loud", "Quiet", "Fine"]);

        let valences: Vec<f64> = catalog.rows().iter().map(|r| r.valence).collect();
        assert_eq!(valences[0], 0.4);
        assert!(valences[1..4].iter().all(|v| v.is_nan()));
        assert_eq!(valences[4], 1.0);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let data = "track_name,artist_name\nA,B\n";
        let err = Catalog::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn("valence")));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = Catalog::load(&temp_dir.path().join("nope.csv"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("songs.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = Catalog::load(&path);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_bad_header_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("songs.csv");
        std::fs::write(&path, "name,singer\nA,B\n").unwrap();

        assert!(Catalog::load(&path).is_empty());
    }
}
