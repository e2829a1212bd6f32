//! Reference list loading: hepatotoxic ingredients and plain id/name lists.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use dili_model::{ConceptId, ToxicityReference};

use crate::error::{IngestError, Result};

/// Row of a hepatotoxicity reference file.
#[derive(Debug, Deserialize)]
struct ToxicityRow {
    #[serde(alias = "CDM_ID", alias = "concept_id")]
    cdm_id: String,
    #[serde(default, alias = "INGREDIENT")]
    ingredient: Option<String>,
}

/// Row of an id and/or name list; either column may be absent.
#[derive(Debug, Deserialize)]
struct NameListRow {
    #[serde(default, alias = "CDM_ID", alias = "concept_id", alias = "drug_concept_id")]
    cdm_id: Option<String>,
    #[serde(default, alias = "name", alias = "drug_name", alias = "INGREDIENT")]
    ingredient: Option<String>,
}

const LIST_COLUMNS: &[&str] = &[
    "cdm_id",
    "CDM_ID",
    "concept_id",
    "drug_concept_id",
    "ingredient",
    "INGREDIENT",
    "name",
    "drug_name",
];

/// Concept ids and drug names read from a list file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList {
    pub ids: Vec<ConceptId>,
    pub names: Vec<String>,
}

impl NameList {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.names.is_empty()
    }
}

/// Loads a `cdm_id,ingredient` reference. Rows without an id are skipped.
pub fn read_toxicity_reference(path: &Path) -> Result<ToxicityReference> {
    let mut reader = open_reader(path)?;
    let mut reference = ToxicityReference::new();

    for result in reader.deserialize::<ToxicityRow>() {
        let row = result.map_err(|e| csv_error(path, e))?;
        let Some(id) = ConceptId::parse_optional(&row.cdm_id) else {
            continue;
        };
        reference.insert(id, non_empty(row.ingredient));
    }

    info!(path = %path.display(), entries = reference.len(), "loaded toxicity reference");
    Ok(reference)
}

/// Loads a list with a `cdm_id` column, an `ingredient`/`name` column, or both.
pub fn read_name_list(path: &Path) -> Result<NameList> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?;
    if !headers.iter().any(|header| LIST_COLUMNS.contains(&header)) {
        return Err(IngestError::MissingColumn {
            column: "cdm_id or ingredient".to_string(),
        });
    }

    let mut list = NameList::default();
    for result in reader.deserialize::<NameListRow>() {
        let row = result.map_err(|e| csv_error(path, e))?;
        if let Some(id) = row.cdm_id.as_deref().and_then(ConceptId::parse_optional) {
            list.ids.push(id);
        }
        if let Some(name) = non_empty(row.ingredient) {
            list.names.push(name);
        }
    }

    info!(
        path = %path.display(),
        ids = list.ids.len(),
        names = list.names.len(),
        "loaded name list"
    );
    Ok(list)
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let is_tsv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(if is_tsv { b'\t' } else { b',' })
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))
}

fn csv_error(path: &Path, source: csv::Error) -> IngestError {
    IngestError::CsvRead {
        path: path.to_path_buf(),
        source,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_toxicity_reference() {
        let file = create_temp_file(
            ".csv",
            "cdm_id,ingredient\n1545998,Atorvastatin\n42965904,\n,orphan\n",
        );
        let reference = read_toxicity_reference(file.path()).unwrap();

        assert_eq!(reference.len(), 2);
        assert_eq!(
            reference.ingredient(&ConceptId::from(1545998)),
            Some(Some("Atorvastatin"))
        );
        assert_eq!(reference.ingredient(&ConceptId::from(42965904)), Some(None));
    }

    #[test]
    fn reads_tab_separated_reference() {
        let file = create_temp_file(".tsv", "cdm_id\tingredient\n1\tacetaminophen\n");
        let reference = read_toxicity_reference(file.path()).unwrap();
        assert!(reference.contains_id(&ConceptId::from(1)));
    }

    #[test]
    fn reference_without_id_column_fails() {
        let file = create_temp_file(".csv", "ingredient\nacetaminophen\n");
        assert!(matches!(
            read_toxicity_reference(file.path()),
            Err(IngestError::CsvRead { .. })
        ));
    }

    #[test]
    fn reads_name_only_list() {
        let file = create_temp_file(".csv", "name\nPembrolizumab\n\nnivolumab\n");
        let list = read_name_list(file.path()).unwrap();
        assert!(list.ids.is_empty());
        assert_eq!(list.names, ["Pembrolizumab", "nivolumab"]);
    }

    #[test]
    fn reads_id_and_name_list() {
        let file = create_temp_file(".csv", "cdm_id,ingredient\n10,aspirin\nnull,heparin\n");
        let list = read_name_list(file.path()).unwrap();
        assert_eq!(list.ids, [ConceptId::from(10)]);
        assert_eq!(list.names.len(), 2);
    }

    #[test]
    fn name_list_needs_a_known_column() {
        let file = create_temp_file(".csv", "foo,bar\n1,2\n");
        assert!(matches!(
            read_name_list(file.path()),
            Err(IngestError::MissingColumn { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let missing = Path::new("/nonexistent/reference.csv");
        assert!(matches!(
            read_toxicity_reference(missing),
            Err(IngestError::CsvRead { .. })
        ));
    }
}
