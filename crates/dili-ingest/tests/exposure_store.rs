//! Integration tests for loading exposure files from disk.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use dili_model::GradePoint;

use dili_ingest::{Delimiter, DaySource, ExposureStore, IngestError, IngestOptions};

fn write_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

const SAMPLE_TSV: &str = "\
patient_no\tsub\tindex_date\tnew_drug_exposure_date\tday\tday_num\tdrug_concept_id\tdrug_name\tgrade
1\tA\t2024-03-01\t2024-03-01\tD1\t1\t1545998\tatorvastatin\t0
1\tA\t2024-03-01\t2024-03-01\tD1\t1\t19019073\tpantoprazole\t0
1\tA\t2024-03-01\t2024-03-03\tD3\t3\t1545998\tatorvastatin\t1
2\tB\t2024-04-10\t2024-04-12\tD3\t3\t\tUnknown\t0
";

#[test]
fn loads_tab_separated_export() {
    let file = write_file(".txt", SAMPLE_TSV);
    let store = ExposureStore::open(file.path(), &IngestOptions::default()).unwrap();

    assert_eq!(store.delimiter(), Some(Delimiter::Tab));
    assert_eq!(store.row_count(), 4);
    assert_eq!(store.patient_ids(), ["1", "2"]);

    let data = store.patient_drug_data("1").unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data.days(), [1, 1, 3]);
    assert_eq!(data.names()[1], "pantoprazole");
    assert_eq!(store.frame().width(), 9);

    let grades = store.patient_grades("1").unwrap();
    assert_eq!(grades.len(), 3);
    assert_eq!(grades[2], GradePoint::new(3, 1));
}

#[test]
fn derives_days_from_dates() {
    let file = write_file(".tsv", SAMPLE_TSV);
    let options = IngestOptions::default().with_day_source(DaySource::dates());
    let store = ExposureStore::open(file.path(), &options).unwrap();

    assert_eq!(store.patient_drug_data("1").unwrap().days(), [1, 1, 3]);
    assert_eq!(store.patient_drug_data("2").unwrap().days(), [3]);
}

#[test]
fn loads_comma_file_with_custom_columns() {
    let file = write_file(
        ".csv",
        "subject,concept,drug,study_day\nP1,100,aspirin,0\nP1,,heparin,1\n",
    );
    let options = IngestOptions::default()
        .with_patient_column("subject")
        .with_concept_id_column("concept")
        .with_name_column("drug")
        .with_day_source(DaySource::column("study_day"))
        .with_day_offset(1);
    let store = ExposureStore::open(file.path(), &options).unwrap();

    assert_eq!(store.delimiter(), Some(Delimiter::Comma));
    let entries = store.drug_entries("P1").unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].concept_id.is_none());
    assert_eq!(store.patient_drug_data("P1").unwrap().days(), [1, 2]);
}

#[test]
fn loads_space_padded_file() {
    let file = write_file(
        ".txt",
        "patient_no  drug_concept_id  drug_name  day_num\n1  100  aspirin  1\n1  200  heparin  2\n",
    );
    let options = IngestOptions::default().with_delimiter(Delimiter::Whitespace);
    let store = ExposureStore::open(file.path(), &options).unwrap();

    assert_eq!(store.row_count(), 2);
    assert_eq!(store.all_drug_entries().len(), 2);
    assert!(store.patient_grades("1").unwrap().is_empty());
}

#[test]
fn skips_rows_without_day() {
    let file = write_file(
        ".csv",
        "patient_no,drug_concept_id,drug_name,day_num\n1,100,aspirin,\n1,200,heparin,2\n",
    );
    let store = ExposureStore::open(file.path(), &IngestOptions::default()).unwrap();

    assert_eq!(store.row_count(), 1);
    assert_eq!(store.skipped_rows(), 1);
    let frame = store.close();
    assert_eq!(frame.height(), 2);
}

#[test]
fn missing_file_is_reported() {
    let err = ExposureStore::open(Path::new("/nonexistent/drugs.txt"), &IngestOptions::default())
        .unwrap_err();
    assert!(matches!(err, IngestError::FileRead { .. }));
}

#[test]
fn header_only_file_cannot_be_detected() {
    let file = write_file(".txt", "patient_no\tdrug_name\n");
    let err = ExposureStore::open(file.path(), &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::InsufficientLines { lines: 1 }));
}
