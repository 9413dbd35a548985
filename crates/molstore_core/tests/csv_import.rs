use molstore_core::db::open_db_in_memory;
use molstore_core::{
    PageRequest, RowOutcome, SkipReason, SqliteStructureRepository, StructureFields,
    StructureService, StructureServiceError,
};

#[test]
fn invalid_row_is_skipped_and_valid_row_is_imported() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let count = service
        .import_csv(b"notation,name\nC1CC(,Broken\nCCO,Ethanol\n")
        .unwrap();
    assert_eq!(count, 1);

    let stored = service.find_all(PageRequest::default()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].notation, "CCO");
    assert_eq!(stored[0].name.as_deref(), Some("Ethanol"));
}

#[test]
fn missing_required_column_aborts_whole_import() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let err = service.import_csv(b"notation,label\nCCO,Ethanol\n").unwrap_err();
    match err {
        StructureServiceError::InvalidHeaderColumns(missing) => {
            assert_eq!(missing, vec!["name".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn header_match_is_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.import_csv(b"Notation,Name\nCCO,Ethanol\n"),
        Err(StructureServiceError::InvalidHeaderColumns(_))
    ));
}

#[test]
fn duplicates_are_skipped_per_row() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());
    service.create(StructureFields::new("CCO")).unwrap();

    let report = service
        .import_csv_report(b"name,notation,description\nEthanol,CCO,\nPropane,CCC,gas\nPropane again,CCC,\n")
        .unwrap();

    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.imported_count(), 1);
    assert_eq!(report.skipped_count(), 2);
    assert!(matches!(
        &report.rows[0].outcome,
        RowOutcome::Skipped { skip: SkipReason::DuplicateNotation(n) } if n == "CCO"
    ));
    match &report.rows[1].outcome {
        RowOutcome::Imported { record } => {
            assert_eq!(record.notation, "CCC");
            assert_eq!(record.description.as_deref(), Some("gas"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(report.rows[2].line, 3);
    assert!(matches!(
        &report.rows[2].outcome,
        RowOutcome::Skipped { skip: SkipReason::DuplicateNotation(_) }
    ));
    assert_eq!(service.count().unwrap(), 2);
}

#[test]
fn short_and_empty_rows_do_not_stop_the_batch() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let report = service
        .import_csv_report(b"name,notation\nlonely\n,\nMethane,C\n")
        .unwrap();

    assert!(matches!(
        &report.rows[0].outcome,
        RowOutcome::Skipped { skip: SkipReason::MalformedRow(_) }
    ));
    assert!(matches!(
        &report.rows[1].outcome,
        RowOutcome::Skipped { skip: SkipReason::InvalidNotation(_) }
    ));
    assert_eq!(report.imported_count(), 1);
    let methane = report.imported().next().unwrap();
    assert_eq!(methane.name.as_deref(), Some("Methane"));
}

#[test]
fn header_only_and_non_utf8_inputs() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    assert_eq!(service.import_csv(b"notation,name\n").unwrap(), 0);
    assert!(matches!(
        service.import_csv(b"notation,name\n\xff\xfe,bad\n"),
        Err(StructureServiceError::InvalidEncoding(_))
    ));
    assert!(matches!(
        service.import_csv(b""),
        Err(StructureServiceError::InvalidHeaderColumns(ref missing)) if missing.len() == 2
    ));
}

#[test]
fn report_serializes_per_row_status() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let report = service
        .import_csv_report(b"notation,name\nCCO,Ethanol\nCCO,Dup\n")
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["rows"][0]["line"], 1);
    assert_eq!(json["rows"][0]["outcome"]["status"], "imported");
    assert_eq!(json["rows"][0]["outcome"]["record"]["notation"], "CCO");
    assert_eq!(json["rows"][1]["outcome"]["status"], "skipped");
    assert_eq!(
        json["rows"][1]["outcome"]["skip"]["reason"],
        "duplicate_notation"
    );
}
