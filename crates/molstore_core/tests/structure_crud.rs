use molstore_core::db::open_db_in_memory;
use molstore_core::{
    ErrorClass, PageRequest, SqliteStructureRepository, StructureFields, StructureService,
    StructureServiceError,
};

#[test]
fn create_then_find_by_id_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let created = service
        .create(StructureFields::new("O=C(C)Oc1ccccc1C(=O)O").with_name("Aspirin"))
        .unwrap();
    assert_eq!(created.id, 1);

    let loaded = service.find_by_id(created.id).unwrap();
    assert_eq!(loaded.notation, "O=C(C)Oc1ccccc1C(=O)O");
    assert_eq!(loaded.name.as_deref(), Some("Aspirin"));
    assert!(loaded.description.is_none());
}

#[test]
fn duplicate_notation_is_rejected_on_create() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    service.create(StructureFields::new("CCO")).unwrap();
    let err = service
        .create(StructureFields::new("CCO").with_name("again"))
        .unwrap_err();
    assert!(matches!(err, StructureServiceError::DuplicateNotation(ref n) if n == "CCO"));
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(service.count().unwrap(), 1);
}

#[test]
fn equivalent_but_different_spelling_is_not_a_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    service.create(StructureFields::new("CCO")).unwrap();
    service.create(StructureFields::new("OCC")).unwrap();
    assert_eq!(service.count().unwrap(), 2);
}

#[test]
fn invalid_notation_is_never_persisted() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let err = service.create(StructureFields::new("C1CC")).unwrap_err();
    assert!(matches!(err, StructureServiceError::InvalidNotation { .. }));
    assert_eq!(err.class(), ErrorClass::InvalidInput);
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn unknown_ids_fail_for_find_update_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.find_by_id(42),
        Err(StructureServiceError::UnknownIdentifier(42))
    ));
    assert!(matches!(
        service.update(42, StructureFields::new("CC")),
        Err(StructureServiceError::UnknownIdentifier(42))
    ));
    let err = service.delete(42).unwrap_err();
    assert!(matches!(err, StructureServiceError::UnknownIdentifier(42)));
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[test]
fn update_of_unknown_id_wins_over_duplicate_notation() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    service.create(StructureFields::new("CC")).unwrap();
    assert!(matches!(
        service.update(99, StructureFields::new("CC")),
        Err(StructureServiceError::UnknownIdentifier(99))
    ));
}

#[test]
fn update_of_unknown_id_wins_over_invalid_notation() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.update(7, StructureFields::new("C(C")),
        Err(StructureServiceError::UnknownIdentifier(7))
    ));
}

#[test]
fn overbonded_carbon_is_never_persisted() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let notation = format!("C{}", "(C)".repeat(256));
    let err = service.create(StructureFields::new(notation)).unwrap_err();
    assert!(matches!(err, StructureServiceError::InvalidNotation { .. }));
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn update_replaces_all_mutable_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let created = service
        .create(
            StructureFields::new("CCO")
                .with_name("Ethanol")
                .with_description("solvent"),
        )
        .unwrap();

    let updated = service
        .update(created.id, StructureFields::new("CCCO"))
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.notation, "CCCO");
    assert!(updated.name.is_none());
    assert!(updated.description.is_none());
    assert_eq!(service.find_by_id(created.id).unwrap(), updated);
}

#[test]
fn update_allows_own_notation_but_not_anothers() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let first = service.create(StructureFields::new("CCO")).unwrap();
    service.create(StructureFields::new("CCN")).unwrap();

    let renamed = service
        .update(first.id, StructureFields::new("CCO").with_name("Ethanol"))
        .unwrap();
    assert_eq!(renamed.name.as_deref(), Some("Ethanol"));

    let err = service
        .update(first.id, StructureFields::new("CCN"))
        .unwrap_err();
    assert!(matches!(err, StructureServiceError::DuplicateNotation(_)));
    assert_eq!(service.find_by_id(first.id).unwrap().notation, "CCO");
}

#[test]
fn update_rejects_invalid_notation() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let created = service.create(StructureFields::new("CCO")).unwrap();
    assert!(matches!(
        service.update(created.id, StructureFields::new("C(")),
        Err(StructureServiceError::InvalidNotation { .. })
    ));
    assert_eq!(service.find_by_id(created.id).unwrap().notation, "CCO");
}

#[test]
fn delete_then_find_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let created = service.create(StructureFields::new("CCO")).unwrap();
    service.delete(created.id).unwrap();
    assert!(matches!(
        service.find_by_id(created.id),
        Err(StructureServiceError::UnknownIdentifier(id)) if id == created.id
    ));
}

#[test]
fn consecutive_pages_are_disjoint_and_cover_the_store_in_order() {
    let conn = open_db_in_memory().unwrap();
    let service = StructureService::new(SqliteStructureRepository::try_new(&conn).unwrap());

    let notations = ["C", "CC", "CCC", "CCCC", "CCCCC"];
    for notation in notations {
        service.create(StructureFields::new(notation)).unwrap();
    }

    let first = service.find_all(PageRequest::new(0, 2)).unwrap();
    let second = service.find_all(PageRequest::new(1, 2)).unwrap();
    let third = service.find_all(PageRequest::new(2, 2)).unwrap();
    let beyond = service.find_all(PageRequest::new(3, 2)).unwrap();

    let paged: Vec<&str> = first
        .iter()
        .chain(&second)
        .chain(&third)
        .map(|record| record.notation.as_str())
        .collect();
    assert_eq!(paged, notations);
    assert!(first.iter().all(|record| !second.contains(record)));
    assert!(beyond.is_empty());

    let everything = service.find_all(PageRequest::default()).unwrap();
    assert_eq!(everything.len(), notations.len());
}
