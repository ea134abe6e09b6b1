use rusqlite::Connection;
use staffing_core::db::open_db_in_memory;
use staffing_core::{
    parse_rating, EmployeeListQuery, EmployeeService, NewEmployee, SqliteWorkflowStore,
    WorkflowErrorKind, DEFAULT_RATING,
};

fn employees(conn: &mut Connection) -> EmployeeService<SqliteWorkflowStore<'_>> {
    EmployeeService::new(SqliteWorkflowStore::try_new(conn).unwrap())
}

#[test]
fn create_employee_trims_fields_and_applies_default_rating() {
    let mut conn = open_db_in_memory().unwrap();

    let created = employees(&mut conn)
        .create_employee(&NewEmployee::new(" E100 ", " Ada ", " backend "))
        .unwrap();

    assert_eq!(created.external_id, "E100");
    assert_eq!(created.name, "Ada");
    assert_eq!(created.role, "backend");
    assert!(!created.is_admin);
    assert_eq!(created.rating, DEFAULT_RATING);

    let loaded = employees(&mut conn).get_employee(created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn duplicate_external_id_is_a_validation_error() {
    let mut conn = open_db_in_memory().unwrap();
    employees(&mut conn)
        .create_employee(&NewEmployee::new("E1", "Ada", "dev"))
        .unwrap();

    let err = employees(&mut conn)
        .create_employee(&NewEmployee::new("E1", "Bo", "qa"))
        .unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Validation);
    assert!(err.to_string().contains("E1"));

    let all = employees(&mut conn)
        .list_employees(&EmployeeListQuery::default())
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn blank_fields_and_non_finite_rating_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = employees(&mut conn);

    let err = service
        .create_employee(&NewEmployee::new("E1", "   ", "dev"))
        .unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Validation);

    let err = service
        .create_employee(&NewEmployee::new("E1", "Ada", "dev").with_rating(f64::NAN))
        .unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Validation);
}

#[test]
fn update_rating_returns_fresh_record() {
    let mut conn = open_db_in_memory().unwrap();
    let created = employees(&mut conn)
        .create_employee(&NewEmployee::new("E1", "Ada", "dev"))
        .unwrap();

    let updated = employees(&mut conn).update_rating(created.id, 4.8).unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.rating, 4.8);

    let rating = parse_rating(" 3.25 ").unwrap();
    let updated = employees(&mut conn)
        .update_rating(created.id, rating)
        .unwrap();
    assert_eq!(updated.rating, 3.25);
}

#[test]
fn update_rating_reports_missing_employee_and_bad_values() {
    let mut conn = open_db_in_memory().unwrap();
    let created = employees(&mut conn)
        .create_employee(&NewEmployee::new("E1", "Ada", "dev"))
        .unwrap();

    let err = employees(&mut conn).update_rating(9_999, 4.0).unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::NotFound);

    let err = employees(&mut conn)
        .update_rating(created.id, f64::INFINITY)
        .unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Validation);

    assert!(parse_rating("excellent").is_err());

    let unchanged = employees(&mut conn).get_employee(created.id).unwrap();
    assert_eq!(unchanged.rating, DEFAULT_RATING);
}

#[test]
fn ensure_admin_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();

    let first = employees(&mut conn)
        .ensure_admin(NewEmployee::new("ADMIN001", "Admin", "manager"))
        .unwrap();
    assert!(first.created);
    assert!(first.employee.is_admin);

    let second = employees(&mut conn)
        .ensure_admin(NewEmployee::new("ADMIN001", "Someone Else", "manager"))
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.employee, first.employee);

    let admins = employees(&mut conn)
        .list_employees(&EmployeeListQuery {
            is_admin: Some(true),
        })
        .unwrap();
    assert_eq!(admins.len(), 1);
}

#[test]
fn ensure_admin_refuses_to_reuse_a_staff_id() {
    let mut conn = open_db_in_memory().unwrap();
    employees(&mut conn)
        .create_employee(&NewEmployee::new("E1", "Ada", "dev"))
        .unwrap();

    let err = employees(&mut conn)
        .ensure_admin(NewEmployee::new("E1", "Admin", "manager"))
        .unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Conflict);
}

#[test]
fn list_and_lookup_filter_employees() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = employees(&mut conn);
    let admin = service
        .create_employee(&NewEmployee::new("A1", "Admin", "manager").admin())
        .unwrap();
    let ada = service
        .create_employee(&NewEmployee::new("E1", "Ada", "dev"))
        .unwrap();
    let bo = service
        .create_employee(&NewEmployee::new("E2", "Bo", "qa"))
        .unwrap();

    let staff = service
        .list_employees(&EmployeeListQuery::non_admins())
        .unwrap();
    let staff_ids = staff.iter().map(|employee| employee.id).collect::<Vec<_>>();
    assert_eq!(staff_ids, vec![ada.id, bo.id]);

    let all = service.list_employees(&EmployeeListQuery::default()).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, admin.id);

    let found = service.find_by_external_id(" E2 ").unwrap().unwrap();
    assert_eq!(found.id, bo.id);
    assert!(service.find_by_external_id("E404").unwrap().is_none());

    let err = service.get_employee(9_999).unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::NotFound);
}
