use rusqlite::Connection;
use staffing_core::db::open_db_in_memory;
use staffing_core::{
    AssignmentService, Decision, Employee, EmployeeService, NewEmployee, NewProject,
    Notification, NotificationId, NotificationService, NotificationStatus, ProjectCreated,
    ProjectService, SqliteWorkflowStore, WorkflowError, WorkflowErrorKind,
};

fn store(conn: &mut Connection) -> SqliteWorkflowStore<'_> {
    SqliteWorkflowStore::try_new(conn).unwrap()
}

fn notifications(conn: &mut Connection) -> NotificationService<SqliteWorkflowStore<'_>> {
    NotificationService::new(store(conn))
}

fn hire(conn: &mut Connection, external_id: &str, name: &str, admin: bool) -> Employee {
    let employee = NewEmployee::new(external_id, name, "dev");
    let employee = if admin { employee.admin() } else { employee };
    EmployeeService::new(store(conn))
        .create_employee(&employee)
        .unwrap()
}

struct Scenario {
    conn: Connection,
    ada: Employee,
    bo: Employee,
    created: ProjectCreated,
}

impl Scenario {
    fn new() -> Self {
        let mut conn = open_db_in_memory().unwrap();
        let admin = hire(&mut conn, "A1", "Admin", true);
        let ada = hire(&mut conn, "E1", "Ada", false);
        let bo = hire(&mut conn, "E2", "Bo", false);
        let created = ProjectService::new(store(&mut conn))
            .create_project(&NewProject::new("Migrate DB", admin.id).with_priority(2))
            .unwrap();
        Self {
            conn,
            ada,
            bo,
            created,
        }
    }

    fn notification_for(&self, employee: &Employee) -> NotificationId {
        self.created
            .notified
            .iter()
            .find(|entry| entry.employee_id == employee.id)
            .map(|entry| entry.notification_id)
            .unwrap()
    }

    fn respond(
        &mut self,
        employee: &Employee,
        decision: Decision,
    ) -> Result<Notification, WorkflowError> {
        let id = self.notification_for(employee);
        notifications(&mut self.conn).respond(id, decision)
    }

    fn acceptance_rows(&self, employee: &Employee) -> i64 {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM project_acceptances WHERE project_id = ?1 AND employee_id = ?2;",
                [self.created.project.id, employee.id],
                |row| row.get(0),
            )
            .unwrap()
    }
}

#[test]
fn accepting_records_the_acceptor() {
    let mut scenario = Scenario::new();
    let ada = scenario.ada.clone();

    let updated = scenario.respond(&ada, Decision::Accept).unwrap();

    assert_eq!(updated.status, NotificationStatus::Accept);
    assert_eq!(updated.employee_id, ada.id);
    assert_eq!(scenario.acceptance_rows(&ada), 1);
}

#[test]
fn accepting_twice_keeps_a_single_acceptance() {
    let mut scenario = Scenario::new();
    let ada = scenario.ada.clone();

    scenario.respond(&ada, Decision::Accept).unwrap();
    scenario.respond(&ada, Decision::Accept).unwrap();

    assert_eq!(scenario.acceptance_rows(&ada), 1);
}

#[test]
fn rejecting_leaves_the_acceptance_relation_alone() {
    let mut scenario = Scenario::new();
    let bo = scenario.bo.clone();

    let updated = scenario.respond(&bo, Decision::Reject).unwrap();

    assert_eq!(updated.status, NotificationStatus::Reject);
    assert_eq!(scenario.acceptance_rows(&bo), 0);
}

#[test]
fn later_response_overwrites_earlier_one() {
    let mut scenario = Scenario::new();
    let ada = scenario.ada.clone();

    scenario.respond(&ada, Decision::Reject).unwrap();
    let updated = scenario.respond(&ada, Decision::Accept).unwrap();
    assert_eq!(updated.status, NotificationStatus::Accept);

    // Withdrawing does not remove the acceptance row; finalization still
    // closes the notification.
    let updated = scenario.respond(&ada, Decision::Reject).unwrap();
    assert_eq!(updated.status, NotificationStatus::Reject);
    assert_eq!(scenario.acceptance_rows(&ada), 1);
}

#[test]
fn responses_after_finalization_are_conflicts() {
    let mut scenario = Scenario::new();
    let ada = scenario.ada.clone();
    let bo = scenario.bo.clone();
    scenario.respond(&ada, Decision::Accept).unwrap();
    AssignmentService::new(store(&mut scenario.conn))
        .finalize(scenario.created.project.id)
        .unwrap();

    let err = scenario.respond(&ada, Decision::Reject).unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Conflict);

    let err = scenario.respond(&bo, Decision::Accept).unwrap_err();
    assert_eq!(err.kind(), WorkflowErrorKind::Conflict);
    assert_eq!(scenario.acceptance_rows(&bo), 0);

    let status: String = scenario
        .conn
        .query_row(
            "SELECT status FROM notifications WHERE id = ?1;",
            [scenario.notification_for(&ada)],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(status, "assigned");
}

#[test]
fn unknown_notification_is_not_found() {
    let mut scenario = Scenario::new();

    let err = notifications(&mut scenario.conn)
        .respond(9_999, Decision::Accept)
        .unwrap_err();

    assert_eq!(err.kind(), WorkflowErrorKind::NotFound);
}

#[test]
fn decision_text_is_parsed_strictly() {
    assert_eq!(" ACCEPT ".parse::<Decision>().unwrap(), Decision::Accept);
    assert_eq!("reject".parse::<Decision>().unwrap(), Decision::Reject);

    let err = WorkflowError::from("maybe".parse::<Decision>().unwrap_err());
    assert_eq!(err.kind(), WorkflowErrorKind::Validation);
}

#[test]
fn list_active_shows_open_notifications_with_project_summary() {
    let mut scenario = Scenario::new();
    let ada = scenario.ada.clone();
    let bo = scenario.bo.clone();

    let active = notifications(&mut scenario.conn).list_active(ada.id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].project_id, scenario.created.project.id);
    assert_eq!(active[0].project_title, "Migrate DB");
    assert_eq!(active[0].project_priority, 2);
    assert_eq!(active[0].status, NotificationStatus::Pending);

    scenario.respond(&ada, Decision::Accept).unwrap();
    scenario.respond(&bo, Decision::Reject).unwrap();

    let active = notifications(&mut scenario.conn).list_active(ada.id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, NotificationStatus::Accept);

    let active = notifications(&mut scenario.conn).list_active(bo.id).unwrap();
    assert!(active.is_empty());

    AssignmentService::new(store(&mut scenario.conn))
        .finalize(scenario.created.project.id)
        .unwrap();
    let active = notifications(&mut scenario.conn).list_active(ada.id).unwrap();
    assert!(active.is_empty());
}

#[test]
fn list_active_for_unknown_employee_is_not_found() {
    let mut scenario = Scenario::new();

    let err = notifications(&mut scenario.conn)
        .list_active(9_999)
        .unwrap_err();

    assert_eq!(err.kind(), WorkflowErrorKind::NotFound);
}
