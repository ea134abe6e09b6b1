use rusqlite::Connection;
use staffing_core::db::open_db;
use staffing_core::repo::notification_repo::{
    NotificationRepository, SqliteNotificationRepository,
};
use staffing_core::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use staffing_core::{
    AssignmentService, Decision, Employee, EmployeeService, NewEmployee, NewProject,
    NotificationId, NotificationService, NotificationStatus, ProjectCreated, ProjectId,
    ProjectService, SqliteWorkflowStore, WorkflowErrorKind,
};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

const FINALIZE_THREADS: usize = 8;

fn store(conn: &mut Connection) -> SqliteWorkflowStore<'_> {
    SqliteWorkflowStore::try_new(conn).unwrap()
}

fn hire(conn: &mut Connection, external_id: &str, rating: f64, admin: bool) -> Employee {
    let employee = NewEmployee::new(external_id, external_id, "dev").with_rating(rating);
    let employee = if admin { employee.admin() } else { employee };
    EmployeeService::new(store(conn))
        .create_employee(&employee)
        .unwrap()
}

fn notification_for(created: &ProjectCreated, employee: &Employee) -> NotificationId {
    created
        .notified
        .iter()
        .find(|entry| entry.employee_id == employee.id)
        .map(|entry| entry.notification_id)
        .unwrap()
}

fn accept(conn: &mut Connection, created: &ProjectCreated, employee: &Employee) {
    NotificationService::new(store(conn))
        .respond(notification_for(created, employee), Decision::Accept)
        .unwrap();
}

fn statuses(path: &Path, project_id: ProjectId) -> Vec<(i64, NotificationStatus)> {
    let conn = open_db(path).unwrap();
    SqliteNotificationRepository::try_new(&conn)
        .unwrap()
        .list_project_notifications(project_id)
        .unwrap()
        .into_iter()
        .map(|notification| (notification.employee_id, notification.status))
        .collect()
}

fn acceptor_ids(path: &Path, project_id: ProjectId) -> Vec<i64> {
    let conn = open_db(path).unwrap();
    SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .list_acceptors(project_id)
        .unwrap()
        .into_iter()
        .map(|employee| employee.id)
        .collect()
}

#[test]
fn concurrent_finalize_assigns_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staffing.db");
    let mut conn = open_db(&path).unwrap();
    let admin = hire(&mut conn, "A1", 5.0, true);
    let tied = (1..=5)
        .map(|n| hire(&mut conn, &format!("E{n}"), 4.5, false))
        .collect::<Vec<_>>();
    hire(&mut conn, "E9", 5.0, false);
    let created = ProjectService::new(store(&mut conn))
        .create_project(&NewProject::new("Migrate DB", admin.id))
        .unwrap();
    for employee in tied.iter().rev() {
        accept(&mut conn, &created, employee);
    }
    drop(conn);

    let project_id = created.project.id;
    let barrier = Arc::new(Barrier::new(FINALIZE_THREADS));
    let handles = (0..FINALIZE_THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                barrier.wait();
                AssignmentService::new(store(&mut conn))
                    .finalize(project_id)
                    .unwrap()
            })
        })
        .collect::<Vec<_>>();
    let outcomes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    let fresh = outcomes
        .iter()
        .filter(|outcome| !outcome.already_assigned)
        .count();
    assert_eq!(fresh, 1);

    let expected_winner = tied[0].id;
    assert!(outcomes
        .iter()
        .all(|outcome| outcome.employee.id == expected_winner));
    assert!(outcomes
        .iter()
        .all(|outcome| outcome.project.assignee_id == Some(expected_winner)));

    let settled = statuses(&path, project_id);
    let assigned = settled
        .iter()
        .filter(|(_, status)| *status == NotificationStatus::Assigned)
        .collect::<Vec<_>>();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].0, expected_winner);
    assert!(settled.iter().all(|(employee_id, status)| {
        *employee_id == expected_winner || *status == NotificationStatus::Closed
    }));
}

#[test]
fn response_racing_finalize_is_either_counted_or_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staffing.db");
    let mut conn = open_db(&path).unwrap();
    let admin = hire(&mut conn, "A1", 5.0, true);
    let early = hire(&mut conn, "E1", 4.0, false);
    let late = hire(&mut conn, "E2", 5.0, false);
    let created = ProjectService::new(store(&mut conn))
        .create_project(&NewProject::new("Migrate DB", admin.id))
        .unwrap();
    accept(&mut conn, &created, &early);
    drop(conn);

    let project_id = created.project.id;
    let late_notification = notification_for(&created, &late);
    let barrier = Arc::new(Barrier::new(2));

    let finalizer = {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let mut conn = open_db(&path).unwrap();
            barrier.wait();
            AssignmentService::new(store(&mut conn))
                .finalize(project_id)
                .unwrap()
        })
    };
    let responder = {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let mut conn = open_db(&path).unwrap();
            barrier.wait();
            NotificationService::new(store(&mut conn))
                .respond(late_notification, Decision::Accept)
                .map_err(|err| err.kind())
        })
    };
    let outcome = finalizer.join().unwrap();
    let response = responder.join().unwrap();

    let settled = statuses(&path, project_id);
    let late_status = settled
        .iter()
        .find(|(employee_id, _)| *employee_id == late.id)
        .map(|(_, status)| *status)
        .unwrap();
    match response {
        Ok(_) => {
            assert_eq!(outcome.employee.id, late.id);
            assert_eq!(late_status, NotificationStatus::Assigned);
            assert_eq!(acceptor_ids(&path, project_id), vec![late.id, early.id]);
        }
        Err(kind) => {
            assert_eq!(kind, WorkflowErrorKind::Conflict);
            assert_eq!(outcome.employee.id, early.id);
            assert_eq!(late_status, NotificationStatus::Closed);
            assert_eq!(acceptor_ids(&path, project_id), vec![early.id]);
        }
    }
}

#[test]
fn late_response_on_another_connection_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staffing.db");
    let mut admin_conn = open_db(&path).unwrap();
    let mut staff_conn = open_db(&path).unwrap();
    let admin = hire(&mut admin_conn, "A1", 5.0, true);
    let early = hire(&mut admin_conn, "E1", 4.0, false);
    let late = hire(&mut admin_conn, "E2", 5.0, false);
    let created = ProjectService::new(store(&mut admin_conn))
        .create_project(&NewProject::new("Migrate DB", admin.id))
        .unwrap();
    accept(&mut staff_conn, &created, &early);

    let outcome = AssignmentService::new(store(&mut admin_conn))
        .finalize(created.project.id)
        .unwrap();
    assert_eq!(outcome.employee.id, early.id);

    let err = NotificationService::new(store(&mut staff_conn))
        .respond(notification_for(&created, &late), Decision::Accept)
        .unwrap_err();

    assert_eq!(err.kind(), WorkflowErrorKind::Conflict);
    assert_eq!(acceptor_ids(&path, created.project.id), vec![early.id]);
}
