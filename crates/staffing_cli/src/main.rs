//! Operator entry point for the staffing workflow.
//!
//! # Responsibility
//! - Map subcommands onto `staffing_core` services, one transaction each.
//! - Print results as JSON on stdout and failures with their error code on
//!   stderr.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use staffing_core::config::{ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
use staffing_core::model::project::DEFAULT_PRIORITY;
use staffing_core::{
    init_logging, open_db, parse_deadline, parse_project_status, parse_rating,
    AssignmentService, CoreConfig, Decision, EmployeeId, EmployeeListQuery, EmployeeService,
    NewEmployee, NewProject, NotificationId, NotificationService, Project, ProjectId,
    ProjectListQuery, ProjectService, ProjectUpdate, SqliteWorkflowStore, WorkflowError,
};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "staffing")]
#[command(version, about = "Assign projects to the best-rated volunteer")]
struct Cli {
    /// SQLite database file (overrides STAFFING_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    /// trace|debug|info|warn|error (overrides STAFFING_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (overrides STAFFING_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an employee
    AddEmployee {
        external_id: String,
        name: String,
        #[arg(long, default_value = "staff")]
        role: String,
        #[arg(long)]
        admin: bool,
        #[arg(long)]
        rating: Option<String>,
    },

    /// Create the admin account unless it already exists
    EnsureAdmin {
        #[arg(long, default_value = "admin123")]
        external_id: String,
        #[arg(long, default_value = "Admin User")]
        name: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },

    /// List employees
    Employees {
        #[arg(long, conflicts_with = "staff")]
        admins: bool,
        #[arg(long)]
        staff: bool,
    },

    /// Overwrite an employee's rating
    SetRating { employee_id: EmployeeId, rating: String },

    /// Create a project and notify every non-admin employee
    CreateProject {
        title: String,
        /// Id of the admin creating the project
        #[arg(long)]
        creator: EmployeeId,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = DEFAULT_PRIORITY)]
        priority: i64,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
    },

    /// List projects
    Projects {
        /// Internal employee id or staff code
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Apply an admin override to a project
    UpdateProject {
        project_id: ProjectId,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        assignee: Option<EmployeeId>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Show an employee's open notifications
    Notifications { employee_id: EmployeeId },

    /// Answer a notification with accept or reject
    Respond {
        notification_id: NotificationId,
        decision: String,
    },

    /// Assign a project to its best-rated acceptor
    Finalize { project_id: ProjectId },

    /// Delete every project, notification and acceptance
    ClearProjects {
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err:#}", error_code(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(config.log_level, &log_dir.to_string_lossy())
            .context("failed to start logging")?;
    }

    let mut conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    log::debug!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );
    dispatch(cli.command, &mut conn)
}

/// Flags win over environment variables, which win over defaults.
fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    let config = CoreConfig::from_lookup(|key| {
        let flag = match key {
            ENV_DB_PATH => cli.db.clone(),
            ENV_LOG_LEVEL => cli.log_level.clone(),
            ENV_LOG_DIR => cli.log_dir.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    })?;
    Ok(config)
}

fn error_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<WorkflowError>()
        .map_or("error", |workflow| workflow.kind().as_str())
}

fn store(conn: &mut Connection) -> Result<SqliteWorkflowStore<'_>> {
    let store = SqliteWorkflowStore::try_new(conn).map_err(WorkflowError::from)?;
    Ok(store)
}

/// Numeric input is an internal id; anything else is looked up as a staff
/// code. An unknown staff code resolves to `None`.
fn resolve_employee_ref(conn: &mut Connection, raw: &str) -> Result<Option<EmployeeId>> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<EmployeeId>() {
        return Ok(Some(id));
    }
    let employee = EmployeeService::new(store(conn)?).find_by_external_id(raw)?;
    Ok(employee.map(|employee| employee.id))
}

fn dispatch(command: Commands, conn: &mut Connection) -> Result<()> {
    match command {
        Commands::AddEmployee {
            external_id,
            name,
            role,
            admin,
            rating,
        } => {
            let mut employee = NewEmployee::new(external_id, name, role);
            if admin {
                employee = employee.admin();
            }
            if let Some(rating) = rating {
                let rating = parse_rating(&rating).map_err(WorkflowError::from)?;
                employee = employee.with_rating(rating);
            }
            print_json(&EmployeeService::new(store(conn)?).create_employee(&employee)?)
        }
        Commands::EnsureAdmin {
            external_id,
            name,
            role,
        } => print_json(
            &EmployeeService::new(store(conn)?)
                .ensure_admin(NewEmployee::new(external_id, name, role))?,
        ),
        Commands::Employees { admins, staff } => {
            let query = EmployeeListQuery {
                is_admin: match (admins, staff) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            print_json(&EmployeeService::new(store(conn)?).list_employees(&query)?)
        }
        Commands::SetRating {
            employee_id,
            rating,
        } => {
            let rating = parse_rating(&rating).map_err(WorkflowError::from)?;
            print_json(&EmployeeService::new(store(conn)?).update_rating(employee_id, rating)?)
        }
        Commands::CreateProject {
            title,
            creator,
            description,
            priority,
            deadline,
        } => {
            let mut project = NewProject::new(title, creator).with_priority(priority);
            if let Some(description) = description {
                project = project.with_description(description);
            }
            if let Some(deadline) = deadline {
                let deadline = parse_deadline(&deadline).map_err(WorkflowError::from)?;
                project = project.with_deadline(deadline);
            }
            print_json(&ProjectService::new(store(conn)?).create_project(&project)?)
        }
        Commands::Projects { assignee } => {
            let query = match assignee {
                None => ProjectListQuery::default(),
                Some(raw) => match resolve_employee_ref(conn, &raw)? {
                    Some(id) => ProjectListQuery {
                        assignee_id: Some(id),
                    },
                    None => return print_json(&Vec::<Project>::new()),
                },
            };
            print_json(&ProjectService::new(store(conn)?).list_projects(&query)?)
        }
        Commands::UpdateProject {
            project_id,
            status,
            priority,
            assignee,
            description,
            deadline,
        } => {
            let update = ProjectUpdate {
                status: status
                    .as_deref()
                    .map(parse_project_status)
                    .transpose()
                    .map_err(WorkflowError::from)?,
                priority,
                assignee_id: assignee,
                description,
                deadline: deadline
                    .as_deref()
                    .map(parse_deadline)
                    .transpose()
                    .map_err(WorkflowError::from)?,
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one field flag");
            }
            print_json(&ProjectService::new(store(conn)?).update_project(project_id, &update)?)
        }
        Commands::Notifications { employee_id } => {
            print_json(&NotificationService::new(store(conn)?).list_active(employee_id)?)
        }
        Commands::Respond {
            notification_id,
            decision,
        } => {
            let decision = decision
                .parse::<Decision>()
                .map_err(WorkflowError::from)?;
            print_json(&NotificationService::new(store(conn)?).respond(notification_id, decision)?)
        }
        Commands::Finalize { project_id } => {
            print_json(&AssignmentService::new(store(conn)?).finalize(project_id)?)
        }
        Commands::ClearProjects { yes } => {
            if !yes {
                return Err(anyhow!(
                    "clear-projects deletes every project; rerun with --yes to confirm"
                ));
            }
            print_json(&ProjectService::new(store(conn)?).clear_projects()?)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::AddEmployee { .. } => "add-employee",
        Commands::EnsureAdmin { .. } => "ensure-admin",
        Commands::Employees { .. } => "employees",
        Commands::SetRating { .. } => "set-rating",
        Commands::CreateProject { .. } => "create-project",
        Commands::Projects { .. } => "projects",
        Commands::UpdateProject { .. } => "update-project",
        Commands::Notifications { .. } => "notifications",
        Commands::Respond { .. } => "respond",
        Commands::Finalize { .. } => "finalize",
        Commands::ClearProjects { .. } => "clear-projects",
    }
}
