use crate::directory::StudentFilter;
use crate::display::*;
use crate::model::{CreateTeamRequest, NewJoinRequest, TeamUpdate};
use crate::roster::Roster;
use crate::store::RecordStore;
use crate::teams::CreateOutcome;
use crate::validation::{validate_team_request, validate_team_update};
use clap::Subcommand;
use eyre::{WrapErr, bail};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the sheets, or add their missing columns
    Init,
    #[command(subcommand)]
    Students(StudentsCommand),
    #[command(subcommand)]
    Account(AccountCommand),
    #[command(subcommand)]
    Team(TeamCommand),
    #[command(subcommand)]
    Request(RequestCommand),
    /// Cross-check team slots against student assignments
    Audit,
    /// Display roster statistics
    Stats,
}

#[derive(Debug, Subcommand)]
pub enum StudentsCommand {
    /// List registered students
    List {
        #[arg(long)]
        dept: Option<String>,
        #[arg(long)]
        year: Option<String>,
        /// Only students not yet in a team
        #[arg(long)]
        available: bool,
    },
    Show { reg_no: String },
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Set the first password of a registered student
    Create {
        reg_no: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Login {
        reg_no: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    /// Create a team described by a TOML file
    Create { file: PathBuf },
    /// Update the details of a team from a TOML file
    Update { team_id: String, file: PathBuf },
    Show { team_id: String },
    /// Show the team of a student
    Of { reg_no: String },
    /// List teams with open positions
    Vacancies {
        /// Flag teams this student already asked to join
        #[arg(long)]
        student: Option<String>,
    },
    /// Set the presentation links of a team
    Ppt {
        team_id: String,
        #[arg(long, default_value = "")]
        link1: String,
        #[arg(long, default_value = "")]
        link2: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Ask to join a team
    Create {
        team_id: String,
        #[arg(long)]
        student: String,
        #[arg(long)]
        note: String,
        #[arg(long, default_value = "")]
        link: String,
    },
    /// List the pending requests of a team
    Pending { team_id: String },
    Accept { request_id: String },
    Reject { request_id: String },
    /// Tell whether a student has a pending request for a team
    Check { reg_no: String, team_id: String },
    /// List the teams a student has pending requests for
    Map { reg_no: String },
}

fn read_toml<T: DeserializeOwned>(file: &Path) -> eyre::Result<T> {
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read {}", file.display()))?;
    toml::from_str(&content).wrap_err_with(|| format!("cannot parse {}", file.display()))
}

pub async fn run<S: RecordStore>(roster: &mut Roster<S>, command: Command) -> eyre::Result<()> {
    match command {
        Command::Init => roster.init().await?,
        Command::Students(command) => students(roster, command).await?,
        Command::Account(command) => account(roster, command).await?,
        Command::Team(command) => team(roster, command).await?,
        Command::Request(command) => request(roster, command).await?,
        Command::Audit => display_anomalies(&roster.check_roster_consistency().await?),
        Command::Stats => display_stats(&roster.roster_statistics().await?),
    }
    Ok(())
}

async fn students<S: RecordStore>(
    roster: &mut Roster<S>,
    command: StudentsCommand,
) -> eyre::Result<()> {
    match command {
        StudentsCommand::List {
            dept,
            year,
            available,
        } => {
            let filter = StudentFilter {
                dept,
                year,
                available_only: available,
            };
            display_students(&roster.list_students(&filter).await?);
        }
        StudentsCommand::Show { reg_no } => match roster.get_student(&reg_no).await? {
            Some(student) => display_student(&student),
            None => bail!("student {reg_no} not found"),
        },
    }
    Ok(())
}

async fn account<S: RecordStore>(
    roster: &mut Roster<S>,
    command: AccountCommand,
) -> eyre::Result<()> {
    match command {
        AccountCommand::Create {
            reg_no,
            email,
            password,
            confirm,
        } => {
            let student = roster
                .create_account(&reg_no, &email, &password, &confirm)
                .await?;
            println!("Account created for {student}");
        }
        AccountCommand::Login { reg_no, password } => {
            match roster.login(&reg_no, &password).await? {
                Some(login) => display_login(&login),
                None => bail!("invalid registration number or password"),
            }
        }
    }
    Ok(())
}

async fn team<S: RecordStore>(roster: &mut Roster<S>, command: TeamCommand) -> eyre::Result<()> {
    match command {
        TeamCommand::Create { file } => {
            let request: CreateTeamRequest = read_toml(&file)?;
            validate_team_request(&request, roster.sizes())?;
            match roster.create_team(&request).await? {
                CreateOutcome::Created(team_id) => println!("Team created: {team_id}"),
                CreateOutcome::Conflicts(conflicts) => bail!(
                    "students already in a team: {}",
                    conflicts.join(", ")
                ),
            }
        }
        TeamCommand::Update { team_id, file } => {
            let update: TeamUpdate = read_toml(&file)?;
            let update = validate_team_update(&update, roster.sizes())?;
            display_team_record(&roster.update_team(&team_id, &update).await?);
        }
        TeamCommand::Show { team_id } => match roster.get_team_by_id(&team_id).await? {
            Some(team) => display_team(&team),
            None => bail!("team {team_id} not found"),
        },
        TeamCommand::Of { reg_no } => match roster.get_team_by_member(&reg_no).await? {
            Some(team) => display_team(&team),
            None => println!("{reg_no} is not in a team"),
        },
        TeamCommand::Vacancies { student } => {
            let pending = match student {
                Some(reg_no) => roster.pending_request_map(&reg_no).await?,
                None => Default::default(),
            };
            display_vacancies(&roster.list_teams_with_vacancy().await?, &pending);
        }
        TeamCommand::Ppt {
            team_id,
            link1,
            link2,
        } => {
            roster
                .update_presentation_links(&team_id, &link1, &link2)
                .await?;
            println!("Presentation links of team {team_id} updated");
        }
    }
    Ok(())
}

async fn request<S: RecordStore>(
    roster: &mut Roster<S>,
    command: RequestCommand,
) -> eyre::Result<()> {
    match command {
        RequestCommand::Create {
            team_id,
            student,
            note,
            link,
        } => {
            let Some(student) = roster.get_student(&student).await? else {
                bail!("student {student} not found");
            };
            if !student.is_available() {
                bail!("{student} is already in a team");
            }
            if roster.has_pending_request(&student.reg_no, &team_id).await? {
                bail!("{student} already has a pending request for team {team_id}");
            }
            let request_id = roster
                .create_request(&NewJoinRequest {
                    team_id,
                    note,
                    github_portfolio_link: link,
                    student_reg_no: student.reg_no,
                    student_name: student.full_name,
                })
                .await
                .wrap_err("cannot create join request")?;
            println!("Request created: {request_id}");
        }
        RequestCommand::Pending { team_id } => {
            display_requests(&roster.list_pending_for_team(&team_id).await?);
        }
        RequestCommand::Accept { request_id } => {
            roster.accept_request(&request_id).await?;
            println!("Request {request_id} accepted");
        }
        RequestCommand::Reject { request_id } => {
            roster.reject_request(&request_id).await?;
            println!("Request {request_id} rejected");
        }
        RequestCommand::Check { reg_no, team_id } => {
            let pending = roster.has_pending_request(&reg_no, &team_id).await?;
            println!("{}", if pending { "pending" } else { "none" });
        }
        RequestCommand::Map { reg_no } => {
            for (team_id, _) in roster.pending_request_map(&reg_no).await? {
                println!("{team_id}");
            }
        }
    }
    Ok(())
}
