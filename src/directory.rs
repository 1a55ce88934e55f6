use crate::error::RosterError;
use crate::model::{Student, Team};
use crate::password::{hash_password, verify_password};
use crate::roster::Roster;
use crate::sheets::{STUDENT_PASSWORD, STUDENT_REG_NO};
use crate::store::RecordStore;
use crate::validation::validate_account;
use std::fmt;
use tracing::{debug, error, info};

#[derive(Clone, Debug, Default)]
pub struct StudentFilter {
    pub dept: Option<String>,
    pub year: Option<String>,
    pub available_only: bool,
}

impl StudentFilter {
    fn accepts(&self, student: &Student) -> bool {
        !student.reg_no.is_empty()
            && !student.full_name.is_empty()
            && self.dept.as_ref().is_none_or(|d| &student.dept == d)
            && self.year.as_ref().is_none_or(|y| &student.year == y)
            && (!self.available_only || student.is_available())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Leader,
    Member,
    None,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leader => write!(f, "leader"),
            Self::Member => write!(f, "member"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Login {
    pub student: Student,
    pub team: Option<Team>,
    pub role: Role,
}

impl<S: RecordStore> Roster<S> {
    /// Students with a registration number and a name, optionally restricted
    /// to a department, a year, or to those not yet in a team.
    pub async fn list_students(
        &mut self,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, RosterError> {
        let students = self
            .all_students()
            .await?
            .into_iter()
            .filter(|s| filter.accepts(s))
            .collect::<Vec<_>>();
        debug!(count = students.len(), ?filter, "students listed");
        Ok(students)
    }

    pub async fn get_student(&mut self, reg_no: &str) -> Result<Option<Student>, RosterError> {
        Ok(self
            .store
            .find_row(&self.sheets.students, STUDENT_REG_NO, reg_no)
            .await?
            .map(|row| Student::from_row(&row)))
    }

    /// Replace the password of a student. Only its hash is stored.
    pub async fn set_password(&mut self, reg_no: &str, password: &str) -> Result<(), RosterError> {
        let mut row = self
            .store
            .find_row(&self.sheets.students, STUDENT_REG_NO, reg_no)
            .await?
            .ok_or_else(|| RosterError::not_found("student", reg_no))?;
        row.set(STUDENT_PASSWORD, hash_password(password)?);
        self.store.save_row(&self.sheets.students, &row).await?;
        info!(reg_no, "password updated");
        Ok(())
    }

    /// The student matching both `reg_no` and `password`. Any failure,
    /// including a store error, gives `None`.
    pub async fn authenticate(&mut self, reg_no: &str, password: &str) -> Option<Student> {
        match self.all_students().await {
            Ok(students) => students
                .into_iter()
                .find(|s| s.reg_no == reg_no && verify_password(&s.password, password)),
            Err(e) => {
                error!(reg_no, error = %e, "cannot authenticate student");
                None
            }
        }
    }

    /// Give a registered student their first password.
    pub async fn create_account(
        &mut self,
        reg_no: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Student, RosterError> {
        validate_account(reg_no, email, password, confirmation)?;
        let student = self
            .get_student(reg_no)
            .await?
            .ok_or_else(|| RosterError::not_found("student", reg_no))?;
        if student.email.to_lowercase() != email.to_lowercase() {
            return Err(RosterError::invalid(
                "email address does not match the registration record",
            ));
        }
        if student.has_password() {
            return Err(RosterError::Conflict(format!(
                "an account already exists for {reg_no}"
            )));
        }
        self.set_password(reg_no, password).await?;
        Ok(student)
    }

    /// Authenticate then find the team of the student and their role in it.
    pub async fn login(
        &mut self,
        reg_no: &str,
        password: &str,
    ) -> Result<Option<Login>, RosterError> {
        let Some(student) = self.authenticate(reg_no, password).await else {
            info!(reg_no, "invalid credentials");
            return Ok(None);
        };
        let team = self.get_team_by_member(reg_no).await?;
        let role = match &team {
            Some(team) if team.is_leader(reg_no) => Role::Leader,
            Some(_) => Role::Member,
            None => Role::None,
        };
        info!(reg_no, %role, "student logged in");
        Ok(Some(Login {
            student,
            team,
            role,
        }))
    }
}
