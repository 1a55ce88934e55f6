use crate::sheets::*;
use crate::store::Row;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StudentStatus {
    Available,
    Assigned,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Assigned => write!(f, "Assigned"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Student {
    pub reg_no: String,
    pub full_name: String,
    pub email: String,
    pub dept: String,
    pub year: String,
    pub status: StudentStatus,
    pub assigned_team_id: String,
    pub password: String,
    pub created_at: String,
}

impl Student {
    pub fn from_row(row: &Row) -> Self {
        Self {
            reg_no: row.get(STUDENT_REG_NO).to_owned(),
            full_name: row.get(STUDENT_NAME).to_owned(),
            email: row.get(STUDENT_EMAIL).to_owned(),
            dept: row.get(STUDENT_DEPT).to_owned(),
            year: row.get(STUDENT_YEAR).to_owned(),
            status: if row.get(STUDENT_ASSIGNED) == YES {
                StudentStatus::Assigned
            } else {
                StudentStatus::Available
            },
            assigned_team_id: row.get(STUDENT_TEAM_ID).to_owned(),
            password: row.get(STUDENT_PASSWORD).to_owned(),
            created_at: row.get(STUDENT_TIMESTAMP).to_owned(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == StudentStatus::Available
    }

    pub fn has_password(&self) -> bool {
        !self.password.trim().is_empty()
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name, self.reg_no)
    }
}

/// Mark the student held by `row` as member of `team_id`.
pub fn assign_row(row: &mut Row, team_id: &str) {
    row.set(STUDENT_ASSIGNED, YES);
    row.set(STUDENT_TEAM_ID, team_id);
}
