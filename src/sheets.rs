//! Sheet layout. Column headers are the literal strings found in the
//! registration spreadsheet and must not be altered.

use crate::config::SheetsConfig;
use crate::store::Sheet;

pub const STUDENT_TIMESTAMP: &str = "Timestamp";
pub const STUDENT_EMAIL: &str = "Email Address";
pub const STUDENT_NAME: &str = "Full Name";
pub const STUDENT_REG_NO: &str = "University Register Number";
pub const STUDENT_DEPT: &str = "Your Department";
pub const STUDENT_YEAR: &str = "Year ?";
pub const STUDENT_ASSIGNED: &str = "is Assigned to a team?";
pub const STUDENT_TEAM_ID: &str = "AssignedTeamID";
pub const STUDENT_PASSWORD: &str = "Password";

pub const TEAM_ID: &str = "Team ID";
pub const TEAM_NAME: &str = "Team Name";
pub const TEAM_PROBLEM_1: &str = "Problem Statement ID 1";
pub const TEAM_PROBLEM_2: &str = "Problem Statement ID 2";
pub const TEAM_DEPT_NEEDED: &str = "Dept Needed";
pub const TEAM_PPT_1: &str = "PPT Link 1";
pub const TEAM_PPT_2: &str = "PPT Link 2";
pub const TEAM_CREATED_AT: &str = "Created At";

pub const REQUEST_ID: &str = "Request ID";
pub const REQUEST_REG_NO: &str = "Student Reg No";
pub const REQUEST_STUDENT_NAME: &str = "Student Name";
pub const REQUEST_TEAM_ID: &str = "Team ID";
pub const REQUEST_TEAM_NAME: &str = "Team Name";
pub const REQUEST_NOTE: &str = "Note";
pub const REQUEST_LINK: &str = "GitHub/Portfolio Link";
pub const REQUEST_STATUS: &str = "Status";
pub const REQUEST_ACCEPTED: &str = "Accepted";
pub const REQUEST_TIMESTAMP: &str = "Timestamp";

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Number of member slots following the leader slot in a team row.
pub const MEMBER_SLOTS: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotField {
    RegNo,
    Name,
    Github,
    Project,
}

/// Header of a field of slot `slot`, slot 0 being the leader.
pub fn slot_column(slot: usize, field: SlotField) -> String {
    let prefix = if slot == 0 {
        "Team Leader".to_owned()
    } else {
        format!("Member-{slot}")
    };
    let suffix = match field {
        SlotField::RegNo => "Reg NO",
        SlotField::Name => "Name",
        SlotField::Github => "github",
        SlotField::Project => "project",
    };
    format!("{prefix} {suffix}")
}

#[derive(Clone, Debug)]
pub struct Sheets {
    pub students: Sheet,
    pub teams: Sheet,
    pub requests: Sheet,
}

impl Sheets {
    pub fn new(config: &SheetsConfig) -> Self {
        let students = [
            STUDENT_TIMESTAMP,
            STUDENT_EMAIL,
            STUDENT_NAME,
            STUDENT_REG_NO,
            STUDENT_DEPT,
            STUDENT_YEAR,
            STUDENT_ASSIGNED,
            STUDENT_TEAM_ID,
            STUDENT_PASSWORD,
        ];
        let mut teams = [
            TEAM_ID,
            TEAM_NAME,
            TEAM_PROBLEM_1,
            TEAM_PROBLEM_2,
            TEAM_DEPT_NEEDED,
        ]
        .map(String::from)
        .to_vec();
        for slot in 0..=MEMBER_SLOTS {
            for field in [
                SlotField::RegNo,
                SlotField::Name,
                SlotField::Github,
                SlotField::Project,
            ] {
                teams.push(slot_column(slot, field));
            }
        }
        teams.extend([TEAM_PPT_1, TEAM_PPT_2, TEAM_CREATED_AT].map(String::from));
        let requests = [
            REQUEST_ID,
            REQUEST_REG_NO,
            REQUEST_STUDENT_NAME,
            REQUEST_TEAM_ID,
            REQUEST_TEAM_NAME,
            REQUEST_NOTE,
            REQUEST_LINK,
            REQUEST_STATUS,
            REQUEST_ACCEPTED,
            REQUEST_TIMESTAMP,
        ];
        Self {
            students: Sheet::new(&config.students, students.map(String::from).to_vec()),
            teams: Sheet::new(&config.teams, teams),
            requests: Sheet::new(&config.requests, requests.map(String::from).to_vec()),
        }
    }

    pub fn all(&self) -> [&Sheet; 3] {
        [&self.students, &self.teams, &self.requests]
    }
}

impl Default for Sheets {
    fn default() -> Self {
        Self::new(&SheetsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_column() {
        assert_eq!(slot_column(0, SlotField::RegNo), "Team Leader Reg NO");
        assert_eq!(slot_column(0, SlotField::Project), "Team Leader project");
        assert_eq!(slot_column(5, SlotField::Github), "Member-5 github");
        assert_eq!(slot_column(2, SlotField::Name), "Member-2 Name");
    }

    #[test]
    fn team_sheet_has_every_slot() {
        let sheets = Sheets::default();
        assert_eq!(sheets.teams.columns.len(), 5 + 6 * 4 + 3);
        assert!(sheets.teams.columns.contains(&"Member-5 Reg NO".to_owned()));
        assert_eq!(sheets.students.title, "Form Responses 1");
    }
}
