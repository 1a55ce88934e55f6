use crate::error::RosterError;
use crate::model::Student;
use crate::sheets::Sheets;
use crate::store::{RecordStore, Row};
use std::ops::RangeInclusive;
use tracing::info;

/// Student directory, team roster and join request queue over one record
/// store. Every operation reads the sheets afresh.
pub struct Roster<S> {
    pub(crate) store: S,
    pub(crate) sheets: Sheets,
    sizes: RangeInclusive<usize>,
}

impl<S: RecordStore> Roster<S> {
    pub fn new(store: S, sheets: Sheets, sizes: RangeInclusive<usize>) -> Self {
        Self {
            store,
            sheets,
            sizes,
        }
    }

    /// Allowed team sizes, leader included.
    pub fn sizes(&self) -> &RangeInclusive<usize> {
        &self.sizes
    }

    pub fn max_size(&self) -> usize {
        *self.sizes.end()
    }

    /// Create the three sheets, or complete their headers.
    pub async fn init(&mut self) -> Result<(), RosterError> {
        for sheet in self.sheets.all() {
            self.store.ensure_sheet(sheet).await?;
            info!(sheet = %sheet.title, "sheet ready");
        }
        Ok(())
    }

    pub(crate) async fn student_rows(&mut self) -> Result<Vec<Row>, RosterError> {
        Ok(self.store.rows(&self.sheets.students).await?)
    }

    pub(crate) async fn team_rows(&mut self) -> Result<Vec<Row>, RosterError> {
        Ok(self.store.rows(&self.sheets.teams).await?)
    }

    pub(crate) async fn request_rows(&mut self) -> Result<Vec<Row>, RosterError> {
        Ok(self.store.rows(&self.sheets.requests).await?)
    }

    /// Every student row, including incomplete ones.
    pub(crate) async fn all_students(&mut self) -> Result<Vec<Student>, RosterError> {
        Ok(self
            .student_rows()
            .await?
            .iter()
            .map(Student::from_row)
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Roster;
    use crate::model::{CreateTeamRequest, MemberInput};
    use crate::sheets::*;
    use crate::store::{MemoryStore, RecordStore};

    /// A roster over an in-memory store holding the given `(reg_no, name)`
    /// students, all available, in department CSE.
    pub async fn roster_with(students: &[(&str, &str)]) -> Roster<MemoryStore> {
        let mut roster = Roster::new(MemoryStore::default(), Sheets::default(), 4..=6);
        roster.init().await.unwrap();
        for (reg_no, name) in students {
            add_student(&mut roster, reg_no, name, "CSE", "II Year").await;
        }
        roster
    }

    pub async fn add_student(
        roster: &mut Roster<MemoryStore>,
        reg_no: &str,
        name: &str,
        dept: &str,
        year: &str,
    ) {
        let cells = [
            (STUDENT_REG_NO, reg_no.to_owned()),
            (STUDENT_NAME, name.to_owned()),
            (STUDENT_EMAIL, format!("{}@uni.edu", reg_no.to_lowercase())),
            (STUDENT_DEPT, dept.to_owned()),
            (STUDENT_YEAR, year.to_owned()),
            (STUDENT_ASSIGNED, NO.to_owned()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
        roster
            .store
            .add_row(&roster.sheets.students, cells)
            .await
            .unwrap();
    }

    pub fn member(reg_no: &str) -> MemberInput {
        MemberInput {
            reg_no: reg_no.to_owned(),
            ..MemberInput::default()
        }
    }

    pub fn team_request(leader: &str, members: &[&str]) -> CreateTeamRequest {
        CreateTeamRequest {
            team_name: "Ferris".to_owned(),
            problem_statement_id1: "PS-1".to_owned(),
            leader: member(leader),
            members: members.iter().map(|m| member(m)).collect(),
            ..CreateTeamRequest::default()
        }
    }
}
