use crate::error::RosterError;
use crate::model::{AvailableTeam, TeamRecord, is_pending, non_blank};
use crate::roster::Roster;
use crate::sheets::{REQUEST_REG_NO, REQUEST_TEAM_ID};
use crate::store::RecordStore;
use std::collections::BTreeMap;
use tracing::debug;

impl<S: RecordStore> Roster<S> {
    /// Teams with at least one open position, with what a prospective member
    /// needs to know about their leader.
    pub async fn list_teams_with_vacancy(&mut self) -> Result<Vec<AvailableTeam>, RosterError> {
        let students = self.all_students().await?;
        let max_members = self.max_size();
        let teams = self
            .team_rows()
            .await?
            .iter()
            .map(TeamRecord::from_row)
            .filter(|record| !record.team_id.is_empty() && record.occupied() < max_members)
            .map(|record| {
                let leader = students
                    .iter()
                    .find(|s| s.reg_no == record.leader().reg_no);
                AvailableTeam {
                    current_member_count: record.occupied(),
                    max_members,
                    leader_name: record.leader().name.clone(),
                    leader_dept: leader.map(|s| s.dept.clone()).unwrap_or_default(),
                    leader_year: leader.map(|s| s.year.clone()).unwrap_or_default(),
                    problem_statement_id2: non_blank(&record.problem_statement_id2),
                    dept_needed: non_blank(&record.dept_needed),
                    team_id: record.team_id,
                    team_name: record.team_name,
                    problem_statement_id1: record.problem_statement_id1,
                }
            })
            .collect::<Vec<_>>();
        debug!(count = teams.len(), "teams with vacancy listed");
        Ok(teams)
    }

    /// Teams to which `reg_no` has a pending request.
    pub async fn pending_request_map(
        &mut self,
        reg_no: &str,
    ) -> Result<BTreeMap<String, bool>, RosterError> {
        Ok(self
            .request_rows()
            .await?
            .iter()
            .filter(|row| row.get(REQUEST_REG_NO) == reg_no && is_pending(row))
            .map(|row| (row.get(REQUEST_TEAM_ID).to_owned(), true))
            .collect())
    }

    pub async fn has_pending_request(
        &mut self,
        reg_no: &str,
        team_id: &str,
    ) -> Result<bool, RosterError> {
        Ok(self.request_rows().await?.iter().any(|row| {
            row.get(REQUEST_REG_NO) == reg_no
                && row.get(REQUEST_TEAM_ID) == team_id
                && is_pending(row)
        }))
    }
}
