use crate::error::RosterError;
use crate::model::{JoinRequest, NewJoinRequest, RequestStatus, Slot, Student, TeamRecord};
use crate::model::{assign_row, is_pending};
use crate::roster::Roster;
use crate::sheets::*;
use crate::store::{RecordStore, Row};
use crate::validation::validate_join_request;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

fn find_request<'a>(rows: &'a mut [Row], request_id: &str) -> Result<&'a mut Row, RosterError> {
    rows.iter_mut()
        .find(|row| !request_id.is_empty() && row.get(REQUEST_ID) == request_id)
        .ok_or_else(|| RosterError::not_found("request", request_id))
}

impl<S: RecordStore> Roster<S> {
    /// Append a pending request to join a team. Several pending requests for
    /// the same student and team may coexist.
    pub async fn create_request(&mut self, request: &NewJoinRequest) -> Result<String, RosterError> {
        validate_join_request(&request.note, &request.github_portfolio_link)?;
        let team = self
            .get_team_record(&request.team_id)
            .await?
            .ok_or_else(|| RosterError::not_found("team", &request.team_id))?;
        let request_id = Uuid::new_v4().to_string();
        let cells = [
            (REQUEST_ID, request_id.clone()),
            (REQUEST_REG_NO, request.student_reg_no.clone()),
            (REQUEST_STUDENT_NAME, request.student_name.clone()),
            (REQUEST_TEAM_ID, team.team_id),
            (REQUEST_TEAM_NAME, team.team_name),
            (REQUEST_NOTE, request.note.trim().to_owned()),
            (REQUEST_LINK, request.github_portfolio_link.trim().to_owned()),
            (REQUEST_STATUS, RequestStatus::Pending.to_string()),
            (REQUEST_ACCEPTED, NO.to_owned()),
            (
                REQUEST_TIMESTAMP,
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ]
        .into_iter()
        .map(|(column, value)| (column.to_owned(), value))
        .collect();
        self.store.add_row(&self.sheets.requests, cells).await?;
        info!(
            request_id = %request_id,
            reg_no = %request.student_reg_no,
            team_id = %request.team_id,
            "join request created"
        );
        Ok(request_id)
    }

    /// Pending requests of a team. Rows lacking an identifier are given one,
    /// which is persisted.
    pub async fn list_pending_for_team(
        &mut self,
        team_id: &str,
    ) -> Result<Vec<JoinRequest>, RosterError> {
        let mut pending = Vec::new();
        for mut row in self.request_rows().await? {
            if row.get(REQUEST_TEAM_ID) != team_id || !is_pending(&row) {
                continue;
            }
            if row.get(REQUEST_ID).trim().is_empty() {
                let request_id = Uuid::new_v4().to_string();
                row.set(REQUEST_ID, request_id.as_str());
                self.store.save_row(&self.sheets.requests, &row).await?;
                info!(
                    request_id = %request_id,
                    row = row.position(),
                    "request identifier backfilled"
                );
            }
            pending.push(JoinRequest::from_row(&row));
        }
        debug!(team_id, count = pending.len(), "pending requests listed");
        Ok(pending)
    }

    /// Place the requesting student in the lowest free member slot of the
    /// team. The team row is written first, then the student row, then the
    /// request row.
    pub async fn accept_request(&mut self, request_id: &str) -> Result<(), RosterError> {
        let mut requests = self.request_rows().await?;
        let request_row = find_request(&mut requests, request_id)?;
        if !is_pending(request_row) {
            return Err(RosterError::NotPending(request_id.to_owned()));
        }
        let request = JoinRequest::from_row(request_row);

        let mut teams = self.team_rows().await?;
        let team_row = teams
            .iter_mut()
            .find(|row| !request.team_id.is_empty() && row.get(TEAM_ID) == request.team_id)
            .ok_or_else(|| RosterError::not_found("team", &request.team_id))?;
        let mut students = self.student_rows().await?;
        let student_row = students
            .iter_mut()
            .find(|row| row.get(STUDENT_REG_NO) == request.student_reg_no)
            .ok_or_else(|| RosterError::not_found("student", &request.student_reg_no))?;
        let student = Student::from_row(student_row);
        if !student.is_available() {
            return Err(RosterError::Conflict(format!(
                "{student} is already assigned to team {}",
                student.assigned_team_id
            )));
        }

        let mut record = TeamRecord::from_row(team_row);
        if record.occupied() >= self.max_size() {
            return Err(RosterError::TeamFull(record.team_id));
        }
        let Some(slot) = record.first_free_slot() else {
            return Err(RosterError::TeamFull(record.team_id));
        };
        let name = if request.student_name.is_empty() {
            student.full_name.clone()
        } else {
            request.student_name.clone()
        };
        record.slots[slot] = Slot {
            reg_no: request.student_reg_no.clone(),
            name,
            github: request.github_portfolio_link.clone(),
            project: String::new(),
        };
        record.write_slot(team_row, slot);
        self.store.save_row(&self.sheets.teams, team_row).await?;
        assign_row(student_row, &record.team_id);
        self.store.save_row(&self.sheets.students, student_row).await?;
        request_row.set(REQUEST_STATUS, RequestStatus::Accepted.to_string());
        request_row.set(REQUEST_ACCEPTED, YES);
        self.store.save_row(&self.sheets.requests, request_row).await?;
        info!(
            request_id,
            reg_no = %request.student_reg_no,
            team_id = %record.team_id,
            slot,
            "join request accepted"
        );
        Ok(())
    }

    /// Mark a pending request as rejected. The `Accepted` cell is left as is.
    pub async fn reject_request(&mut self, request_id: &str) -> Result<(), RosterError> {
        let mut requests = self.request_rows().await?;
        let row = find_request(&mut requests, request_id)?;
        if !is_pending(row) {
            warn!(request_id, status = %RequestStatus::of_row(row), "cannot reject request");
            return Err(RosterError::NotPending(request_id.to_owned()));
        }
        row.set(REQUEST_STATUS, RequestStatus::Rejected.to_string());
        self.store.save_row(&self.sheets.requests, row).await?;
        info!(request_id, "join request rejected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::test_support::*;
    use crate::store::MemoryStore;
    use crate::teams::CreateOutcome;

    async fn roster_and_team(extra: &[(&str, &str)]) -> (Roster<MemoryStore>, String) {
        let mut students = vec![("S1", "Ada"), ("S2", "Bob"), ("S3", "Cyd"), ("S4", "Dan")];
        students.extend_from_slice(extra);
        let mut roster = roster_with(&students).await;
        let CreateOutcome::Created(team_id) = roster
            .create_team(&team_request("S1", &["S2", "S3", "S4"]))
            .await
            .unwrap()
        else {
            panic!("team not created");
        };
        (roster, team_id)
    }

    fn join(team_id: &str, reg_no: &str, name: &str) -> NewJoinRequest {
        NewJoinRequest {
            team_id: team_id.to_owned(),
            note: "backend skills".to_owned(),
            github_portfolio_link: format!("https://github.com/{}", reg_no.to_lowercase()),
            student_reg_no: reg_no.to_owned(),
            student_name: name.to_owned(),
        }
    }

    async fn request(roster: &mut Roster<MemoryStore>, request_id: &str) -> JoinRequest {
        let row = roster
            .store
            .find_row(&roster.sheets.requests, REQUEST_ID, request_id)
            .await
            .unwrap()
            .unwrap();
        JoinRequest::from_row(&row)
    }

    #[tokio::test]
    async fn join_and_accept_scenario() {
        let (mut roster, team_id) = roster_and_team(&[("S5", "Eve")]).await;
        let request_id = roster
            .create_request(&join(&team_id, "S5", "Eve"))
            .await
            .unwrap();
        let created = request(&mut roster, &request_id).await;
        assert_eq!(created.status, RequestStatus::Pending);
        assert!(!created.accepted);
        assert_eq!(created.team_name, "Ferris");
        let pending = roster.list_pending_for_team(&team_id).await.unwrap();
        assert_eq!(pending.len(), 1);

        roster.accept_request(&request_id).await.unwrap();
        let student = roster.get_student("S5").await.unwrap().unwrap();
        assert!(!student.is_available());
        assert_eq!(student.assigned_team_id, team_id);
        let record = roster.get_team_record(&team_id).await.unwrap().unwrap();
        assert_eq!(record.occupied(), 5);
        assert_eq!(record.slots[4].reg_no, "S5");
        assert_eq!(record.slots[4].name, "Eve");
        assert_eq!(record.slots[4].github, "https://github.com/s5");
        assert_eq!(record.slots[4].project, "");
        let accepted = request(&mut roster, &request_id).await;
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(accepted.accepted);
        assert!(roster.list_pending_for_team(&team_id).await.unwrap().is_empty());

        assert!(matches!(
            roster.accept_request(&request_id).await,
            Err(RosterError::NotPending(_))
        ));
        assert_eq!(
            roster.get_team_record(&team_id).await.unwrap().unwrap().occupied(),
            5
        );
    }

    #[tokio::test]
    async fn lowest_free_slot_wins() {
        let (mut roster, team_id) = roster_and_team(&[("S5", "Eve")]).await;
        let mut rows = roster.team_rows().await.unwrap();
        let row = &mut rows[0];
        row.set(&slot_column(2, SlotField::RegNo), "");
        row.set(&slot_column(2, SlotField::Name), "");
        roster.store.save_row(&roster.sheets.teams, row).await.unwrap();
        let request_id = roster
            .create_request(&join(&team_id, "S5", "Eve"))
            .await
            .unwrap();
        roster.accept_request(&request_id).await.unwrap();
        let record = roster.get_team_record(&team_id).await.unwrap().unwrap();
        assert_eq!(record.slots[2].reg_no, "S5");
        assert!(record.slots[4].is_free());
    }

    #[tokio::test]
    async fn full_team_refuses_without_mutation() {
        let (mut roster, team_id) =
            roster_and_team(&[("S5", "Eve"), ("S6", "Fay"), ("S7", "Gus")]).await;
        for (reg_no, name) in [("S5", "Eve"), ("S6", "Fay")] {
            let id = roster
                .create_request(&join(&team_id, reg_no, name))
                .await
                .unwrap();
            roster.accept_request(&id).await.unwrap();
        }
        let request_id = roster
            .create_request(&join(&team_id, "S7", "Gus"))
            .await
            .unwrap();
        let before = roster.get_team_record(&team_id).await.unwrap().unwrap();
        assert_eq!(before.occupied(), 6);
        assert!(matches!(
            roster.accept_request(&request_id).await,
            Err(RosterError::TeamFull(_))
        ));
        assert_eq!(roster.get_team_record(&team_id).await.unwrap().unwrap(), before);
        assert!(roster.get_student("S7").await.unwrap().unwrap().is_available());
        assert_eq!(
            request(&mut roster, &request_id).await.status,
            RequestStatus::Pending
        );
    }

    #[tokio::test]
    async fn reject_then_accept_fails() {
        let (mut roster, team_id) = roster_and_team(&[("S5", "Eve")]).await;
        let request_id = roster
            .create_request(&join(&team_id, "S5", "Eve"))
            .await
            .unwrap();
        roster.reject_request(&request_id).await.unwrap();
        let rejected = request(&mut roster, &request_id).await;
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert!(!rejected.accepted);
        assert!(matches!(
            roster.accept_request(&request_id).await,
            Err(RosterError::NotPending(_))
        ));
        assert!(matches!(
            roster.reject_request(&request_id).await,
            Err(RosterError::NotPending(_))
        ));
        assert!(roster.get_student("S5").await.unwrap().unwrap().is_available());
    }

    #[tokio::test]
    async fn assigned_student_cannot_be_accepted_twice() {
        let (mut roster, team_id) = roster_and_team(&[("S5", "Eve")]).await;
        let first = roster
            .create_request(&join(&team_id, "S5", "Eve"))
            .await
            .unwrap();
        let second = roster
            .create_request(&join(&team_id, "S5", "Eve"))
            .await
            .unwrap();
        roster.accept_request(&first).await.unwrap();
        assert!(matches!(
            roster.accept_request(&second).await,
            Err(RosterError::Conflict(_))
        ));
        assert_eq!(
            roster.get_team_record(&team_id).await.unwrap().unwrap().occupied(),
            5
        );
    }

    #[tokio::test]
    async fn unknown_targets_are_not_found() {
        let (mut roster, _) = roster_and_team(&[("S5", "Eve")]).await;
        assert!(matches!(
            roster.create_request(&join("nope", "S5", "Eve")).await,
            Err(RosterError::NotFound { what: "team", .. })
        ));
        assert!(matches!(
            roster.accept_request("").await,
            Err(RosterError::NotFound { .. })
        ));
        assert!(matches!(
            roster.reject_request("nope").await,
            Err(RosterError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn legacy_rows_get_an_identifier() {
        let (mut roster, team_id) = roster_and_team(&[("S5", "Eve")]).await;
        let cells = [
            (REQUEST_REG_NO, "S5"),
            (REQUEST_STUDENT_NAME, "Eve"),
            (REQUEST_TEAM_ID, team_id.as_str()),
            (REQUEST_NOTE, "frontend"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        roster
            .store
            .add_row(&roster.sheets.requests, cells)
            .await
            .unwrap();
        let pending = roster.list_pending_for_team(&team_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        let request_id = pending[0].id.clone();
        assert!(!request_id.is_empty());
        assert_eq!(request(&mut roster, &request_id).await.note, "frontend");
        let again = roster.list_pending_for_team(&team_id).await.unwrap();
        assert_eq!(again[0].id, request_id);
        roster.accept_request(&request_id).await.unwrap();
    }

    #[tokio::test]
    async fn stale_team_row_is_refused() {
        let (mut roster, team_id) = roster_and_team(&[("S5", "Eve")]).await;
        let mut stale = roster.team_rows().await.unwrap().remove(0);
        let request_id = roster
            .create_request(&join(&team_id, "S5", "Eve"))
            .await
            .unwrap();
        roster.accept_request(&request_id).await.unwrap();
        stale.set(&slot_column(4, SlotField::RegNo), "S9");
        assert!(matches!(
            roster.store.save_row(&roster.sheets.teams, &stale).await,
            Err(crate::store::StoreError::StaleRow(_))
        ));
    }
}
