use crate::error::RosterError;
use crate::model::{
    CreateTeamRequest, Slot, Student, Team, TeamMember, TeamRecord, TeamUpdate, assign_row,
    non_blank,
};
use crate::roster::Roster;
use crate::sheets::*;
use crate::store::{RecordStore, Row};
use crate::validation::{duplicates, presentation_link_error, size_error};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CreateOutcome {
    Created(String),
    /// Participants already in a team. Nothing has been written.
    Conflicts(Vec<String>),
}

/// Resolve the occupants of `record`. A leader missing from `students` makes
/// the whole team unresolvable; missing members are left out.
fn resolve(record: &TeamRecord, students: &[Student]) -> Option<Team> {
    let member = |slot: usize, s: &Slot| {
        let student = students.iter().find(|st| st.reg_no == s.reg_no)?;
        Some(TeamMember {
            student: student.clone(),
            github: s.github.clone(),
            project_link: s.project.clone(),
            slot,
        })
    };
    let Some(leader) = member(0, record.leader()) else {
        warn!(
            team_id = %record.team_id,
            leader = %record.leader().reg_no,
            "team leader cannot be found among students"
        );
        return None;
    };
    let members = record
        .occupants()
        .filter(|&(slot, _)| slot > 0)
        .filter_map(|(slot, s)| {
            let resolved = member(slot, s);
            if resolved.is_none() {
                warn!(team_id = %record.team_id, reg_no = %s.reg_no, "team member cannot be found among students");
            }
            resolved
        })
        .collect();
    Some(Team {
        team_id: record.team_id.clone(),
        team_name: record.team_name.clone(),
        problem_statement_id1: record.problem_statement_id1.clone(),
        problem_statement_id2: non_blank(&record.problem_statement_id2),
        dept_needed: non_blank(&record.dept_needed),
        leader,
        members,
        ppt_link1: record.ppt_link1.clone(),
        ppt_link2: record.ppt_link2.clone(),
        created_at: record.created_at.clone(),
    })
}

fn find_team<'a>(rows: &'a mut [Row], team_id: &str) -> Result<&'a mut Row, RosterError> {
    rows.iter_mut()
        .find(|row| !team_id.is_empty() && row.get(TEAM_ID) == team_id)
        .ok_or_else(|| RosterError::not_found("team", team_id))
}

impl<S: RecordStore> Roster<S> {
    /// Create a team from its leader and members. All participants are
    /// checked before anything is written: an unknown student aborts the
    /// operation, students already in a team are reported as conflicts.
    pub async fn create_team(
        &mut self,
        request: &CreateTeamRequest,
    ) -> Result<CreateOutcome, RosterError> {
        let participants = request.participants();
        if participants.iter().any(|p| p.reg_no.is_empty()) {
            return Err(RosterError::invalid("team leader is required"));
        }
        let repeated = duplicates(participants.iter().map(|p| p.reg_no.as_str()));
        if !repeated.is_empty() {
            return Err(RosterError::DuplicateStudents(repeated));
        }
        if let Some(e) = size_error(participants.len(), self.sizes()) {
            return Err(RosterError::invalid(e));
        }
        let mut student_rows = self.student_rows().await?;
        let mut conflicts = Vec::new();
        let mut accepted = Vec::new();
        for participant in &participants {
            let idx = student_rows
                .iter()
                .position(|row| row.get(STUDENT_REG_NO) == participant.reg_no)
                .ok_or_else(|| RosterError::not_found("student", &participant.reg_no))?;
            if Student::from_row(&student_rows[idx]).is_available() {
                accepted.push((idx, participant));
            } else {
                conflicts.push(participant.reg_no.clone());
            }
        }
        if !conflicts.is_empty() {
            info!(?conflicts, "team not created, students already assigned");
            return Ok(CreateOutcome::Conflicts(conflicts));
        }

        let team_id = Uuid::new_v4().to_string();
        let mut record = TeamRecord {
            team_id: team_id.clone(),
            team_name: request.team_name.trim().to_owned(),
            problem_statement_id1: request.problem_statement_id1.trim().to_owned(),
            problem_statement_id2: request.problem_statement_id2.clone().unwrap_or_default(),
            dept_needed: request.dept_needed.clone().unwrap_or_default(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ..TeamRecord::default()
        };
        for (slot, &(idx, participant)) in accepted.iter().enumerate() {
            record.slots[slot] = Slot {
                reg_no: participant.reg_no.clone(),
                name: student_rows[idx].get(STUDENT_NAME).to_owned(),
                github: participant.github.clone(),
                project: participant.project_link.clone(),
            };
        }
        self.store
            .add_row(&self.sheets.teams, record.to_cells())
            .await?;
        for &(idx, _) in &accepted {
            let row = &mut student_rows[idx];
            assign_row(row, &team_id);
            self.store.save_row(&self.sheets.students, row).await?;
        }
        info!(
            team_id = %team_id,
            team_name = %record.team_name,
            size = accepted.len(),
            "team created"
        );
        Ok(CreateOutcome::Created(team_id))
    }

    /// Update the team metadata and the links of the current occupants,
    /// matched by position. Who occupies a slot never changes here.
    pub async fn update_team(
        &mut self,
        team_id: &str,
        update: &TeamUpdate,
    ) -> Result<TeamRecord, RosterError> {
        let mut rows = self.team_rows().await?;
        let row = find_team(&mut rows, team_id)?;
        let current = TeamRecord::from_row(row);
        row.set(TEAM_NAME, update.team_name.trim());
        row.set(TEAM_PROBLEM_1, update.problem_statement_id1.trim());
        row.set(
            TEAM_PROBLEM_2,
            update.problem_statement_id2.clone().unwrap_or_default(),
        );
        row.set(TEAM_DEPT_NEEDED, update.dept_needed.clone().unwrap_or_default());
        row.set(&slot_column(0, SlotField::Github), update.leader.github.as_str());
        row.set(
            &slot_column(0, SlotField::Project),
            update.leader.project_link.as_str(),
        );
        for (idx, member) in update.members.iter().take(MEMBER_SLOTS).enumerate() {
            let slot = idx + 1;
            if member.reg_no != current.slots[slot].reg_no {
                warn!(
                    team_id,
                    slot,
                    occupant = %current.slots[slot].reg_no,
                    requested = %member.reg_no,
                    "membership changes are not applied by a team update"
                );
            }
            row.set(&slot_column(slot, SlotField::Github), member.github.as_str());
            row.set(
                &slot_column(slot, SlotField::Project),
                member.project_link.as_str(),
            );
        }
        self.store.save_row(&self.sheets.teams, row).await?;
        info!(team_id, "team updated");
        Ok(TeamRecord::from_row(row))
    }

    /// The team holding `reg_no` as leader or member.
    pub async fn get_team_by_member(&mut self, reg_no: &str) -> Result<Option<Team>, RosterError> {
        let record = self
            .team_rows()
            .await?
            .iter()
            .map(TeamRecord::from_row)
            .find(|record| record.contains(reg_no));
        let Some(record) = record else {
            debug!(reg_no, "student is in no team");
            return Ok(None);
        };
        let students = self.all_students().await?;
        Ok(resolve(&record, &students))
    }

    pub async fn get_team_by_id(&mut self, team_id: &str) -> Result<Option<Team>, RosterError> {
        let Some(record) = self.get_team_record(team_id).await? else {
            return Ok(None);
        };
        let students = self.all_students().await?;
        Ok(resolve(&record, &students))
    }

    pub async fn get_team_record(
        &mut self,
        team_id: &str,
    ) -> Result<Option<TeamRecord>, RosterError> {
        Ok(self
            .team_rows()
            .await?
            .iter()
            .find(|row| !team_id.is_empty() && row.get(TEAM_ID) == team_id)
            .map(TeamRecord::from_row))
    }

    /// Store the presentation links of a team. A link can only be given for
    /// a problem statement the team has chosen, and an empty link clears the
    /// stored one.
    pub async fn update_presentation_links(
        &mut self,
        team_id: &str,
        link1: &str,
        link2: &str,
    ) -> Result<(), RosterError> {
        let errors = [link1, link2]
            .iter()
            .enumerate()
            .filter_map(|(idx, link)| {
                presentation_link_error(link.trim()).map(|e| format!("link {}: {e}", idx + 1))
            })
            .collect::<Vec<_>>();
        if !errors.is_empty() {
            return Err(RosterError::Validation(errors));
        }
        let mut rows = self.team_rows().await?;
        let row = find_team(&mut rows, team_id)?;
        if !link1.trim().is_empty() && row.get(TEAM_PROBLEM_1).is_empty() {
            return Err(RosterError::invalid(
                "cannot submit PDF link 1 without problem statement ID 1",
            ));
        }
        if !link2.trim().is_empty() && row.get(TEAM_PROBLEM_2).is_empty() {
            return Err(RosterError::invalid(
                "cannot submit PDF link 2 without problem statement ID 2",
            ));
        }
        row.set(TEAM_PPT_1, link1.trim());
        row.set(TEAM_PPT_2, link2.trim());
        self.store.save_row(&self.sheets.teams, row).await?;
        info!(team_id, "presentation links updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StudentStatus;
    use crate::roster::test_support::*;
    use crate::store::MemoryStore;

    async fn created(roster: &mut Roster<MemoryStore>, leader: &str, members: &[&str]) -> String {
        match roster.create_team(&team_request(leader, members)).await.unwrap() {
            CreateOutcome::Created(team_id) => team_id,
            CreateOutcome::Conflicts(c) => panic!("unexpected conflicts {c:?}"),
        }
    }

    async fn team_count(roster: &mut Roster<MemoryStore>) -> usize {
        roster.team_rows().await.unwrap().len()
    }

    fn six() -> [(&'static str, &'static str); 6] {
        [
            ("S1", "Ada"),
            ("S2", "Bob"),
            ("S3", "Cyd"),
            ("S4", "Dan"),
            ("S5", "Eve"),
            ("S6", "Fay"),
        ]
    }

    #[tokio::test]
    async fn creation_assigns_every_participant() {
        let mut roster = roster_with(&six()).await;
        let team_id = created(&mut roster, "S1", &["S2", "S3", "S4"]).await;
        assert_eq!(team_count(&mut roster).await, 1);
        for reg_no in ["S1", "S2", "S3", "S4"] {
            let student = roster.get_student(reg_no).await.unwrap().unwrap();
            assert_eq!(student.status, StudentStatus::Assigned);
            assert_eq!(student.assigned_team_id, team_id);
        }
        let s5 = roster.get_student("S5").await.unwrap().unwrap();
        assert!(s5.is_available());
        let record = roster.get_team_record(&team_id).await.unwrap().unwrap();
        assert_eq!(record.leader().name, "Ada");
        assert_eq!(record.slots[3].reg_no, "S4");
        assert!(record.slots[4].is_free() && record.slots[5].is_free());
    }

    #[tokio::test]
    async fn conflicts_leave_everything_untouched() {
        let mut roster = roster_with(&six()).await;
        created(&mut roster, "S1", &["S2", "S3", "S4"]).await;
        let outcome = roster
            .create_team(&team_request("S5", &["S6", "S2", "S3"]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Conflicts(vec!["S2".to_owned(), "S3".to_owned()])
        );
        assert_eq!(team_count(&mut roster).await, 1);
        for reg_no in ["S5", "S6"] {
            assert!(roster.get_student(reg_no).await.unwrap().unwrap().is_available());
        }
    }

    #[tokio::test]
    async fn duplicates_are_refused_before_any_write() {
        let mut roster = roster_with(&six()).await;
        for request in [
            team_request("S1", &["S2", "S3", "S1"]),
            team_request("S1", &["S2", "S3", "S3"]),
        ] {
            assert!(matches!(
                roster.create_team(&request).await,
                Err(RosterError::DuplicateStudents(_))
            ));
        }
        assert_eq!(team_count(&mut roster).await, 0);
        assert!(roster.get_student("S1").await.unwrap().unwrap().is_available());
    }

    #[tokio::test]
    async fn padded_registration_numbers_match_students() {
        let mut roster = roster_with(&six()).await;
        let team_id = created(&mut roster, " S1", &["S2 ", " S3 ", "S4"]).await;
        let record = roster.get_team_record(&team_id).await.unwrap().unwrap();
        assert_eq!(record.leader().reg_no, "S1");
        assert_eq!(record.slots[2].reg_no, "S3");
        assert!(!roster.get_student("S3").await.unwrap().unwrap().is_available());
        assert!(matches!(
            roster.create_team(&team_request("S5", &["S6", "S6 ", "S2"])).await,
            Err(RosterError::DuplicateStudents(_))
        ));
    }

    #[tokio::test]
    async fn unknown_student_aborts_creation() {
        let mut roster = roster_with(&six()).await;
        assert!(matches!(
            roster.create_team(&team_request("S1", &["S2", "S3", "S9"])).await,
            Err(RosterError::NotFound { what: "student", .. })
        ));
        assert_eq!(team_count(&mut roster).await, 0);
    }

    #[tokio::test]
    async fn size_bounds_are_enforced() {
        let mut roster = roster_with(&six()).await;
        assert!(matches!(
            roster.create_team(&team_request("S1", &["S2", "S3"])).await,
            Err(RosterError::Validation(_))
        ));
        created(&mut roster, "S1", &["S2", "S3", "S4", "S5", "S6"]).await;
    }

    #[tokio::test]
    async fn lookup_by_member_and_id() {
        let mut roster = roster_with(&six()).await;
        let team_id = created(&mut roster, "S1", &["S2", "S3", "S4"]).await;
        let team = roster.get_team_by_member("S3").await.unwrap().unwrap();
        assert_eq!(team.team_id, team_id);
        assert_eq!(team.leader.student.full_name, "Ada");
        assert_eq!(
            team.members.iter().map(|m| m.slot).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(roster.get_team_by_member("S5").await.unwrap().is_none());
        assert_eq!(
            roster.get_team_by_id(&team_id).await.unwrap().unwrap().size(),
            4
        );
        assert!(roster.get_team_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unresolvable_leader_reads_as_no_team() {
        let mut roster = roster_with(&six()).await;
        let team_id = created(&mut roster, "S1", &["S2", "S3", "S4"]).await;
        let mut row = roster
            .store
            .find_row(&roster.sheets.students, STUDENT_REG_NO, "S1")
            .await
            .unwrap()
            .unwrap();
        row.set(STUDENT_REG_NO, "S1-renamed");
        roster
            .store
            .save_row(&roster.sheets.students, &row)
            .await
            .unwrap();
        assert!(roster.get_team_by_id(&team_id).await.unwrap().is_none());
        assert!(roster.get_team_by_member("S2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_only_touches_metadata_and_links() {
        let mut roster = roster_with(&six()).await;
        let team_id = created(&mut roster, "S1", &["S2", "S3", "S4"]).await;
        let mut update = TeamUpdate {
            team_name: "Crabs".to_owned(),
            problem_statement_id1: "PS-7".to_owned(),
            problem_statement_id2: Some("PS-8".to_owned()),
            dept_needed: Some("ECE".to_owned()),
            leader: member("S1"),
            members: vec![member("S2"), member("S6"), member("S4")],
        };
        update.leader.github = "https://github.com/ada".to_owned();
        update.members[1].project_link = "https://example.org/p".to_owned();
        let record = roster.update_team(&team_id, &update).await.unwrap();
        assert_eq!(record.team_name, "Crabs");
        assert_eq!(record.problem_statement_id2, "PS-8");
        assert_eq!(record.leader().github, "https://github.com/ada");
        assert_eq!(record.slots[2].reg_no, "S3");
        assert_eq!(record.slots[2].project, "https://example.org/p");
        assert!(roster.get_student("S6").await.unwrap().unwrap().is_available());
        assert!(matches!(
            roster.update_team("nope", &update).await,
            Err(RosterError::NotFound { what: "team", .. })
        ));
    }

    #[tokio::test]
    async fn presentation_links_need_their_problem_statement() {
        let mut roster = roster_with(&six()).await;
        let team_id = created(&mut roster, "S1", &["S2", "S3", "S4"]).await;
        let link = "https://drive.google.com/file/d/abc/view?usp=sharing";
        roster
            .update_presentation_links(&team_id, link, "")
            .await
            .unwrap();
        assert_eq!(
            roster.get_team_record(&team_id).await.unwrap().unwrap().ppt_link1,
            link
        );
        assert!(matches!(
            roster.update_presentation_links(&team_id, "", link).await,
            Err(RosterError::Validation(_))
        ));
        assert!(matches!(
            roster
                .update_presentation_links(&team_id, "https://example.org/a.pdf", "")
                .await,
            Err(RosterError::Validation(_))
        ));
        assert!(matches!(
            roster.update_presentation_links("nope", link, "").await,
            Err(RosterError::NotFound { .. })
        ));
    }
}
