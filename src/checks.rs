use crate::error::RosterError;
use crate::model::{Student, TeamRecord};
use crate::roster::Roster;
use crate::store::RecordStore;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Anomaly {
    /// A student occupies slots in several teams.
    MultipleTeams { reg_no: String, team_ids: Vec<String> },
    UnknownOccupant { reg_no: String, team_id: String },
    /// The student row does not point back at the team holding the student.
    AssignmentMismatch {
        reg_no: String,
        team_id: String,
        recorded: Option<String>,
    },
    Unplaced { reg_no: String, team_id: String },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleTeams { reg_no, team_ids } => {
                write!(f, "student {reg_no} is in teams {}", team_ids.join(", "))
            }
            Self::UnknownOccupant { reg_no, team_id } => {
                write!(f, "team {team_id} holds unknown student {reg_no}")
            }
            Self::AssignmentMismatch {
                reg_no,
                team_id,
                recorded: None,
            } => write!(
                f,
                "student {reg_no} is in team {team_id} but is not marked as assigned"
            ),
            Self::AssignmentMismatch {
                reg_no,
                team_id,
                recorded: Some(recorded),
            } => write!(
                f,
                "student {reg_no} is in team {team_id} but is recorded in team {recorded:?}"
            ),
            Self::Unplaced { reg_no, team_id } => write!(
                f,
                "student {reg_no} is assigned to team {team_id:?} but occupies no slot"
            ),
        }
    }
}

/// Cross-check team slots against student assignments.
pub fn anomalies(teams: &[TeamRecord], students: &[Student]) -> Vec<Anomaly> {
    let mut placements: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for team in teams {
        for (_, slot) in team.occupants() {
            placements
                .entry(slot.reg_no.as_str())
                .or_default()
                .push(team.team_id.as_str());
        }
    }
    let mut found = Vec::new();
    for (&reg_no, team_ids) in &placements {
        if team_ids.len() > 1 {
            found.push(Anomaly::MultipleTeams {
                reg_no: reg_no.to_owned(),
                team_ids: team_ids.iter().map(|&t| t.to_owned()).collect(),
            });
        }
        let team_id = team_ids[0].to_owned();
        match students.iter().find(|s| s.reg_no == reg_no) {
            None => found.push(Anomaly::UnknownOccupant {
                reg_no: reg_no.to_owned(),
                team_id,
            }),
            Some(student) if student.is_available() => found.push(Anomaly::AssignmentMismatch {
                reg_no: reg_no.to_owned(),
                team_id,
                recorded: None,
            }),
            Some(student) if !team_ids.contains(&student.assigned_team_id.as_str()) => {
                found.push(Anomaly::AssignmentMismatch {
                    reg_no: reg_no.to_owned(),
                    team_id,
                    recorded: Some(student.assigned_team_id.clone()),
                })
            }
            Some(_) => (),
        }
    }
    for student in students {
        if !student.is_available() && !placements.contains_key(student.reg_no.as_str()) {
            found.push(Anomaly::Unplaced {
                reg_no: student.reg_no.clone(),
                team_id: student.assigned_team_id.clone(),
            });
        }
    }
    found
}

impl<S: RecordStore> Roster<S> {
    pub async fn check_roster_consistency(&mut self) -> Result<Vec<Anomaly>, RosterError> {
        let teams = self
            .team_rows()
            .await?
            .iter()
            .map(TeamRecord::from_row)
            .collect::<Vec<_>>();
        let students = self.all_students().await?;
        let found = anomalies(&teams, &students);
        for anomaly in &found {
            warn!("{anomaly}");
        }
        Ok(found)
    }
}
