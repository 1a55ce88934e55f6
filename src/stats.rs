use crate::error::RosterError;
use crate::model::{RequestStatus, Student, TeamRecord};
use crate::roster::Roster;
use crate::store::RecordStore;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RosterStats {
    pub students: usize,
    pub assigned: usize,
    /// Number of teams indexed by their size.
    pub team_sizes: Vec<usize>,
    pub with_vacancy: usize,
    pub requests: BTreeMap<RequestStatus, usize>,
}

impl RosterStats {
    pub fn available(&self) -> usize {
        self.students - self.assigned
    }

    pub fn teams(&self) -> usize {
        self.team_sizes.iter().sum()
    }
}

pub fn statistics(
    students: &[Student],
    teams: &[TeamRecord],
    requests: &[RequestStatus],
    max_size: usize,
) -> RosterStats {
    let mut team_sizes = vec![0; max_size.max(1) + 1];
    for team in teams {
        let size = team.occupied();
        if size >= team_sizes.len() {
            team_sizes.resize(size + 1, 0);
        }
        team_sizes[size] += 1;
    }
    let latest = team_sizes.iter().rposition(|&n| n != 0).map_or(0, |n| n + 1);
    team_sizes.truncate(latest);
    let mut by_status = BTreeMap::<RequestStatus, usize>::new();
    for &status in requests {
        *by_status.entry(status).or_default() += 1;
    }
    RosterStats {
        students: students.len(),
        assigned: students.iter().filter(|s| !s.is_available()).count(),
        team_sizes,
        with_vacancy: teams.iter().filter(|t| t.occupied() < max_size).count(),
        requests: by_status,
    }
}

impl<S: RecordStore> Roster<S> {
    pub async fn roster_statistics(&mut self) -> Result<RosterStats, RosterError> {
        let students = self.all_students().await?;
        let teams = self
            .team_rows()
            .await?
            .iter()
            .map(TeamRecord::from_row)
            .collect::<Vec<_>>();
        let requests = self
            .request_rows()
            .await?
            .iter()
            .map(RequestStatus::of_row)
            .collect::<Vec<_>>();
        Ok(statistics(&students, &teams, &requests, self.max_size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Slot;
    use crate::roster::test_support::*;

    fn team(size: usize) -> TeamRecord {
        let mut record = TeamRecord::default();
        for slot in 0..size {
            record.slots[slot] = Slot {
                reg_no: format!("R{slot}"),
                ..Slot::default()
            };
        }
        record
    }

    #[test]
    fn histogram_stops_at_largest_team() {
        let teams = [team(4), team(5), team(4)];
        let stats = statistics(&[], &teams, &[], 6);
        assert_eq!(stats.team_sizes, vec![0, 0, 0, 0, 2, 1]);
        assert_eq!(stats.teams(), 3);
        assert_eq!(stats.with_vacancy, 3);
        assert_eq!(statistics(&[], &[team(6)], &[], 6).with_vacancy, 0);
        assert!(statistics(&[], &[], &[], 6).team_sizes.is_empty());
    }

    #[tokio::test]
    async fn counts_students_and_requests() {
        let mut roster = roster_with(&[
            ("S1", "Ada"),
            ("S2", "Bob"),
            ("S3", "Cyd"),
            ("S4", "Dan"),
            ("S5", "Eve"),
        ])
        .await;
        roster
            .create_team(&team_request("S1", &["S2", "S3", "S4"]))
            .await
            .unwrap();
        let stats = roster.roster_statistics().await.unwrap();
        assert_eq!((stats.students, stats.assigned, stats.available()), (5, 4, 1));
        assert_eq!(stats.team_sizes, vec![0, 0, 0, 0, 1]);
        assert!(stats.requests.is_empty());
    }

    #[test]
    fn requests_are_grouped_by_status() {
        let stats = statistics(
            &[],
            &[],
            &[
                RequestStatus::Pending,
                RequestStatus::Rejected,
                RequestStatus::Pending,
            ],
            6,
        );
        assert_eq!(stats.requests.get(&RequestStatus::Pending), Some(&2));
        assert_eq!(stats.requests.get(&RequestStatus::Accepted), None);
    }
}
