use super::Student;
use crate::sheets::*;
use crate::store::Row;
use serde::Deserialize;

/// One of the six roster positions of a team row. Empty strings mark a free
/// position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Slot {
    pub reg_no: String,
    pub name: String,
    pub github: String,
    pub project: String,
}

impl Slot {
    pub fn is_free(&self) -> bool {
        self.reg_no.is_empty()
    }
}

/// A team row as stored: slot 0 is the leader, slots 1 to 5 the members.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TeamRecord {
    pub team_id: String,
    pub team_name: String,
    pub problem_statement_id1: String,
    pub problem_statement_id2: String,
    pub dept_needed: String,
    pub slots: [Slot; MEMBER_SLOTS + 1],
    pub ppt_link1: String,
    pub ppt_link2: String,
    pub created_at: String,
}

impl TeamRecord {
    pub fn from_row(row: &Row) -> Self {
        let slots = std::array::from_fn(|slot| Slot {
            reg_no: row.get(&slot_column(slot, SlotField::RegNo)).to_owned(),
            name: row.get(&slot_column(slot, SlotField::Name)).to_owned(),
            github: row.get(&slot_column(slot, SlotField::Github)).to_owned(),
            project: row.get(&slot_column(slot, SlotField::Project)).to_owned(),
        });
        Self {
            team_id: row.get(TEAM_ID).to_owned(),
            team_name: row.get(TEAM_NAME).to_owned(),
            problem_statement_id1: row.get(TEAM_PROBLEM_1).to_owned(),
            problem_statement_id2: row.get(TEAM_PROBLEM_2).to_owned(),
            dept_needed: row.get(TEAM_DEPT_NEEDED).to_owned(),
            slots,
            ppt_link1: row.get(TEAM_PPT_1).to_owned(),
            ppt_link2: row.get(TEAM_PPT_2).to_owned(),
            created_at: row.get(TEAM_CREATED_AT).to_owned(),
        }
    }

    /// Cells of a new team row, free slots written as empty strings.
    pub fn to_cells(&self) -> Vec<(String, String)> {
        let mut cells = vec![
            (TEAM_ID.to_owned(), self.team_id.clone()),
            (TEAM_NAME.to_owned(), self.team_name.clone()),
            (TEAM_PROBLEM_1.to_owned(), self.problem_statement_id1.clone()),
            (TEAM_PROBLEM_2.to_owned(), self.problem_statement_id2.clone()),
            (TEAM_DEPT_NEEDED.to_owned(), self.dept_needed.clone()),
        ];
        for (idx, slot) in self.slots.iter().enumerate() {
            cells.push((slot_column(idx, SlotField::RegNo), slot.reg_no.clone()));
            cells.push((slot_column(idx, SlotField::Name), slot.name.clone()));
            cells.push((slot_column(idx, SlotField::Github), slot.github.clone()));
            cells.push((slot_column(idx, SlotField::Project), slot.project.clone()));
        }
        cells.push((TEAM_PPT_1.to_owned(), self.ppt_link1.clone()));
        cells.push((TEAM_PPT_2.to_owned(), self.ppt_link2.clone()));
        cells.push((TEAM_CREATED_AT.to_owned(), self.created_at.clone()));
        cells
    }

    /// Copy slot `slot` into `row`.
    pub fn write_slot(&self, row: &mut Row, slot: usize) {
        let s = &self.slots[slot];
        row.set(&slot_column(slot, SlotField::RegNo), s.reg_no.as_str());
        row.set(&slot_column(slot, SlotField::Name), s.name.as_str());
        row.set(&slot_column(slot, SlotField::Github), s.github.as_str());
        row.set(&slot_column(slot, SlotField::Project), s.project.as_str());
    }

    pub fn leader(&self) -> &Slot {
        &self.slots[0]
    }

    pub fn members(&self) -> &[Slot] {
        &self.slots[1..]
    }

    /// Number of students on the team. The leader always counts.
    pub fn occupied(&self) -> usize {
        1 + self.members().iter().filter(|s| !s.is_free()).count()
    }

    /// Lowest numbered free member slot.
    pub fn first_free_slot(&self) -> Option<usize> {
        (1..=MEMBER_SLOTS).find(|&slot| self.slots[slot].is_free())
    }

    pub fn contains(&self, reg_no: &str) -> bool {
        self.slots.iter().any(|s| !s.is_free() && s.reg_no == reg_no)
    }

    pub fn occupants(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots.iter().enumerate().filter(|(_, s)| !s.is_free())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TeamMember {
    pub student: Student,
    pub github: String,
    pub project_link: String,
    pub slot: usize,
}

/// A team whose occupants have been resolved against the student sheet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Team {
    pub team_id: String,
    pub team_name: String,
    pub problem_statement_id1: String,
    pub problem_statement_id2: Option<String>,
    pub dept_needed: Option<String>,
    pub leader: TeamMember,
    pub members: Vec<TeamMember>,
    pub ppt_link1: String,
    pub ppt_link2: String,
    pub created_at: String,
}

impl Team {
    pub fn size(&self) -> usize {
        1 + self.members.len()
    }

    pub fn is_leader(&self, reg_no: &str) -> bool {
        self.leader.student.reg_no == reg_no
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AvailableTeam {
    pub team_id: String,
    pub team_name: String,
    pub problem_statement_id1: String,
    pub problem_statement_id2: Option<String>,
    pub dept_needed: Option<String>,
    pub current_member_count: usize,
    pub max_members: usize,
    pub leader_name: String,
    pub leader_dept: String,
    pub leader_year: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct MemberInput {
    pub reg_no: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub project_link: String,
}

/// Team creation form.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub problem_statement_id1: String,
    pub problem_statement_id2: Option<String>,
    pub dept_needed: Option<String>,
    pub leader: MemberInput,
    #[serde(default)]
    pub members: Vec<MemberInput>,
}

impl CreateTeamRequest {
    /// Leader then members with a registration number, in order, with
    /// surrounding whitespace removed from registration numbers.
    pub fn participants(&self) -> Vec<MemberInput> {
        std::iter::once(&self.leader)
            .chain(self.members.iter().filter(|m| !m.reg_no.trim().is_empty()))
            .map(|m| MemberInput {
                reg_no: m.reg_no.trim().to_owned(),
                ..m.clone()
            })
            .collect()
    }
}

/// Team edition form. Registration numbers only identify positions, the
/// occupants themselves are never changed through it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct TeamUpdate {
    pub team_name: String,
    pub problem_statement_id1: String,
    pub problem_statement_id2: Option<String>,
    pub dept_needed: Option<String>,
    pub leader: MemberInput,
    #[serde(default)]
    pub members: Vec<MemberInput>,
}

pub fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}
