pub use self::request::{JoinRequest, NewJoinRequest, RequestStatus, is_pending};
pub use self::student::{Student, StudentStatus, assign_row};
pub use self::team::{
    AvailableTeam, CreateTeamRequest, MemberInput, Slot, Team, TeamMember, TeamRecord, TeamUpdate,
    non_blank,
};

mod request;
mod student;
mod team;
