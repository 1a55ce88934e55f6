use crate::sheets::*;
use crate::store::Row;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// Status of a request row. Rows written before the status column was
    /// filled in, with both `Status` and `Accepted` blank, are pending.
    /// Anything neither pending nor accepted is considered rejected.
    pub fn from_cells(status: &str, accepted: &str) -> Self {
        let status = status.trim();
        if status == "Pending" || (status.is_empty() && accepted.trim().is_empty()) {
            Self::Pending
        } else if status == "Accepted" || (status.is_empty() && accepted.trim() == YES) {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }

    pub fn of_row(row: &Row) -> Self {
        Self::from_cells(row.get(REQUEST_STATUS), row.get(REQUEST_ACCEPTED))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// The pending predicate shared by every reader of the request sheet.
pub fn is_pending(row: &Row) -> bool {
    RequestStatus::of_row(row) == RequestStatus::Pending
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinRequest {
    pub id: String,
    pub student_reg_no: String,
    pub student_name: String,
    pub team_id: String,
    pub team_name: String,
    pub note: String,
    pub github_portfolio_link: String,
    pub status: RequestStatus,
    pub accepted: bool,
    pub timestamp: String,
}

impl JoinRequest {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(REQUEST_ID).to_owned(),
            student_reg_no: row.get(REQUEST_REG_NO).to_owned(),
            student_name: row.get(REQUEST_STUDENT_NAME).to_owned(),
            team_id: row.get(REQUEST_TEAM_ID).to_owned(),
            team_name: row.get(REQUEST_TEAM_NAME).to_owned(),
            note: row.get(REQUEST_NOTE).to_owned(),
            github_portfolio_link: row.get(REQUEST_LINK).to_owned(),
            status: RequestStatus::of_row(row),
            accepted: row.get(REQUEST_ACCEPTED) == YES,
            timestamp: row.get(REQUEST_TIMESTAMP).to_owned(),
        }
    }
}

/// A join request as submitted by a prospective member.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NewJoinRequest {
    pub team_id: String,
    pub note: String,
    pub github_portfolio_link: String,
    pub student_reg_no: String,
    pub student_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells() {
        assert_eq!(RequestStatus::from_cells("Pending", "No"), RequestStatus::Pending);
        assert_eq!(RequestStatus::from_cells("", ""), RequestStatus::Pending);
        assert_eq!(RequestStatus::from_cells("  ", " "), RequestStatus::Pending);
        assert_eq!(RequestStatus::from_cells("Accepted", "Yes"), RequestStatus::Accepted);
        assert_eq!(RequestStatus::from_cells("", "Yes"), RequestStatus::Accepted);
        assert_eq!(RequestStatus::from_cells("Rejected", "No"), RequestStatus::Rejected);
        assert_eq!(RequestStatus::from_cells("", "No"), RequestStatus::Rejected);
    }
}
