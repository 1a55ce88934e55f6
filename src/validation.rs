//! Input checks performed before any sheet is touched. Every problem found is
//! reported, not only the first one.

use crate::error::RosterError;
use crate::model::{CreateTeamRequest, MemberInput, TeamUpdate};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use url::Url;

pub const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_TEAM_NAME_LENGTH: usize = 100;

fn collected(errors: Vec<String>) -> Result<(), RosterError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RosterError::Validation(errors))
    }
}

/// Registration numbers appearing more than once, in order of first repeat.
pub fn duplicates<'a>(reg_nos: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut repeated = Vec::new();
    for reg_no in reg_nos {
        if !seen.insert(reg_no) && !repeated.iter().any(|r| r == reg_no) {
            repeated.push(reg_no.to_owned());
        }
    }
    repeated
}

pub fn size_error(size: usize, sizes: &RangeInclusive<usize>) -> Option<String> {
    if size < *sizes.start() {
        Some(format!(
            "team must have at least {} members (including leader)",
            sizes.start()
        ))
    } else if size > *sizes.end() {
        Some(format!(
            "team cannot exceed {} members (including leader)",
            sizes.end()
        ))
    } else {
        None
    }
}

fn team_name_error(name: &str) -> Option<String> {
    let length = name.trim().chars().count();
    if length == 0 {
        Some("team name is required".to_owned())
    } else if length < 2 {
        Some("team name must be at least 2 characters long".to_owned())
    } else if length > MAX_TEAM_NAME_LENGTH {
        Some(format!(
            "team name cannot exceed {MAX_TEAM_NAME_LENGTH} characters"
        ))
    } else {
        None
    }
}

fn url_error(link: &str) -> Option<String> {
    if link.trim().is_empty() {
        return None;
    }
    Url::parse(link.trim())
        .err()
        .map(|_| format!("invalid URL {link}"))
}

fn github_error(link: &str) -> Option<String> {
    if link.trim().is_empty() {
        return None;
    }
    match Url::parse(link.trim()) {
        Ok(url) if url.host_str().is_some_and(|h| h.contains("github.com")) => None,
        Ok(_) => Some(format!("GitHub URL {link} must be from github.com")),
        Err(_) => Some(format!("invalid GitHub URL {link}")),
    }
}

fn member_errors(label: &str, member: &MemberInput, errors: &mut Vec<String>) {
    if let Some(e) = github_error(&member.github) {
        errors.push(format!("{label}: {e}"));
    }
    if let Some(e) = url_error(&member.project_link) {
        errors.push(format!("{label}: {e}"));
    }
}

/// Check a team creation form. Members without a registration number are
/// ignored.
pub fn validate_team_request(
    request: &CreateTeamRequest,
    sizes: &RangeInclusive<usize>,
) -> Result<(), RosterError> {
    let mut errors = Vec::new();
    errors.extend(team_name_error(&request.team_name));
    if request.problem_statement_id1.trim().is_empty() {
        errors.push("problem statement ID 1 is required".to_owned());
    }
    if request.leader.reg_no.trim().is_empty() {
        errors.push("team leader is required".to_owned());
    }
    member_errors("leader", &request.leader, &mut errors);
    for (idx, member) in request.members.iter().enumerate() {
        if !member.reg_no.trim().is_empty() {
            member_errors(&format!("member {}", idx + 2), member, &mut errors);
        }
    }
    let participants = request.participants();
    errors.extend(size_error(participants.len(), sizes));
    let repeated = duplicates(participants.iter().map(|m| m.reg_no.as_str()));
    if !repeated.is_empty() {
        errors.push(format!("duplicate students found: {}", repeated.join(", ")));
    }
    collected(errors)
}

/// Check a team edition form and keep only the members with a registration
/// number, in order.
pub fn validate_team_update(
    update: &TeamUpdate,
    sizes: &RangeInclusive<usize>,
) -> Result<TeamUpdate, RosterError> {
    let mut errors = Vec::new();
    if update.team_name.trim().is_empty()
        || update.problem_statement_id1.trim().is_empty()
        || update.leader.reg_no.trim().is_empty()
    {
        errors.push(
            "team name, problem statement ID 1, and team leader are required".to_owned(),
        );
    }
    let members = update
        .members
        .iter()
        .filter(|m| !m.reg_no.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>();
    let needed = sizes.start().saturating_sub(1);
    if members.len() < needed {
        errors.push(format!(
            "team must have at least {needed} members plus the leader"
        ));
    }
    collected(errors)?;
    Ok(TeamUpdate {
        members,
        ..update.clone()
    })
}

pub fn validate_join_request(note: &str, link: &str) -> Result<(), RosterError> {
    let mut errors = Vec::new();
    if note.trim().is_empty() {
        errors.push("skills description is required".to_owned());
    }
    if url_error(link).is_some() {
        errors.push("please provide a valid URL for GitHub/Portfolio link".to_owned());
    }
    collected(errors)
}

/// A presentation link must point to a shared Google Drive document.
pub fn presentation_link_error(link: &str) -> Option<String> {
    if link.is_empty() {
        None
    } else if !link.contains("drive.google.com") {
        Some("PDF link must be a Google Drive link".to_owned())
    } else if !link.contains("usp=sharing") {
        Some(
            "PDF link must include sharing parameter (usp=sharing), enable sharing on the Google Drive file"
                .to_owned(),
        )
    } else {
        None
    }
}

pub fn validate_account(
    reg_no: &str,
    email: &str,
    password: &str,
    confirmation: &str,
) -> Result<(), RosterError> {
    if reg_no.is_empty() || email.is_empty() || password.is_empty() || confirmation.is_empty() {
        return Err(RosterError::invalid("all fields are required"));
    }
    if !email.contains('@') {
        return Err(RosterError::invalid("please enter a valid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RosterError::invalid(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password != confirmation {
        return Err(RosterError::invalid("passwords do not match"));
    }
    Ok(())
}
