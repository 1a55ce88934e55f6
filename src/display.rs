use crate::checks::Anomaly;
use crate::directory::Login;
use crate::model::{AvailableTeam, JoinRequest, RequestStatus, Student, Team, TeamRecord};
use crate::stats::RosterStats;
use std::collections::BTreeMap;

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

pub fn display_students(students: &[Student]) {
    let mut students = students.iter().collect::<Vec<_>>();
    students.sort_by_key(|s| (s.dept.clone(), s.full_name.clone()));
    for s in students {
        println!("  - {} [{}, {}] {}", s, or_dash(&s.dept), or_dash(&s.year), s.status);
    }
}

pub fn display_student(student: &Student) {
    println!("{student}");
    println!("  email: {}", or_dash(&student.email));
    println!("  department: {}", or_dash(&student.dept));
    println!("  year: {}", or_dash(&student.year));
    print!("  status: {}", student.status);
    if !student.is_available() {
        print!(" (team {})", or_dash(&student.assigned_team_id));
    }
    println!();
    println!(
        "  account: {}",
        if student.has_password() { "yes" } else { "no" }
    );
}

pub fn display_team(team: &Team) {
    println!("{} ({})", team.team_name, team.team_id);
    print!("  problem statements: {}", team.problem_statement_id1);
    if let Some(ps2) = &team.problem_statement_id2 {
        print!(", {ps2}");
    }
    println!();
    if let Some(dept) = &team.dept_needed {
        println!("  department needed: {dept}");
    }
    println!("  members ({}):", team.size());
    for member in std::iter::once(&team.leader).chain(&team.members) {
        print!("  - {}", member.student);
        if member.slot == 0 {
            print!(" (leader)");
        } else {
            print!(" (slot {})", member.slot);
        }
        if !member.github.is_empty() {
            print!(" {}", member.github);
        }
        println!();
    }
    for (idx, link) in [&team.ppt_link1, &team.ppt_link2].iter().enumerate() {
        if !link.is_empty() {
            println!("  presentation {}: {link}", idx + 1);
        }
    }
}

pub fn display_team_record(team: &TeamRecord) {
    println!("{} ({})", team.team_name, team.team_id);
    for (slot, occupant) in team.occupants() {
        println!("  - slot {slot}: {} ({})", occupant.name, occupant.reg_no);
    }
}

/// Teams with room left. Teams the student already asked to join are flagged.
pub fn display_vacancies(teams: &[AvailableTeam], pending: &BTreeMap<String, bool>) {
    if teams.is_empty() {
        println!("No team with vacancy");
        return;
    }
    let mut teams = teams.iter().collect::<Vec<_>>();
    teams.sort_by_key(|t| t.team_name.clone());
    println!("Teams with vacancy:");
    for t in teams {
        print!(
            "  - {} ({}) {}/{}, led by {} [{}, {}]",
            t.team_name,
            t.team_id,
            t.current_member_count,
            t.max_members,
            t.leader_name,
            or_dash(&t.leader_dept),
            or_dash(&t.leader_year)
        );
        if let Some(dept) = &t.dept_needed {
            print!(", needs {dept}");
        }
        if pending.get(&t.team_id).copied().unwrap_or(false) {
            print!(" (request pending)");
        }
        println!();
    }
}

pub fn display_requests(requests: &[JoinRequest]) {
    if requests.is_empty() {
        println!("No pending request");
        return;
    }
    for r in requests {
        println!(
            "  - {}: {} ({}) at {}",
            r.id,
            r.student_name,
            r.student_reg_no,
            or_dash(&r.timestamp)
        );
        println!("      {}", r.note);
        if !r.github_portfolio_link.is_empty() {
            println!("      {}", r.github_portfolio_link);
        }
    }
}

pub fn display_login(login: &Login) {
    println!("Welcome {}", login.student);
    match &login.team {
        Some(team) => println!("  {} of {} ({})", login.role, team.team_name, team.team_id),
        None => println!("  not in a team"),
    }
}

pub fn display_anomalies(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        println!("Roster is consistent");
    } else {
        println!("Inconsistencies found:");
        for a in anomalies {
            println!("  - {a}");
        }
    }
}

pub fn display_stats(stats: &RosterStats) {
    println!(
        "Students assigned/available/total: {}/{}/{}",
        stats.assigned,
        stats.available(),
        stats.students
    );
    let total = stats.teams();
    println!(
        "Teams: {} ({} with vacancy)",
        total, stats.with_vacancy
    );
    for (size, n) in stats.team_sizes.iter().enumerate() {
        if *n != 0 {
            println!(
                "  - {} members: {} ({:.2}%)",
                size,
                n,
                100.0 * *n as f32 / total as f32
            );
        }
    }
    println!("Requests:");
    for status in [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::Rejected,
    ] {
        println!(
            "  - {}: {}",
            status,
            stats.requests.get(&status).copied().unwrap_or(0)
        );
    }
}
