use chrono::{Duration, NaiveDate};

use crate::models::{ServiceTimeline, Stage, StageStatus, Status};

fn stage(name: &str, entries: &[(Status, &str, &str)]) -> Stage {
    Stage {
        name: name.to_string(),
        statuses: entries
            .iter()
            .map(|(status, person, role)| StageStatus {
                status: *status,
                assigned_to: Some(person.to_string()),
                assigned_to_role: Some(role.to_string()),
            })
            .collect(),
    }
}

fn days_ago(today: NaiveDate, days: i64) -> String {
    format!("{}T10:00:00Z", (today - Duration::days(days)).format("%Y-%m-%d"))
}

/// Demo engagements used by the portal before real data exists.
pub fn demo_timelines(today: NaiveDate) -> Vec<ServiceTimeline> {
    use Status::{Blocked, Completed, InProgress, Overdue, Pending};

    let engagements = vec![
        (
            "tl-001",
            "client-acme",
            "Acme Financial",
            "Penetration Testing",
            65.0,
            1,
            vec![
                stage("Scoping", &[(Completed, "Priya Shah", "manager")]),
                stage(
                    "External Testing",
                    &[
                        (Completed, "Dev Malik", "tester"),
                        (InProgress, "Lena Ortiz", "tester"),
                    ],
                ),
                stage("Reporting", &[(Pending, "Priya Shah", "manager")]),
            ],
        ),
        (
            "tl-002",
            "client-acme",
            "Acme Financial",
            "Vulnerability Assessment",
            100.0,
            6,
            vec![
                stage("Discovery", &[(Completed, "Lena Ortiz", "tester")]),
                stage("Remediation Review", &[(Completed, "Priya Shah", "manager")]),
            ],
        ),
        (
            "tl-003",
            "client-northwind",
            "Northwind Health",
            "Compliance Audit",
            30.0,
            3,
            vec![
                stage("Evidence Collection", &[(Blocked, "Sam Reyes", "client")]),
                stage("Control Testing", &[(Overdue, "Dev Malik", "tester")]),
            ],
        ),
        (
            "tl-004",
            "client-northwind",
            "Northwind Health",
            "Penetration Testing",
            10.0,
            12,
            vec![stage(
                "Kickoff",
                &[
                    (InProgress, "Priya Shah", "manager"),
                    (Pending, "Sam Reyes", "client"),
                ],
            )],
        ),
        (
            "tl-005",
            "client-orbital",
            "Orbital Logistics",
            "Red Team",
            80.0,
            0,
            vec![
                stage("Reconnaissance", &[(Completed, "Kai Nakamura", "tester")]),
                stage("Initial Access", &[(Completed, "Kai Nakamura", "tester")]),
                stage("Lateral Movement", &[(InProgress, "Dev Malik", "tester")]),
                stage("Debrief", &[(Pending, "Priya Shah", "manager")]),
            ],
        ),
    ];

    engagements
        .into_iter()
        .map(
            |(id, client_id, client_name, service_name, progress, age, stages)| ServiceTimeline {
                id: id.to_string(),
                client_id: client_id.to_string(),
                client_name: Some(client_name.to_string()),
                service_name: service_name.to_string(),
                overall_progress: progress,
                last_updated: days_ago(today, age),
                stages,
            },
        )
        .collect()
}
