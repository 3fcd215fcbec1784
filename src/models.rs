use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Overdue,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Blocked,
        Status::Overdue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
            Status::Blocked => "blocked",
            Status::Overdue => "overdue",
        }
    }

    pub fn parse(raw: &str) -> Option<Status> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pending" => Some(Status::Pending),
            "in-progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            "blocked" => Some(Status::Blocked),
            "overdue" => Some(Status::Overdue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub statuses: Vec<StageStatus>,
}

/// One client's engagement in one service line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTimeline {
    pub id: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub service_name: String,
    pub overall_progress: f64,
    pub last_updated: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl ServiceTimeline {
    pub fn statuses(&self) -> impl Iterator<Item = &StageStatus> {
        self.stages.iter().flat_map(|stage| stage.statuses.iter())
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.statuses().any(|entry| entry.status == status)
    }

    pub fn is_completed(&self) -> bool {
        self.overall_progress >= 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_workflows: usize,
    pub active_workflows: usize,
    pub completed_workflows: usize,
    pub blocked_workflows: usize,
    pub overdue_workflows: usize,
    pub average_progress: f64,
    pub total_clients: usize,
    pub total_services: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
    pub overdue: usize,
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::InProgress => self.in_progress,
            Status::Completed => self.completed,
            Status::Blocked => self.blocked,
            Status::Overdue => self.overdue,
        }
    }

    pub fn increment(&mut self, status: Status) {
        match status {
            Status::Pending => self.pending += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Completed => self.completed += 1,
            Status::Blocked => self.blocked += 1,
            Status::Overdue => self.overdue += 1,
        }
    }
}

/// Raw status counts next to the padded series charts render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDistribution {
    pub counts: StatusCounts,
    pub display: Vec<ChartData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesData {
    pub date: String,
    pub value: f64,
    /// Timelines updated on `date`; tells an empty day from a 0% one.
    pub matched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPerformance {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub total_workflows: usize,
    pub completed_workflows: usize,
    pub average_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeData {
    pub service_name: String,
    pub total_workflows: usize,
    pub completed_workflows: usize,
    pub average_progress: f64,
    pub average_duration_days: f64,
}

/// Status counts for one assignee role. Entries without a role land under
/// `unassigned`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWorkload {
    pub role: String,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}
