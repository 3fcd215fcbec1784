use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};

use crate::config::{AveragingPolicy, DashboardConfig, MAX_TREND_DAYS};
use crate::error::AggregateError;
use crate::models::{
    ChartData, ClientPerformance, DashboardMetrics, ServiceTimeline, ServiceTypeData, Status,
    StatusCounts, StatusDistribution, TeamWorkload, TimeSeriesData,
};

pub const UNASSIGNED_ROLE: &str = "unassigned";

/// Read-only summary views over a snapshot of service timelines.
///
/// Every operation recomputes from the borrowed slice, so calling one twice
/// yields the same output. Grouped rows keep the order in which their key
/// first appears in the snapshot.
pub struct DashboardDataProcessor<'a> {
    timelines: &'a [ServiceTimeline],
    today: NaiveDate,
    trend_start: NaiveDate,
    config: &'a DashboardConfig,
}

impl<'a> DashboardDataProcessor<'a> {
    pub fn new(
        timelines: &'a [ServiceTimeline],
        today: NaiveDate,
        config: &'a DashboardConfig,
    ) -> Result<Self, AggregateError> {
        for timeline in timelines {
            validate_timeline(timeline)?;
        }

        let trend_start = trend_window_start(today, config.trend_days)?;

        Ok(Self {
            timelines,
            today,
            trend_start,
            config,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn overall_metrics(&self) -> Result<DashboardMetrics, AggregateError> {
        if self.timelines.is_empty() {
            return Err(AggregateError::EmptyInput);
        }

        let count_with = |status: Status| {
            self.timelines
                .iter()
                .filter(|timeline| timeline.has_status(status))
                .count()
        };

        let total = self.timelines.len();
        let progress_sum: f64 = self.timelines.iter().map(|t| t.overall_progress).sum();
        let clients: HashSet<&str> = self
            .timelines
            .iter()
            .map(|t| t.client_id.as_str())
            .collect();
        let services: HashSet<&str> = self
            .timelines
            .iter()
            .map(|t| t.service_name.as_str())
            .collect();

        Ok(DashboardMetrics {
            total_workflows: total,
            active_workflows: count_with(Status::InProgress),
            completed_workflows: self.timelines.iter().filter(|t| t.is_completed()).count(),
            blocked_workflows: count_with(Status::Blocked),
            overdue_workflows: count_with(Status::Overdue),
            average_progress: (progress_sum / total as f64).round(),
            total_clients: clients.len(),
            total_services: services.len(),
        })
    }

    pub fn stage_status_distribution(&self) -> StatusDistribution {
        let mut counts = StatusCounts::default();
        for entry in self.timelines.iter().flat_map(|t| t.statuses()) {
            counts.increment(entry.status);
        }

        let floors = &self.config.display_floors;
        let display = Status::ALL
            .iter()
            .map(|&status| ChartData {
                name: status.label().to_string(),
                value: floors.apply(status, counts.get(status)),
            })
            .collect();

        StatusDistribution { counts, display }
    }

    pub fn client_performance(&self) -> Vec<ClientPerformance> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<(ClientPerformance, RunningAverage)> = Vec::new();

        for timeline in self.timelines {
            let slot = *index.entry(timeline.client_id.as_str()).or_insert_with(|| {
                rows.push((
                    ClientPerformance {
                        client_id: timeline.client_id.clone(),
                        client_name: timeline.client_name.clone(),
                        total_workflows: 0,
                        completed_workflows: 0,
                        average_progress: 0.0,
                    },
                    RunningAverage::new(self.config.averaging),
                ));
                rows.len() - 1
            });

            let (row, progress) = &mut rows[slot];
            row.total_workflows += 1;
            if timeline.is_completed() {
                row.completed_workflows += 1;
            }
            if row.client_name.is_none() {
                row.client_name = timeline.client_name.clone();
            }
            progress.push(timeline.overall_progress);
        }

        rows.into_iter()
            .map(|(mut row, progress)| {
                row.average_progress = progress.value();
                row
            })
            .collect()
    }

    pub fn service_type_analysis(&self) -> Vec<ServiceTypeData> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<(ServiceTypeData, RunningAverage, RunningAverage)> = Vec::new();

        for timeline in self.timelines {
            let slot = *index
                .entry(timeline.service_name.as_str())
                .or_insert_with(|| {
                    rows.push((
                        ServiceTypeData {
                            service_name: timeline.service_name.clone(),
                            total_workflows: 0,
                            completed_workflows: 0,
                            average_progress: 0.0,
                            average_duration_days: 0.0,
                        },
                        RunningAverage::new(self.config.averaging),
                        RunningAverage::new(self.config.averaging),
                    ));
                    rows.len() - 1
                });

            let (row, progress, duration) = &mut rows[slot];
            row.total_workflows += 1;
            if timeline.is_completed() {
                row.completed_workflows += 1;
            }
            progress.push(timeline.overall_progress);
            duration.push(self.days_since_update(timeline) as f64);
        }

        rows.into_iter()
            .map(|(mut row, progress, duration)| {
                row.average_progress = progress.value();
                row.average_duration_days = duration.value();
                row
            })
            .collect()
    }

    /// One point per calendar day, oldest first, ending at `today`.
    ///
    /// A day matches a timeline when `lastUpdated` starts with the day's
    /// `YYYY-MM-DD` string. Days with no match report 0 with `matched == 0`.
    pub fn timeline_trends(&self) -> impl Iterator<Item = TimeSeriesData> + '_ {
        // the window was checked in `new`, so every day up to `today` exists
        self.trend_start
            .iter_days()
            .take(self.config.trend_days)
            .map(move |day| {
                let date = day.format("%Y-%m-%d").to_string();
                let matching: Vec<f64> = self
                    .timelines
                    .iter()
                    .filter(|timeline| timeline.last_updated.starts_with(&date))
                    .map(|timeline| timeline.overall_progress)
                    .collect();

                let value = if matching.is_empty() {
                    log::debug!("no timelines updated on {date}");
                    0.0
                } else {
                    (matching.iter().sum::<f64>() / matching.len() as f64).round()
                };

                TimeSeriesData {
                    date,
                    value,
                    matched: matching.len(),
                }
            })
    }

    pub fn team_workload(&self) -> Vec<TeamWorkload> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<TeamWorkload> = Vec::new();

        for entry in self.timelines.iter().flat_map(|t| t.statuses()) {
            let role = entry.assigned_to_role.as_deref().unwrap_or(UNASSIGNED_ROLE);
            let slot = *index.entry(role).or_insert_with(|| {
                rows.push(TeamWorkload {
                    role: role.to_string(),
                    in_progress: 0,
                    completed: 0,
                    overdue: 0,
                });
                rows.len() - 1
            });

            let row = &mut rows[slot];
            match entry.status {
                Status::InProgress => row.in_progress += 1,
                Status::Completed => row.completed += 1,
                Status::Overdue => row.overdue += 1,
                Status::Pending | Status::Blocked => {}
            }
        }

        rows
    }

    fn days_since_update(&self, timeline: &ServiceTimeline) -> i64 {
        parse_day(&timeline.last_updated)
            .map(|day| (self.today - day).num_days().max(0))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
struct RunningAverage {
    policy: AveragingPolicy,
    count: usize,
    sum: f64,
    folded: f64,
}

impl RunningAverage {
    fn new(policy: AveragingPolicy) -> Self {
        Self {
            policy,
            count: 0,
            sum: 0.0,
            folded: 0.0,
        }
    }

    fn push(&mut self, value: f64) {
        self.folded = if self.count == 0 {
            value
        } else {
            (self.folded + value) / 2.0
        };
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        match self.policy {
            AveragingPolicy::Fold => self.folded,
            AveragingPolicy::Mean if self.count == 0 => 0.0,
            AveragingPolicy::Mean => self.sum / self.count as f64,
        }
    }
}

/// First day of a `days`-long window whose last day is `today`.
fn trend_window_start(today: NaiveDate, days: usize) -> Result<NaiveDate, AggregateError> {
    let out_of_range = || AggregateError::TrendWindow { days, today };
    if days == 0 || days > MAX_TREND_DAYS {
        return Err(out_of_range());
    }
    let span = i64::try_from(days - 1).map_err(|_| out_of_range())?;
    today
        .checked_sub_signed(Duration::days(span))
        .ok_or_else(out_of_range)
}

pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn validate_timeline(timeline: &ServiceTimeline) -> Result<(), AggregateError> {
    let progress = timeline.overall_progress;
    if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
        return Err(AggregateError::ProgressOutOfRange {
            timeline_id: timeline.id.clone(),
            progress,
        });
    }

    if parse_day(&timeline.last_updated).is_none() {
        return Err(AggregateError::InvalidDate {
            timeline_id: timeline.id.clone(),
            value: timeline.last_updated.clone(),
        });
    }

    if let Some(stage) = timeline.stages.iter().find(|stage| stage.statuses.is_empty()) {
        return Err(AggregateError::MalformedTimeline {
            timeline_id: timeline.id.clone(),
            stage: stage.name.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayFloors;
    use crate::models::{Stage, StageStatus};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn entry(status: Status, role: Option<&str>) -> StageStatus {
        StageStatus {
            status,
            assigned_to: None,
            assigned_to_role: role.map(str::to_string),
        }
    }

    fn timeline(
        id: &str,
        client: &str,
        service: &str,
        progress: f64,
        last_updated: &str,
        statuses: Vec<StageStatus>,
    ) -> ServiceTimeline {
        ServiceTimeline {
            id: id.to_string(),
            client_id: client.to_string(),
            client_name: None,
            service_name: service.to_string(),
            overall_progress: progress,
            last_updated: last_updated.to_string(),
            stages: vec![Stage {
                name: "Testing".to_string(),
                statuses,
            }],
        }
    }

    fn sample() -> Vec<ServiceTimeline> {
        vec![
            timeline(
                "t1",
                "acme",
                "Penetration Testing",
                100.0,
                "2026-10-19T08:00:00Z",
                vec![entry(Status::Completed, Some("tester"))],
            ),
            timeline(
                "t2",
                "acme",
                "Compliance Audit",
                45.0,
                "2026-10-18",
                vec![
                    entry(Status::InProgress, Some("tester")),
                    entry(Status::Blocked, Some("manager")),
                ],
            ),
            timeline(
                "t3",
                "globex",
                "Penetration Testing",
                20.0,
                "2026-10-09",
                vec![entry(Status::Overdue, None), entry(Status::Pending, None)],
            ),
        ]
    }

    #[test]
    fn overall_metrics_counts_and_rounds() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let metrics = processor.overall_metrics().unwrap();

        assert_eq!(metrics.total_workflows, 3);
        assert_eq!(metrics.active_workflows, 1);
        assert_eq!(metrics.completed_workflows, 1);
        assert_eq!(metrics.blocked_workflows, 1);
        assert_eq!(metrics.overdue_workflows, 1);
        assert_eq!(metrics.average_progress, 55.0);
        assert_eq!(metrics.total_clients, 2);
        assert_eq!(metrics.total_services, 2);
    }

    #[test]
    fn empty_snapshot_is_an_error_not_nan() {
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&[], today(), &config).unwrap();
        assert!(matches!(
            processor.overall_metrics(),
            Err(AggregateError::EmptyInput)
        ));
        assert!(processor.client_performance().is_empty());
        assert!(processor.team_workload().is_empty());
    }

    #[test]
    fn stage_without_statuses_is_malformed() {
        let mut timelines = sample();
        timelines[1].stages.push(Stage {
            name: "Reporting".to_string(),
            statuses: Vec::new(),
        });
        let config = DashboardConfig::default();
        let err = DashboardDataProcessor::new(&timelines, today(), &config)
            .err()
            .unwrap();
        match err {
            AggregateError::MalformedTimeline { timeline_id, stage } => {
                assert_eq!(timeline_id, "t2");
                assert_eq!(stage, "Reporting");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn progress_and_dates_are_validated() {
        let config = DashboardConfig::default();

        let mut timelines = sample();
        timelines[0].overall_progress = 140.0;
        assert!(matches!(
            DashboardDataProcessor::new(&timelines, today(), &config),
            Err(AggregateError::ProgressOutOfRange { .. })
        ));

        let mut timelines = sample();
        timelines[2].last_updated = "last week".to_string();
        assert!(matches!(
            DashboardDataProcessor::new(&timelines, today(), &config),
            Err(AggregateError::InvalidDate { .. })
        ));
    }

    #[test]
    fn distribution_keeps_true_counts_and_pads_display() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let distribution = processor.stage_status_distribution();

        assert_eq!(distribution.counts.completed, 1);
        assert_eq!(distribution.counts.in_progress, 1);
        assert_eq!(distribution.counts.blocked, 1);
        assert_eq!(distribution.counts.overdue, 1);
        assert_eq!(distribution.counts.pending, 1);

        for (status, point) in Status::ALL.iter().zip(distribution.display.iter()) {
            assert_eq!(point.name, status.label());
            assert!(point.value >= config.display_floors.floor_for(*status));
            assert!(point.value >= distribution.counts.get(*status));
        }
    }

    #[test]
    fn zero_floors_report_true_counts() {
        let timelines = sample();
        let config = DashboardConfig {
            display_floors: DisplayFloors::none(),
            ..DashboardConfig::default()
        };
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let distribution = processor.stage_status_distribution();
        let values: Vec<usize> = distribution.display.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn single_timeline_client_reports_its_own_progress() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let rows = processor.client_performance();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].client_id, "globex");
        assert_eq!(rows[1].total_workflows, 1);
        assert_eq!(rows[1].average_progress, 20.0);
    }

    #[test]
    fn fold_average_diverges_from_true_mean() {
        let pending = || vec![entry(Status::Pending, None)];
        let timelines = vec![
            timeline("a", "acme", "Red Team", 100.0, "2026-10-19", pending()),
            timeline("b", "acme", "Red Team", 0.0, "2026-10-19", pending()),
        ];
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let rows = processor.client_performance();
        assert_eq!(rows[0].average_progress, 50.0);
        assert_eq!(rows[0].completed_workflows, 1);

        let mut timelines = timelines;
        timelines.push(timeline("c", "acme", "Red Team", 0.0, "2026-10-19", pending()));
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        assert_eq!(processor.client_performance()[0].average_progress, 25.0);

        let mean_config = DashboardConfig {
            averaging: AveragingPolicy::Mean,
            ..DashboardConfig::default()
        };
        let processor = DashboardDataProcessor::new(&timelines, today(), &mean_config).unwrap();
        let mean = processor.client_performance()[0].average_progress;
        assert!((mean - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn service_analysis_folds_progress_and_duration() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let rows = processor.service_type_analysis();

        assert_eq!(rows.len(), 2);
        let pentest = &rows[0];
        assert_eq!(pentest.service_name, "Penetration Testing");
        assert_eq!(pentest.total_workflows, 2);
        assert_eq!(pentest.completed_workflows, 1);
        assert_eq!(pentest.average_progress, 60.0);
        // 0 days, then 10 days
        assert_eq!(pentest.average_duration_days, 5.0);

        let audit = &rows[1];
        assert_eq!(audit.average_duration_days, 1.0);
    }

    #[test]
    fn trends_cover_thirty_days_ending_today() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let trends: Vec<TimeSeriesData> = processor.timeline_trends().collect();

        assert_eq!(trends.len(), 30);
        assert_eq!(trends[0].date, "2026-09-20");
        assert_eq!(trends[29].date, "2026-10-19");
        assert_eq!(trends[29].value, 100.0);
        assert_eq!(trends[28].value, 45.0);
        assert_eq!(trends[19].date, "2026-10-09");
        assert_eq!(trends[19].value, 20.0);
        assert_eq!(trends[10].value, 0.0);
        assert_eq!(trends[10].matched, 0);
        assert!(trends.iter().all(|p| (0.0..=100.0).contains(&p.value)));
    }

    #[test]
    fn custom_trend_window_has_exactly_that_many_days() {
        let timelines = sample();
        let config = DashboardConfig {
            trend_days: 7,
            ..DashboardConfig::default()
        };
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let trends: Vec<TimeSeriesData> = processor.timeline_trends().collect();

        assert_eq!(trends.len(), 7);
        assert_eq!(trends[0].date, "2026-10-13");
        assert_eq!(trends[6].date, "2026-10-19");
        assert_eq!(trends[6].matched, 1);

        let config = DashboardConfig {
            trend_days: 1,
            ..DashboardConfig::default()
        };
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let dates: Vec<String> = processor.timeline_trends().map(|p| p.date).collect();
        assert_eq!(dates, vec!["2026-10-19".to_string()]);
    }

    #[test]
    fn trend_window_outside_calendar_is_rejected() {
        let oversized = DashboardConfig {
            trend_days: 200_000_000,
            ..DashboardConfig::default()
        };
        assert!(matches!(
            DashboardDataProcessor::new(&[], today(), &oversized),
            Err(AggregateError::TrendWindow { days: 200_000_000, .. })
        ));

        let empty_window = DashboardConfig {
            trend_days: 0,
            ..DashboardConfig::default()
        };
        assert!(matches!(
            DashboardDataProcessor::new(&[], today(), &empty_window),
            Err(AggregateError::TrendWindow { .. })
        ));

        let config = DashboardConfig::default();
        assert!(matches!(
            DashboardDataProcessor::new(&[], NaiveDate::MIN, &config),
            Err(AggregateError::TrendWindow { .. })
        ));
    }

    #[test]
    fn zero_progress_day_is_counted_as_matched() {
        let timelines = vec![timeline(
            "z",
            "initech",
            "Red Team",
            0.0,
            "2026-10-17",
            vec![entry(Status::Pending, None)],
        )];
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let trends: Vec<TimeSeriesData> = processor.timeline_trends().collect();

        assert_eq!(trends[27].date, "2026-10-17");
        assert_eq!(trends[27].value, 0.0);
        assert_eq!(trends[27].matched, 1);
        assert_eq!(trends[26].matched, 0);
    }

    #[test]
    fn workload_groups_by_role() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();
        let rows = processor.team_workload();

        assert_eq!(
            rows,
            vec![
                TeamWorkload {
                    role: "tester".to_string(),
                    in_progress: 1,
                    completed: 1,
                    overdue: 0,
                },
                TeamWorkload {
                    role: "manager".to_string(),
                    in_progress: 0,
                    completed: 0,
                    overdue: 0,
                },
                TeamWorkload {
                    role: UNASSIGNED_ROLE.to_string(),
                    in_progress: 0,
                    completed: 0,
                    overdue: 1,
                },
            ]
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let timelines = sample();
        let config = DashboardConfig::default();
        let processor = DashboardDataProcessor::new(&timelines, today(), &config).unwrap();

        assert_eq!(
            processor.overall_metrics().unwrap(),
            processor.overall_metrics().unwrap()
        );
        assert_eq!(
            processor.stage_status_distribution(),
            processor.stage_status_distribution()
        );
        assert_eq!(processor.client_performance(), processor.client_performance());
        assert_eq!(
            processor.service_type_analysis(),
            processor.service_type_analysis()
        );
        assert_eq!(
            processor.timeline_trends().collect::<Vec<_>>(),
            processor.timeline_trends().collect::<Vec<_>>()
        );
        assert_eq!(processor.team_workload(), processor.team_workload());
        assert_eq!(timelines, sample());
    }
}
