use std::collections::HashMap;
use std::path::Path;

use uuid::Uuid;

use crate::error::ImportError;
use crate::models::{ServiceTimeline, Stage, StageStatus, Status};

pub fn load_snapshot(path: &Path) -> Result<Vec<ServiceTimeline>, ImportError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let timelines = if is_csv {
        import_csv(path)?
    } else {
        load_json(path)?
    };
    log::info!("loaded {} timelines from {}", timelines.len(), path.display());
    Ok(timelines)
}

pub fn load_json(path: &Path) -> Result<Vec<ServiceTimeline>, ImportError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ImportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json(path: &Path, timelines: &[ServiceTimeline]) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(timelines)?;
    std::fs::write(path, body)?;
    Ok(())
}

/// Builds timelines from one row per status entry.
///
/// Rows sharing a `timeline_id` (or, when that column is blank, the same
/// client and service) form one timeline; rows sharing a `stage_name` inside
/// it form one stage. Order of first appearance is kept for both.
pub fn import_csv(csv_path: &Path) -> Result<Vec<ServiceTimeline>, ImportError> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        timeline_id: Option<String>,
        client_id: String,
        client_name: Option<String>,
        service_name: String,
        overall_progress: f64,
        last_updated: String,
        stage_name: String,
        status: String,
        assigned_to: Option<String>,
        assigned_to_role: Option<String>,
    }

    let csv_error = |source| ImportError::Csv {
        path: csv_path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(csv_path).map_err(csv_error)?;
    let mut keys: HashMap<String, usize> = HashMap::new();
    let mut timelines: Vec<ServiceTimeline> = Vec::new();

    for (offset, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(csv_error)?;
        // header is line 1
        let line = offset as u64 + 2;

        let status = Status::parse(&row.status).ok_or_else(|| ImportError::UnknownStatus {
            line,
            value: row.status.clone(),
        })?;

        let timeline_id = row.timeline_id.filter(|id| !id.trim().is_empty());
        let key = match &timeline_id {
            Some(id) => format!("id:{id}"),
            None => format!("pair:{}\u{1f}{}", row.client_id, row.service_name),
        };

        let slot = match keys.get(&key) {
            Some(slot) => *slot,
            None => {
                timelines.push(ServiceTimeline {
                    id: timeline_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                    client_id: row.client_id.clone(),
                    client_name: row.client_name.clone(),
                    service_name: row.service_name.clone(),
                    overall_progress: row.overall_progress,
                    last_updated: row.last_updated.clone(),
                    stages: Vec::new(),
                });
                keys.insert(key, timelines.len() - 1);
                timelines.len() - 1
            }
        };

        let timeline = &mut timelines[slot];
        let inconsistent = |field| ImportError::Inconsistent {
            line,
            timeline_id: timeline.id.clone(),
            field,
        };
        if timeline.overall_progress != row.overall_progress {
            return Err(inconsistent("overall_progress"));
        }
        if timeline.last_updated != row.last_updated {
            return Err(inconsistent("last_updated"));
        }
        if timeline.client_id != row.client_id {
            return Err(inconsistent("client_id"));
        }
        if timeline.service_name != row.service_name {
            return Err(inconsistent("service_name"));
        }

        let entry = StageStatus {
            status,
            assigned_to: row.assigned_to.filter(|value| !value.trim().is_empty()),
            assigned_to_role: row.assigned_to_role.filter(|value| !value.trim().is_empty()),
        };

        match timeline
            .stages
            .iter_mut()
            .find(|stage| stage.name == row.stage_name)
        {
            Some(stage) => stage.statuses.push(entry),
            None => timeline.stages.push(Stage {
                name: row.stage_name,
                statuses: vec![entry],
            }),
        }
    }

    Ok(timelines)
}
