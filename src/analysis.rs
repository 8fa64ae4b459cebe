use crate::profile_format::{FrameRecord, FunctionStats, ProfileData};
use serde::Serialize;
use std::collections::BTreeMap;

/// Selector value of the whole-frame breakdown
pub const FULL_FRAME_KEY: &str = "__frame__";

/// Share of slow frames above which the report shows a warning banner
const SLOW_FRAME_WARNING_PERCENT: f64 = 5.0;

const TOP_FUNCTIONS: usize = 10;

/// Profile data annotated with the values every report view needs
#[derive(Debug, Clone)]
pub struct ProcessedProfile {
    pub data: ProfileData,
    pub slow_frames: Vec<FrameRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub average_frame_time: f64,
    pub total_frames: u64,
    pub slow_frames: usize,
    pub slow_frame_percentage: f64,
}

impl ReportSummary {
    pub fn needs_warning(&self) -> bool {
        self.slow_frame_percentage > SLOW_FRAME_WARNING_PERCENT
    }
}

/// One row of the function statistics table
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRow<'a> {
    pub name: &'a str,
    pub total_time: f64,
    pub avg_time_per_call: f64,
    pub avg_time_per_frame: f64,
    pub calls: u64,
    pub percent_of_total: f64,
}

/// Pie slices for one selector entry. `total_time` is what percentages are
/// taken against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub title: String,
    #[serde(rename = "totalTime")]
    pub total_time: f64,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Share of `total_time` per slice, independent of the averages toggle
    pub percentages: Vec<f64>,
}

pub fn process_profile_data(mut data: ProfileData) -> ProcessedProfile {
    let threshold = data.metadata.config.min_frame_time_ms;
    let slow_frames = data
        .frame_data
        .iter()
        .filter(|frame| frame.total_time > threshold)
        .cloned()
        .collect();

    let total_time = data.metadata.total_frames as f64 * data.metadata.average_frame_time;
    if total_time > 0.0 {
        for stats in data.function_stats.values_mut() {
            stats.percent_of_total = stats.total_time / total_time * 100.0;
        }
    } else {
        tracing::warn!(total_time, "capture has no positive total time, skipping percentages");
    }

    ProcessedProfile { data, slow_frames }
}

impl ProcessedProfile {
    pub fn summary(&self) -> ReportSummary {
        let total_frames = self.data.metadata.total_frames;
        let slow_frames = self.slow_frames.len();
        let slow_frame_percentage = if total_frames > 0 {
            slow_frames as f64 / total_frames as f64 * 100.0
        } else {
            0.0
        };
        ReportSummary {
            average_frame_time: self.data.metadata.average_frame_time,
            total_frames,
            slow_frames,
            slow_frame_percentage,
        }
    }

    /// Number of frames actually present in `frameData`
    pub fn recorded_frames(&self) -> usize {
        self.data.frame_data.len()
    }

    pub fn recorded_frame_time(&self) -> f64 {
        self.data.frame_data.iter().map(|frame| frame.total_time).sum()
    }

    fn sorted_functions_by<F>(&self, key: F) -> Vec<(&str, &FunctionStats)>
    where
        F: Fn(&FunctionStats) -> f64,
    {
        let mut functions: Vec<(&str, &FunctionStats)> = self
            .data
            .function_stats
            .iter()
            .map(|(name, stats)| (name.as_str(), stats))
            .collect();
        functions.sort_by(|a, b| key(b.1).total_cmp(&key(a.1)));
        functions
    }

    pub fn top_by_total_time(&self) -> Vec<(&str, &FunctionStats)> {
        let mut functions = self.sorted_functions_by(|stats| stats.total_time);
        functions.truncate(TOP_FUNCTIONS);
        functions
    }

    pub fn top_by_percent(&self) -> Vec<(&str, &FunctionStats)> {
        let mut functions = self.sorted_functions_by(|stats| stats.percent_of_total);
        functions.truncate(TOP_FUNCTIONS);
        functions
    }

    pub fn function_rows(&self) -> Vec<FunctionRow<'_>> {
        let frames = self.recorded_frames();
        self.sorted_functions_by(|stats| stats.percent_of_total)
            .into_iter()
            .map(|(name, stats)| FunctionRow {
                name,
                total_time: stats.total_time,
                avg_time_per_call: if stats.calls > 0 {
                    stats.total_time / stats.calls as f64
                } else {
                    stats.total_time
                },
                avg_time_per_frame: if frames > 0 {
                    stats.total_time / frames as f64
                } else {
                    0.0
                },
                calls: stats.calls,
                percent_of_total: stats.percent_of_total,
            })
            .collect()
    }

    /// Root functions (no parents) sliced against the recorded frame time
    pub fn frame_breakdown(&self) -> Breakdown {
        let roots: Vec<(&str, &FunctionStats)> = self
            .sorted_functions_by(|stats| stats.total_time)
            .into_iter()
            .filter(|(_, stats)| stats.parents.is_empty())
            .collect();

        Breakdown::new(
            "Full Frame".to_string(),
            self.recorded_frame_time(),
            roots.iter().map(|(name, _)| name.to_string()).collect(),
            roots.iter().map(|(_, stats)| stats.total_time).collect(),
        )
    }

    /// Self time followed by each known child, largest first
    pub fn function_breakdown(&self, name: &str) -> Option<Breakdown> {
        let stats = self.data.function_stats.get(name)?;

        let mut children: Vec<(&str, f64)> = Vec::new();
        for child in &stats.children {
            if children.iter().any(|(seen, _)| *seen == child.as_str()) {
                continue;
            }
            match self.data.function_stats.get(child) {
                Some(child_stats) => children.push((child.as_str(), child_stats.total_time)),
                None => tracing::debug!(function = name, child = %child, "child has no stats"),
            }
        }
        let child_time: f64 = children.iter().map(|(_, time)| time).sum();
        let self_time = (stats.total_time - child_time).max(0.0);
        children.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut labels = vec!["Self Time".to_string()];
        let mut values = vec![self_time];
        for (child, time) in children {
            labels.push(child.to_string());
            values.push(time);
        }

        Some(Breakdown::new(
            name.to_string(),
            stats.total_time,
            labels,
            values,
        ))
    }

    /// Every selector entry keyed by its option value
    pub fn all_breakdowns(&self) -> BTreeMap<String, Breakdown> {
        let mut breakdowns = BTreeMap::new();
        breakdowns.insert(FULL_FRAME_KEY.to_string(), self.frame_breakdown());
        for name in self.data.function_stats.keys() {
            if name == FULL_FRAME_KEY {
                tracing::debug!("function named {} is shadowed by the full frame view", name);
                continue;
            }
            if let Some(breakdown) = self.function_breakdown(name) {
                breakdowns.insert(name.clone(), breakdown);
            }
        }
        breakdowns
    }
}

impl Breakdown {
    fn new(title: String, total_time: f64, labels: Vec<String>, values: Vec<f64>) -> Self {
        let percentages = values
            .iter()
            .map(|v| {
                if total_time > 0.0 {
                    v / total_time * 100.0
                } else {
                    0.0
                }
            })
            .collect();
        Self {
            title,
            total_time,
            labels,
            values,
            percentages,
        }
    }
}
