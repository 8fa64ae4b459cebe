use crate::error::{Result, ToolError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

/// Profiler settings recorded alongside the capture
#[derive(serde::Serialize, Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(rename = "minFrameTimeMs")]
    pub min_frame_time_ms: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(serde::Serialize, Debug, Deserialize, Clone)]
pub struct Metadata {
    #[serde(rename = "totalFrames")]
    pub total_frames: u64,
    #[serde(rename = "averageFrameTime")]
    pub average_frame_time: f64,
    // exporters write null when capture start is unknown
    #[serde(rename = "startTime", default)]
    pub start_time: Option<f64>,
    pub config: CaptureConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(serde::Serialize, Debug, Deserialize, Clone)]
pub struct FrameRecord {
    #[serde(rename = "totalTime")]
    pub total_time: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(serde::Serialize, Debug, Deserialize, Clone)]
pub struct FunctionStats {
    #[serde(rename = "totalTime")]
    pub total_time: f64,
    pub calls: u64,
    #[serde(rename = "averageTimePerFrame", default)]
    pub average_time_per_frame: f64,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(rename = "timePerFrame", default)]
    pub time_per_frame: Vec<f64>,
    // derived by analysis, absent in raw captures
    #[serde(rename = "percentOfTotal", default)]
    pub percent_of_total: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(serde::Serialize, Debug, Deserialize, Clone)]
pub struct MemorySnapshot {
    pub timestamp: f64,
    pub used: f64,
    pub total: f64,
}

/// A performance capture as exported by the in-game profiler
#[derive(serde::Serialize, Debug, Deserialize, Clone)]
pub struct ProfileData {
    pub metadata: Metadata,
    #[serde(rename = "frameData")]
    pub frame_data: Vec<FrameRecord>,
    #[serde(rename = "functionStats")]
    pub function_stats: BTreeMap<String, FunctionStats>,
    #[serde(rename = "memoryStats", default)]
    pub memory_stats: Vec<MemorySnapshot>,
}

pub fn read_profile_file(path: &Path) -> Result<ProfileData> {
    let file = File::open(path).map_err(|e| ToolError::io(path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| ToolError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_capture() {
        let raw = r#"{
            "metadata": {"totalFrames": 2, "averageFrameTime": 16.5, "config": {"minFrameTimeMs": 16.67}},
            "frameData": [{"totalTime": 15.0}, {"totalTime": 18.0, "frameIndex": 1}],
            "functionStats": {"update": {"totalTime": 10.0, "calls": 2}}
        }"#;
        let data: ProfileData = serde_json::from_str(raw).unwrap();

        assert_eq!(data.metadata.total_frames, 2);
        assert_eq!(data.metadata.start_time, None);
        assert_eq!(data.frame_data[1].extra["frameIndex"], 1);
        assert!(data.memory_stats.is_empty());
        let update = &data.function_stats["update"];
        assert!(update.parents.is_empty());
        assert_eq!(update.percent_of_total, 0.0);
    }

    #[test]
    fn test_null_start_time_is_accepted() {
        let raw = r#"{"totalFrames": 1, "averageFrameTime": 16.0, "startTime": null,
                      "config": {"minFrameTimeMs": 16.67}}"#;
        let metadata: Metadata = serde_json::from_str(raw).unwrap();
        assert_eq!(metadata.start_time, None);
    }

    #[test]
    fn test_unknown_function_fields_are_kept() {
        let raw = r#"{"totalTime": 1.0, "calls": 1, "maxTime": 0.7}"#;
        let stats: FunctionStats = serde_json::from_str(raw).unwrap();
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["maxTime"], 0.7);
        assert_eq!(value["percentOfTotal"], 0.0);
    }

    #[test]
    fn test_missing_min_frame_time_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{"metadata": {"totalFrames": 1, "averageFrameTime": 1.0, "config": {}},
                "frameData": [], "functionStats": {}}"#,
        )
        .unwrap();

        let err = read_profile_file(&path).unwrap_err();
        assert!(matches!(err, ToolError::Json { .. }));
        assert!(err.to_string().contains("minFrameTimeMs"));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = read_profile_file(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }
}
