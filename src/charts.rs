//! Plotly figure fragments for the profile report.
//!
//! Every figure becomes a `<div>` plus an inline `Plotly.newPlot` call. The
//! report page loads plotly.js once in its `<head>`.

use crate::analysis::ProcessedProfile;
use serde_json::{json, Value};

const CHART_HEIGHT: u32 = 400;
const HISTOGRAM_BINS: u32 = 50;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A single chart: traces plus layout, rendered into a div with a fixed id
#[derive(Debug, Clone)]
pub struct Figure {
    div_id: String,
    data: Vec<Value>,
    layout: Value,
}

impl Figure {
    pub fn new(div_id: &str, data: Vec<Value>, layout: Value) -> Self {
        Self {
            div_id: div_id.to_string(),
            data,
            layout,
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div id="{id}" class="plotly-graph-div" style="height:{height}px; width:100%;"></div>
<script type="text/javascript">
    Plotly.newPlot("{id}", {data}, {layout}, {{"responsive": true}});
</script>"#,
            id = self.div_id,
            height = CHART_HEIGHT,
            data = script_json(&Value::Array(self.data.clone())),
            layout = script_json(&self.layout),
        )
    }
}

/// Serializes `value` for inclusion inside a `<script>` element.
///
/// Markup characters only occur inside JSON strings, so they are replaced with
/// unicode escapes that JavaScript decodes to the same text.
pub fn script_json(value: &Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

pub fn frame_histogram(profile: &ProcessedProfile) -> String {
    let frame_times: Vec<f64> = profile
        .data
        .frame_data
        .iter()
        .map(|frame| frame.total_time)
        .collect();
    let threshold = profile.data.metadata.config.min_frame_time_ms;

    Figure::new(
        "frame-histogram",
        vec![json!({
            "type": "histogram",
            "x": frame_times,
            "nbinsx": HISTOGRAM_BINS,
        })],
        json!({
            "title": {"text": "Frame Time Distribution"},
            "xaxis": {"title": {"text": "Frame Time (ms)"}},
            "yaxis": {"title": {"text": "Count"}},
            "height": CHART_HEIGHT,
            "shapes": [{
                "type": "line",
                "x0": threshold,
                "x1": threshold,
                "xref": "x",
                "y0": 0,
                "y1": 1,
                "yref": "paper",
                "line": {"color": "red", "dash": "dash"},
            }],
            "annotations": [{
                "x": threshold,
                "xref": "x",
                "y": 1,
                "yref": "paper",
                "text": "60 FPS",
                "showarrow": false,
                "xanchor": "left",
                "yanchor": "bottom",
            }],
        }),
    )
    .to_html()
}

pub fn memory_chart(profile: &ProcessedProfile) -> String {
    let snapshots = &profile.data.memory_stats;
    if snapshots.is_empty() {
        return "<div>No memory data available</div>".to_string();
    }

    let start = profile.data.metadata.start_time.unwrap_or(0.0);
    let seconds: Vec<f64> = snapshots
        .iter()
        .map(|s| (s.timestamp - start) / 1000.0)
        .collect();
    let used: Vec<f64> = snapshots.iter().map(|s| s.used / BYTES_PER_MB).collect();
    let total: Vec<f64> = snapshots.iter().map(|s| s.total / BYTES_PER_MB).collect();

    Figure::new(
        "memory-chart",
        vec![
            json!({
                "type": "scatter",
                "x": seconds,
                "y": used,
                "name": "Used Memory (MB)",
                "line": {"color": "blue"},
            }),
            json!({
                "type": "scatter",
                "x": seconds,
                "y": total,
                "name": "Total Memory (MB)",
                "line": {"color": "red", "dash": "dash"},
            }),
        ],
        json!({
            "title": {"text": "Memory Usage Over Time"},
            "xaxis": {"title": {"text": "Time (seconds)"}},
            "yaxis": {"title": {"text": "Memory (MB)"}},
            "height": CHART_HEIGHT,
        }),
    )
    .to_html()
}

pub fn combined_timings(profile: &ProcessedProfile) -> String {
    let top = profile.top_by_total_time();
    let names: Vec<&str> = top.iter().map(|(name, _)| *name).collect();
    let totals: Vec<f64> = top.iter().map(|(_, stats)| stats.total_time).collect();
    let averages: Vec<f64> = top
        .iter()
        .map(|(_, stats)| stats.average_time_per_frame)
        .collect();

    Figure::new(
        "function-timings",
        vec![
            json!({"type": "bar", "name": "Total Time (ms)", "x": names, "y": totals}),
            json!({"type": "bar", "name": "Avg Time/Frame (ms)", "x": names, "y": averages}),
        ],
        json!({
            "title": {"text": "Function Timing Overview"},
            "xaxis": {"title": {"text": "Function Name"}},
            "yaxis": {"title": {"text": "Time (ms)"}},
            "barmode": "group",
            "height": CHART_HEIGHT,
        }),
    )
    .to_html()
}

pub fn function_percentages(profile: &ProcessedProfile) -> String {
    let top = profile.top_by_percent();
    let names: Vec<&str> = top.iter().map(|(name, _)| *name).collect();
    let percentages: Vec<f64> = top.iter().map(|(_, stats)| stats.percent_of_total).collect();
    let labels: Vec<String> = percentages.iter().map(|p| format!("{p:.1}%")).collect();

    Figure::new(
        "function-percentages",
        vec![json!({
            "type": "bar",
            "orientation": "h",
            "x": percentages,
            "y": names,
            "text": labels,
            "textposition": "auto",
        })],
        json!({
            "title": {"text": "Function Time Distribution (% of Total Time)"},
            "xaxis": {"title": {"text": "Percentage of Total Time"}},
            "yaxis": {"title": {"text": "Function Name"}},
            "height": CHART_HEIGHT,
            "margin": {"l": 200},
        }),
    )
    .to_html()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{process_profile_data, tests::sample_profile};

    #[test]
    fn test_script_json_escapes_closing_tags() {
        let value = json!({"name": "</script><script>alert(1)"});
        let rendered = script_json(&value);
        assert!(!rendered.contains("</script>"));
        assert!(!rendered.contains('<'));
        assert!(rendered.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn test_figure_html_structure() {
        let html = Figure::new("chart", vec![json!({"type": "bar"})], json!({})).to_html();
        assert!(html.contains(r#"<div id="chart""#));
        assert!(html.contains(r#"Plotly.newPlot("chart", [{"type":"bar"}], {}"#));
    }

    #[test]
    fn test_frame_histogram_marks_threshold() {
        let processed = process_profile_data(sample_profile());
        let html = frame_histogram(&processed);
        assert!(html.contains(r#""nbinsx":50"#));
        assert!(html.contains(r#""x0":16.67"#));
        assert!(html.contains("60 FPS"));
    }

    #[test]
    fn test_memory_chart_converts_units() {
        let processed = process_profile_data(sample_profile());
        let html = memory_chart(&processed);
        // startTime 1000: snapshots at 0s and 2s, 1MB and 2MB used
        assert!(html.contains(r#""x":[0.0,2.0]"#));
        assert!(html.contains(r#""y":[1.0,2.0]"#));
        assert!(html.contains(r#""y":[4.0,4.0]"#));
    }

    #[test]
    fn test_memory_chart_without_start_time() {
        let mut data = sample_profile();
        data.metadata.start_time = None;
        let html = memory_chart(&process_profile_data(data));
        assert!(html.contains(r#""x":[1.0,3.0]"#));
    }

    #[test]
    fn test_memory_chart_without_snapshots() {
        let mut data = sample_profile();
        data.memory_stats.clear();
        let processed = process_profile_data(data);
        assert_eq!(memory_chart(&processed), "<div>No memory data available</div>");
    }

    #[test]
    fn test_function_percentages_labels() {
        let processed = process_profile_data(sample_profile());
        let html = function_percentages(&processed);
        assert!(html.contains(r#""75.0%""#));
        assert!(html.contains(r#""orientation":"h""#));
    }

    #[test]
    fn test_combined_timings_grouped() {
        let processed = process_profile_data(sample_profile());
        let html = combined_timings(&processed);
        assert!(html.contains(r#""barmode":"group""#));
        assert!(html.contains(r#""x":["gameLoop","drawParticles","render","update","audio"]"#));
    }
}
