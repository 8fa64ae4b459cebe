//! Static HTML dashboard for profiler captures

use crate::analysis::{self, ProcessedProfile, ReportSummary, FULL_FRAME_KEY};
use crate::charts;
use crate::error::Result;
use crate::output;
use crate::profile_format;
use serde_json::json;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-latest.min.js";

/// Escape HTML special characters to prevent XSS
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn generate_styles() -> &'static str {
    r#"
        body {
            font-family: Arial, sans-serif;
            margin: 0;
            padding: 20px;
            background-color: #f5f5f5;
        }
        .container {
            max-width: 1200px;
            margin: 0 auto;
            background-color: white;
            padding: 20px;
            border-radius: 5px;
            box-shadow: 0 2px 5px rgba(0,0,0,0.1);
        }
        .header {
            text-align: center;
            margin-bottom: 30px;
        }
        .summary {
            display: flex;
            justify-content: space-around;
            margin-bottom: 30px;
            flex-wrap: wrap;
        }
        .summary-item {
            text-align: center;
            padding: 15px;
            background-color: #f8f9fa;
            border-radius: 5px;
            margin: 10px;
            flex: 1;
            min-width: 200px;
        }
        .summary-item h3 {
            margin: 0;
            color: #666;
        }
        .summary-item p {
            margin: 10px 0 0 0;
            font-size: 24px;
            font-weight: bold;
            color: #333;
        }
        .chart-container {
            margin-bottom: 30px;
            padding: 20px;
            background-color: white;
            border-radius: 5px;
            box-shadow: 0 2px 5px rgba(0,0,0,0.1);
        }
        .section {
            margin-bottom: 40px;
        }
        table {
            width: 100%;
            border-collapse: collapse;
            margin-top: 20px;
        }
        th, td {
            padding: 12px;
            text-align: left;
            border-bottom: 1px solid #ddd;
        }
        th {
            background-color: #f8f9fa;
            font-weight: bold;
        }
        tr:hover {
            background-color: #f5f5f5;
        }
        .warning {
            color: #856404;
            background-color: #fff3cd;
            border: 1px solid #ffeeba;
            padding: 12px;
            border-radius: 4px;
            margin-bottom: 20px;
        }
        "#
}

// Slices and percentages come precomputed in `functionBreakdowns`; the
// browser only converts to per-frame averages.
const BREAKDOWN_SCRIPT: &str = r#"
    function updateFunctionBreakdown() {
        const selected = document.getElementById('function-selector').value;
        const showAverages = document.getElementById('show-averages').checked;
        const breakdown = functionBreakdowns.breakdowns[selected];
        if (!breakdown) return;

        const frames = functionBreakdowns.totalFrames;
        const totalTime = breakdown.totalTime;
        const values = showAverages
            ? breakdown.values.map(v => frames > 0 ? v / frames : 0)
            : breakdown.values;
        const labels = breakdown.labels;

        const timeUnit = showAverages ? 'ms/frame' : 'ms total';
        const percentages = breakdown.percentages.map(p => p.toFixed(1));
        const hovertext = values.map((v, i) =>
            `${labels[i]}<br>${v.toFixed(2)} ${timeUnit} (${percentages[i]}%)`);

        const pieData = [{
            values: values,
            labels: labels,
            type: 'pie',
            textposition: 'outside',
            textinfo: 'label+percent',
            hovertext: hovertext,
            hoverinfo: 'text',
            showlegend: true,
            automargin: true
        }];

        const headline = showAverages
            ? 'Average: ' + (frames > 0 ? totalTime / frames : 0).toFixed(2) + ' ms/frame'
            : 'Total: ' + totalTime.toFixed(2) + ' ms';

        const layout = {
            title: {
                text: `Time Breakdown for ${breakdown.title}<br>${headline}`,
                font: { size: 16 }
            },
            height: 500,
            margin: { l: 50, r: 50, t: 80, b: 50 },
            showlegend: true,
            legend: { orientation: 'h', yanchor: 'bottom', y: -0.5, xanchor: 'center', x: 0.5 }
        };

        const config = {
            responsive: true,
            displayModeBar: true,
            modeBarButtonsToRemove: ['select2d', 'lasso2d']
        };

        Plotly.newPlot('function-pie-chart', pieData, layout, config);
    }

    document.addEventListener('DOMContentLoaded', function() {
        const selector = document.getElementById('function-selector');
        if (selector.options.length > 0) {
            updateFunctionBreakdown();
        }
    });
"#;

fn function_breakdown(profile: &ProcessedProfile) -> String {
    let mut options = vec![format!(
        r#"<option value="{}">Full Frame</option>"#,
        FULL_FRAME_KEY
    )];
    for name in profile
        .data
        .function_stats
        .keys()
        .filter(|name| name.as_str() != FULL_FRAME_KEY)
    {
        let escaped = escape_html(name);
        options.push(format!(r#"<option value="{escaped}">{escaped}</option>"#));
    }

    let blob = json!({
        "totalFrames": profile.recorded_frames(),
        "breakdowns": profile.all_breakdowns(),
    });

    format!(
        r#"
    <div id="function-breakdown" style="margin-bottom: 20px;">
        <div style="display: flex; align-items: center; gap: 20px; margin-bottom: 10px;">
            <select id="function-selector" onchange="updateFunctionBreakdown()" style="flex-grow: 1;">
                {options}
            </select>
            <label style="display: flex; align-items: center; gap: 5px;">
                <input type="checkbox" id="show-averages" onchange="updateFunctionBreakdown()">
                Show Averages per Frame
            </label>
        </div>
        <div id="function-pie-chart"></div>
    </div>
    <script>
    const functionBreakdowns = {blob};
    {script}
    </script>
    "#,
        options = options.join(""),
        blob = charts::script_json(&blob),
        script = BREAKDOWN_SCRIPT,
    )
}

fn function_stats_table(profile: &ProcessedProfile) -> String {
    let mut html = String::new();
    html.push_str("    <div class=\"stats-table\">\n");
    html.push_str("        <h3>Function Statistics</h3>\n");
    html.push_str("        <table>\n");
    html.push_str("            <tr><th>Function</th><th>Total Time</th><th>Avg Time/Call</th><th>Avg Time/Frame</th><th>Calls</th><th>% of Total</th></tr>\n");

    for row in profile.function_rows() {
        html.push_str(&format!(
            "            <tr><td>{}</td><td>{:.2}ms</td><td>{:.2}ms</td><td>{:.2}ms</td><td>{}</td><td>{:.1}%</td></tr>\n",
            escape_html(row.name),
            row.total_time,
            row.avg_time_per_call,
            row.avg_time_per_frame,
            row.calls,
            row.percent_of_total,
        ));
    }

    html.push_str("        </table>\n");
    html.push_str("    </div>\n");
    html
}

fn summary_panel(summary: &ReportSummary) -> String {
    let mut html = format!(
        r#"
            <div class="summary">
                <div class="summary-item">
                    <h3>Average Frame Time</h3>
                    <p>{:.2}ms</p>
                </div>
                <div class="summary-item">
                    <h3>Total Frames</h3>
                    <p>{}</p>
                </div>
                <div class="summary-item">
                    <h3>Slow Frames</h3>
                    <p>{} ({:.1}%)</p>
                </div>
            </div>
"#,
        summary.average_frame_time,
        summary.total_frames,
        summary.slow_frames,
        summary.slow_frame_percentage,
    );

    if summary.needs_warning() {
        html.push_str(&format!(
            "            <div class=\"warning\">Warning: {:.1}% of frames exceeded the target frame time.</div>\n",
            summary.slow_frame_percentage
        ));
    }
    html
}

fn chart_section(title: &str, body: &str) -> String {
    format!(
        "                <div class=\"chart-container\">\n                    <h3>{}</h3>\n                    {}\n                </div>\n",
        title, body
    )
}

/// Renders the complete report document
pub fn generate_html_report(profile: &ProcessedProfile) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"en\">\n");
    html.push_str("<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str("    <title>Performance Profile Report</title>\n");
    html.push_str(&format!("    <script src=\"{}\"></script>\n", PLOTLY_CDN));
    html.push_str("    <style>");
    html.push_str(generate_styles());
    html.push_str("</style>\n");
    html.push_str("</head>\n");

    html.push_str("<body>\n");
    html.push_str("    <div class=\"container\">\n");
    html.push_str("        <div class=\"header\">\n");
    html.push_str("            <h1>Performance Profile Report</h1>\n");
    html.push_str("        </div>\n");
    html.push_str(&summary_panel(&profile.summary()));

    html.push_str("        <div class=\"section\">\n");
    html.push_str(&chart_section(
        "Frame Time Distribution",
        &charts::frame_histogram(profile),
    ));
    html.push_str(&chart_section("Memory Usage", &charts::memory_chart(profile)));
    html.push_str(&chart_section(
        "Function Timing Overview",
        &charts::combined_timings(profile),
    ));
    html.push_str(&chart_section(
        "Function Time Distribution",
        &charts::function_percentages(profile),
    ));
    html.push_str(&chart_section(
        "Function Breakdown",
        &function_breakdown(profile),
    ));
    html.push_str(&chart_section(
        "Function Statistics",
        &function_stats_table(profile),
    ));
    html.push_str("        </div>\n");

    html.push_str("    </div>\n");
    html.push_str("</body>\n");
    html.push_str("</html>\n");

    html
}

/// `captures/run1.json` becomes `captures/run1_report.html`
pub fn report_output_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push("_report.html");
    input.with_file_name(name)
}

/// Loads a capture, renders its report next to it and returns the report path
pub fn entry_point(input: &Path) -> Result<PathBuf> {
    let data = profile_format::read_profile_file(input)?;
    tracing::info!(
        frames = data.frame_data.len(),
        functions = data.function_stats.len(),
        snapshots = data.memory_stats.len(),
        "loaded profile"
    );

    let processed = analysis::process_profile_data(data);
    let html = generate_html_report(&processed);

    let output_path = report_output_path(input);
    output::write_atomically(&output_path, html.as_bytes())?;
    Ok(output_path)
}
