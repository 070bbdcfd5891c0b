use serde_json::{Value, json};

use crate::report::EvaluationSummary;

/// Summary with the aggregator keys (`tool`, `dataset`, `best_model`) up
/// front and the full breakdown under `details`.
pub fn render_summary_json(data: &EvaluationSummary) -> Result<String, serde_json::Error> {
    let best_model = data
        .cumulative
        .iter()
        .filter_map(|c| c.mean_abs_diff_to_humans.map(|d| (c.model.as_str(), d)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.to_string());

    let value = json!({
        "tool": data.tool,
        "dataset": data.dataset,
        "best_model": best_model,
        "details": serde_json::to_value(data)?,
    });
    render_value(&value)
}

fn render_value(value: &Value) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}
