use crate::report::{EvaluationSummary, format_f64_6, format_opt};

pub fn render_report_text(data: &EvaluationSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("Scanpath Evaluation Report: {}\n", data.dataset));
    out.push_str("=============================================\n\n");

    out.push_str("1. Dataset\n");
    out.push_str(&format!("Images: {}\n", data.number_of_images));
    out.push_str(&format!(
        "Max. scanpath length: {}\n",
        data.max_scanpath_length
    ));
    out.push_str(&format!("Human subjects: {}\n\n", data.human_subjects));

    out.push_str("2. Cumulative performance\n");
    out.push_str(&format!(
        "Humans (mean) area: {}\n",
        format_opt(data.human_area)
    ));
    if data.cumulative.is_empty() {
        out.push_str("No models evaluated.\n");
    }
    for c in &data.cumulative {
        out.push_str(&format!(
            "{}: area={}, mean |diff| to humans={}\n",
            c.model,
            format_f64_6(c.area),
            format_opt(c.mean_abs_diff_to_humans)
        ));
    }
    out.push('\n');

    out.push_str("3. Multimatch (shape = mean of vector, direction, length, position)\n");
    for m in &data.multimatch {
        out.push_str(&format!(
            "{}: images={}, humans={}, model vs humans={}, correlation={}\n",
            m.model,
            m.images_compared,
            format_opt(m.human_shape_mean),
            format_opt(m.model_shape_mean),
            format_opt(m.shape_correlation)
        ));
        if m.images_compared < 2 {
            out.push_str("  Too few comparable images for a correlation.\n");
        }
    }
    out.push('\n');

    out.push_str(&format!("Generated by {} {}\n", data.tool, data.version));
    out
}
