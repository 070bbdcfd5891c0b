use std::path::Path;

use crate::input::{InputError, read_json, sorted_dir_entries};
use crate::model::scanpath::ScanpathMap;

pub mod agreement;
pub mod cumulative;
pub mod multimatch;

#[derive(Debug, Clone)]
pub struct SubjectScanpaths {
    pub subject: String,
    pub scanpaths: ScanpathMap,
}

/// Loads every `*.json` file of `dir` as one subject's scanpaths, in file
/// name order.
pub fn load_human_scanpaths(dir: &Path) -> Result<Vec<SubjectScanpaths>, InputError> {
    let mut out = Vec::new();
    for path in sorted_dir_entries(dir)? {
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let scanpaths: ScanpathMap = read_json(&path)?;
        let subject = scanpaths
            .values()
            .next()
            .map(|r| r.subject.clone())
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        out.push(SubjectScanpaths { subject, scanpaths });
    }
    if out.is_empty() {
        tracing::warn!("no human scanpaths found in {}", dir.display());
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/tests.rs"]
mod tests;
