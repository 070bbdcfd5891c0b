use std::path::Path;

use crate::input::InputError;
use crate::input::mat::{MatValue, read_mat_file};

/// One trial of a subject as recorded in the MATLAB struct array. Coordinates
/// are still MATLAB's 1-based pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTrial {
    pub image_name: String,
    pub image_size: (u32, u32),
    pub screen_size: (u32, u32),
    /// `[x0, y0, x1, y1]`
    pub target_rect: [f64; 4],
    pub target_found: bool,
    pub nsaccades_allowed: u32,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub dur: Vec<f64>,
}

pub fn read_subject_trials(path: &Path, variable: &str) -> Result<Vec<SubjectTrial>, InputError> {
    let mat = read_mat_file(path)?;
    let info = mat.get(variable).ok_or_else(|| {
        InputError::Mat(format!(
            "variable '{}' not found in {}",
            variable,
            path.display()
        ))
    })?;
    trials_from_struct(info)
}

pub fn trials_from_struct(info: &MatValue) -> Result<Vec<SubjectTrial>, InputError> {
    if !matches!(info, MatValue::Struct { .. }) {
        return Err(InputError::Mat(
            "subject info is not a struct array".to_string(),
        ));
    }
    let mut trials = Vec::with_capacity(info.struct_len());
    for record in 0..info.struct_len() {
        let ctx = TrialFields { info, record };
        let image_size = ctx.pair("image_size")?;
        let screen_size = ctx.pair("screen_size")?;
        let rect = ctx.numbers("target_rect")?;
        if rect.len() < 4 {
            return Err(ctx.error("target_rect", "expected 4 values"));
        }
        trials.push(SubjectTrial {
            image_name: ctx.text("image_name")?,
            image_size,
            screen_size,
            target_rect: [rect[0], rect[1], rect[2], rect[3]],
            target_found: ctx.scalar("target_found")? != 0.0,
            nsaccades_allowed: ctx.scalar("nsaccades_allowed")? as u32,
            x: ctx.numbers("x")?.to_vec(),
            y: ctx.numbers("y")?.to_vec(),
            dur: ctx.numbers("dur")?.to_vec(),
        });
    }
    Ok(trials)
}

struct TrialFields<'a> {
    info: &'a MatValue,
    record: usize,
}

impl<'a> TrialFields<'a> {
    fn get(&self, name: &str) -> Result<&'a MatValue, InputError> {
        self.info
            .field(self.record, name)
            .ok_or_else(|| self.error(name, "field missing"))
    }

    fn numbers(&self, name: &str) -> Result<&'a [f64], InputError> {
        self.get(name)?
            .as_f64_slice()
            .ok_or_else(|| self.error(name, "not numeric"))
    }

    fn scalar(&self, name: &str) -> Result<f64, InputError> {
        self.numbers(name)?
            .first()
            .copied()
            .ok_or_else(|| self.error(name, "empty"))
    }

    fn pair(&self, name: &str) -> Result<(u32, u32), InputError> {
        let v = self.numbers(name)?;
        if v.len() < 2 {
            return Err(self.error(name, "expected 2 values"));
        }
        Ok((v[0] as u32, v[1] as u32))
    }

    fn text(&self, name: &str) -> Result<String, InputError> {
        self.get(name)?
            .as_text()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| self.error(name, "not a character array"))
    }

    fn error(&self, field: &str, msg: &str) -> InputError {
        InputError::Mat(format!("trial {}: field '{}': {}", self.record + 1, field, msg))
    }
}

/// `info_per_subj_7.mat` -> `07`
pub fn subject_id_from_filename(file_name: &str) -> Result<String, InputError> {
    let last = file_name.rsplit('_').next().unwrap_or(file_name);
    let stem = last.get(..last.len().saturating_sub(4)).unwrap_or("");
    let id: u32 = stem.parse().map_err(|_| {
        InputError::InvalidInput(format!("cannot read a subject id from '{file_name}'"))
    })?;
    if id < 10 {
        Ok(format!("0{stem}"))
    } else {
        Ok(stem.to_string())
    }
}
