use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use memmap2::Mmap;

use crate::input::InputError;

const HEADER_BYTES: usize = 128;
const DESCRIPTION_BYTES: usize = 116;
const VERSION_5: u16 = 0x0100;

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_INT16: u32 = 3;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_SINGLE: u32 = 7;
pub const MI_DOUBLE: u32 = 9;
pub const MI_INT64: u32 = 12;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF16: u32 = 17;
pub const MI_UTF32: u32 = 18;

pub const MX_CELL: u8 = 1;
pub const MX_STRUCT: u8 = 2;
pub const MX_CHAR: u8 = 4;
pub const MX_SPARSE: u8 = 5;
pub const MX_DOUBLE: u8 = 6;
pub const MX_UINT64: u8 = 15;

const FLAG_LOGICAL: u32 = 0x0200;
const FLAG_COMPLEX: u32 = 0x0800;

/// A decoded MATLAB array. Numeric data of every storage class is widened to
/// `f64`; all arrays keep MATLAB's column-major element order.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    Numeric {
        dims: Vec<usize>,
        data: Vec<f64>,
        logical: bool,
    },
    Char {
        dims: Vec<usize>,
        text: String,
    },
    Cell {
        dims: Vec<usize>,
        items: Vec<MatValue>,
    },
    Struct {
        dims: Vec<usize>,
        fields: Vec<String>,
        elements: Vec<Vec<MatValue>>,
    },
}

impl MatValue {
    pub fn empty() -> Self {
        MatValue::Numeric {
            dims: vec![0, 0],
            data: Vec::new(),
            logical: false,
        }
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            MatValue::Numeric { dims, .. }
            | MatValue::Char { dims, .. }
            | MatValue::Cell { dims, .. }
            | MatValue::Struct { dims, .. } => dims,
        }
    }

    pub fn numel(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn as_f64_slice(&self) -> Option<&[f64]> {
        match self {
            MatValue::Numeric { data, .. } => Some(data),
            MatValue::Cell { items, .. } if items.len() == 1 => items[0].as_f64_slice(),
            _ => None,
        }
    }

    pub fn scalar(&self) -> Option<f64> {
        self.as_f64_slice().and_then(|d| d.first().copied())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MatValue::Char { text, .. } => Some(text),
            MatValue::Cell { items, .. } if items.len() == 1 => items[0].as_text(),
            _ => None,
        }
    }

    /// Number of elements of a struct array (0 for any other class).
    pub fn struct_len(&self) -> usize {
        match self {
            MatValue::Struct { elements, .. } => elements.len(),
            _ => 0,
        }
    }

    pub fn field(&self, element: usize, name: &str) -> Option<&MatValue> {
        match self {
            MatValue::Struct {
                fields, elements, ..
            } => {
                let idx = fields.iter().position(|f| f == name)?;
                elements.get(element)?.get(idx)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatFile {
    pub description: String,
    pub variables: BTreeMap<String, MatValue>,
}

impl MatFile {
    pub fn get(&self, name: &str) -> Option<&MatValue> {
        self.variables.get(name)
    }
}

pub fn read_mat_file(path: &Path) -> Result<MatFile, InputError> {
    let file = File::open(path)?;
    if file.metadata()?.len() < HEADER_BYTES as u64 {
        return Err(InputError::Mat(format!(
            "{} is too small for a MAT header",
            path.display()
        )));
    }
    let mmap = unsafe { Mmap::map(&file)? };
    parse_mat_bytes(&mmap[..])
}

pub fn parse_mat_bytes(bytes: &[u8]) -> Result<MatFile, InputError> {
    if bytes.len() < HEADER_BYTES {
        return Err(InputError::Mat("file too small for a MAT header".to_string()));
    }
    let description = String::from_utf8_lossy(&bytes[..DESCRIPTION_BYTES])
        .trim_end_matches([' ', '\0'])
        .to_string();
    if description.starts_with("MATLAB 7.3") {
        return Err(InputError::Mat(
            "HDF5-based v7.3 MAT-files are not supported".to_string(),
        ));
    }
    let big_endian = match &bytes[126..128] {
        b"IM" => false,
        b"MI" => true,
        _ => {
            return Err(InputError::Mat(
                "invalid endian indicator; expected IM or MI".to_string(),
            ));
        }
    };
    let version = if big_endian {
        u16::from_be_bytes([bytes[124], bytes[125]])
    } else {
        u16::from_le_bytes([bytes[124], bytes[125]])
    };
    if version != VERSION_5 {
        return Err(InputError::Mat(format!(
            "unsupported MAT version: 0x{version:04x}"
        )));
    }

    let mut variables = BTreeMap::new();
    let mut reader = ElementReader::new(&bytes[HEADER_BYTES..], big_endian);
    while let Some((ty, data)) = reader.next_element()? {
        for (name, value) in decode_top_level(ty, data, big_endian)? {
            if variables.contains_key(&name) {
                tracing::warn!(variable = %name, "duplicate MAT variable; keeping first");
                continue;
            }
            variables.insert(name, value);
        }
    }

    Ok(MatFile {
        description,
        variables,
    })
}

fn decode_top_level(
    ty: u32,
    data: &[u8],
    big_endian: bool,
) -> Result<Vec<(String, MatValue)>, InputError> {
    match ty {
        MI_MATRIX => Ok(vec![parse_matrix(data, big_endian)?]),
        MI_COMPRESSED => {
            let mut inflated = Vec::new();
            ZlibDecoder::new(data)
                .read_to_end(&mut inflated)
                .map_err(|e| InputError::Mat(format!("failed to inflate element: {e}")))?;
            let mut out = Vec::new();
            let mut inner = ElementReader::new(&inflated, big_endian);
            while let Some((inner_ty, inner_data)) = inner.next_element()? {
                out.extend(decode_top_level(inner_ty, inner_data, big_endian)?);
            }
            Ok(out)
        }
        other => {
            tracing::debug!(data_type = other, "skipping non-matrix top-level element");
            Ok(Vec::new())
        }
    }
}

struct ElementReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl<'a> ElementReader<'a> {
    fn new(bytes: &'a [u8], big_endian: bool) -> Self {
        Self {
            bytes,
            pos: 0,
            big_endian,
        }
    }

    fn next_element(&mut self) -> Result<Option<(u32, &'a [u8])>, InputError> {
        if self.pos + 8 > self.bytes.len() {
            return Ok(None);
        }
        let first = self.u32_at(self.pos);
        let small_len = (first >> 16) as usize;
        if small_len != 0 {
            if small_len > 4 {
                return Err(InputError::Mat(format!(
                    "small data element too long ({small_len} bytes)"
                )));
            }
            let start = self.pos + 4;
            let data = &self.bytes[start..start + small_len];
            self.pos += 8;
            return Ok(Some((first & 0xffff, data)));
        }

        let ty = first;
        let n = self.u32_at(self.pos + 4) as usize;
        let start = self.pos + 8;
        let end = start
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| InputError::Mat(format!("element of {n} bytes is truncated")))?;
        let padded = if ty == MI_COMPRESSED { n } else { (n + 7) & !7 };
        self.pos = start + padded;
        Ok(Some((ty, &self.bytes[start..end])))
    }

    fn expect_element(&mut self, what: &str) -> Result<(u32, &'a [u8]), InputError> {
        self.next_element()?
            .ok_or_else(|| InputError::Mat(format!("missing {what} subelement")))
    }

    fn u32_at(&self, offset: usize) -> u32 {
        let raw = [
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ];
        if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        }
    }
}

fn parse_matrix(data: &[u8], big_endian: bool) -> Result<(String, MatValue), InputError> {
    if data.is_empty() {
        return Ok((String::new(), MatValue::empty()));
    }
    let mut r = ElementReader::new(data, big_endian);

    let (flags_ty, flags_raw) = r.expect_element("array flags")?;
    if flags_ty != MI_UINT32 || flags_raw.len() < 8 {
        return Err(InputError::Mat("malformed array flags".to_string()));
    }
    let flags_word = decode_numeric(MI_UINT32, &flags_raw[..4], big_endian)?[0] as u32;
    let class = (flags_word & 0xff) as u8;
    let logical = flags_word & FLAG_LOGICAL != 0;
    let complex = flags_word & FLAG_COMPLEX != 0;

    let (dims_ty, dims_raw) = r.expect_element("dimensions")?;
    let mut dims = Vec::new();
    for d in decode_numeric(dims_ty, dims_raw, big_endian)? {
        if d < 0.0 {
            return Err(InputError::Mat("negative array dimension".to_string()));
        }
        dims.push(d as usize);
    }
    let numel = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| InputError::Mat("array dimensions overflow".to_string()))?;
    // Every stored element takes at least one 8-byte tag.
    let capacity = numel.min(data.len() / 8);

    let (_, name_raw) = r.expect_element("array name")?;
    let name = String::from_utf8_lossy(name_raw)
        .trim_end_matches('\0')
        .to_string();

    let value = match class {
        MX_CELL => {
            let mut items = Vec::with_capacity(capacity);
            for _ in 0..numel {
                items.push(expect_matrix(&mut r, big_endian, "cell item")?);
            }
            MatValue::Cell { dims, items }
        }
        MX_STRUCT => {
            let (len_ty, len_raw) = r.expect_element("field name length")?;
            let name_len = decode_numeric(len_ty, len_raw, big_endian)?
                .first()
                .copied()
                .unwrap_or(0.0) as usize;
            let (_, names_raw) = r.expect_element("field names")?;
            let fields: Vec<String> = if name_len == 0 {
                Vec::new()
            } else {
                names_raw
                    .chunks(name_len)
                    .map(|chunk| {
                        String::from_utf8_lossy(chunk)
                            .trim_end_matches('\0')
                            .to_string()
                    })
                    .collect()
            };
            let mut elements = Vec::with_capacity(capacity);
            for _ in 0..numel {
                let mut row = Vec::with_capacity(fields.len());
                for field in &fields {
                    row.push(expect_matrix(&mut r, big_endian, field)?);
                }
                elements.push(row);
            }
            MatValue::Struct {
                dims,
                fields,
                elements,
            }
        }
        MX_CHAR => {
            let chars = match r.next_element()? {
                Some((ty, raw)) => decode_chars(ty, raw, big_endian)?,
                None => Vec::new(),
            };
            let text = reshape_chars(&dims, &chars);
            MatValue::Char { dims, text }
        }
        MX_DOUBLE..=MX_UINT64 => {
            let data = match r.next_element()? {
                Some((ty, raw)) => decode_numeric(ty, raw, big_endian)?,
                None => Vec::new(),
            };
            if complex {
                // Imaginary part is read past and dropped.
                let _ = r.next_element()?;
            }
            if data.len() != numel {
                return Err(InputError::Mat(format!(
                    "array '{name}' holds {} values but its dimensions imply {numel}",
                    data.len()
                )));
            }
            MatValue::Numeric {
                dims,
                data,
                logical,
            }
        }
        MX_SPARSE => {
            return Err(InputError::Mat(format!(
                "sparse array '{name}' is not supported"
            )));
        }
        other => {
            return Err(InputError::Mat(format!(
                "unsupported array class {other} for '{name}'"
            )));
        }
    };

    Ok((name, value))
}

fn expect_matrix(
    r: &mut ElementReader<'_>,
    big_endian: bool,
    what: &str,
) -> Result<MatValue, InputError> {
    let (ty, raw) = r.expect_element(what)?;
    if ty != MI_MATRIX {
        return Err(InputError::Mat(format!(
            "expected a matrix for {what}, found data type {ty}"
        )));
    }
    Ok(parse_matrix(raw, big_endian)?.1)
}

fn decode_numeric(ty: u32, raw: &[u8], big_endian: bool) -> Result<Vec<f64>, InputError> {
    let width = match ty {
        MI_INT8 | MI_UINT8 => 1,
        MI_INT16 | MI_UINT16 => 2,
        MI_INT32 | MI_UINT32 | MI_SINGLE => 4,
        MI_DOUBLE | MI_INT64 | MI_UINT64 => 8,
        other => {
            return Err(InputError::Mat(format!(
                "data type {other} cannot hold numeric values"
            )));
        }
    };
    if raw.len() % width != 0 {
        return Err(InputError::Mat(format!(
            "numeric data of {} bytes is not a multiple of {width}",
            raw.len()
        )));
    }

    let out = raw
        .chunks_exact(width)
        .map(|c| match ty {
            MI_INT8 => c[0] as i8 as f64,
            MI_UINT8 => c[0] as f64,
            MI_INT16 => i16::from_ne_bytes(order2(c, big_endian)) as f64,
            MI_UINT16 => u16::from_ne_bytes(order2(c, big_endian)) as f64,
            MI_INT32 => i32::from_ne_bytes(order4(c, big_endian)) as f64,
            MI_UINT32 => u32::from_ne_bytes(order4(c, big_endian)) as f64,
            MI_SINGLE => f32::from_ne_bytes(order4(c, big_endian)) as f64,
            MI_DOUBLE => f64::from_ne_bytes(order8(c, big_endian)),
            MI_INT64 => i64::from_ne_bytes(order8(c, big_endian)) as f64,
            _ => u64::from_ne_bytes(order8(c, big_endian)) as f64,
        })
        .collect();
    Ok(out)
}

fn decode_chars(ty: u32, raw: &[u8], big_endian: bool) -> Result<Vec<char>, InputError> {
    match ty {
        MI_UTF8 | MI_INT8 | MI_UINT8 => Ok(String::from_utf8_lossy(raw).chars().collect()),
        MI_UINT16 | MI_UTF16 => {
            let units = decode_numeric(MI_UINT16, raw, big_endian)?
                .into_iter()
                .map(|u| u as u16);
            Ok(char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect())
        }
        MI_UINT32 | MI_UTF32 => Ok(decode_numeric(MI_UINT32, raw, big_endian)?
            .into_iter()
            .map(|u| char::from_u32(u as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()),
        other => Err(InputError::Mat(format!(
            "data type {other} cannot hold characters"
        ))),
    }
}

fn reshape_chars(dims: &[usize], chars: &[char]) -> String {
    let rows = dims.first().copied().unwrap_or(0);
    if rows <= 1 {
        return chars.iter().collect();
    }
    let cols = chars.len() / rows;
    let mut lines = Vec::with_capacity(rows);
    for r in 0..rows {
        let line: String = (0..cols).map(|c| chars[c * rows + r]).collect();
        lines.push(line);
    }
    lines.join("\n")
}

fn order2(c: &[u8], big_endian: bool) -> [u8; 2] {
    let raw = [c[0], c[1]];
    if big_endian == cfg!(target_endian = "big") {
        raw
    } else {
        [raw[1], raw[0]]
    }
}

fn order4(c: &[u8], big_endian: bool) -> [u8; 4] {
    let mut raw = [c[0], c[1], c[2], c[3]];
    if big_endian != cfg!(target_endian = "big") {
        raw.reverse();
    }
    raw
}

fn order8(c: &[u8], big_endian: bool) -> [u8; 8] {
    let mut raw = [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]];
    if big_endian != cfg!(target_endian = "big") {
        raw.reverse();
    }
    raw
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/mat.rs"]
mod tests;
