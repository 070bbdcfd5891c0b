use std::cmp::Ordering;
use std::path::Path;

use crate::input::InputError;

/// Binary target mask, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub height: usize,
    pub width: usize,
    pub pixels: Vec<bool>,
}

impl Mask {
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.pixels[row * self.width + col]
    }
}

pub fn load_mask(path: &Path) -> Result<Mask, InputError> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| {
            let gray = 0.2125 * p[0] as f64 + 0.7154 * p[1] as f64 + 0.0721 * p[2] as f64;
            gray / 255.0 > 0.5
        })
        .collect();
    Ok(Mask {
        height: height as usize,
        width: width as usize,
        pixels,
    })
}

#[derive(Debug, PartialEq, Eq)]
enum NameChunk {
    Number(u64),
    Text(String),
}

fn name_chunks(name: &str) -> Vec<NameChunk> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_digits = false;
    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if !buf.is_empty() && is_digit != in_digits {
            out.push(finish_chunk(&buf, in_digits));
            buf.clear();
        }
        in_digits = is_digit;
        buf.push(ch);
    }
    if !buf.is_empty() {
        out.push(finish_chunk(&buf, in_digits));
    }
    out
}

fn finish_chunk(buf: &str, digits: bool) -> NameChunk {
    if digits {
        if let Ok(n) = buf.parse() {
            return NameChunk::Number(n);
        }
    }
    NameChunk::Text(buf.to_lowercase())
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ca = name_chunks(a);
    let cb = name_chunks(b);
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (NameChunk::Number(p), NameChunk::Number(q)) => p.cmp(q),
            (NameChunk::Text(p), NameChunk::Text(q)) => p.cmp(q),
            (NameChunk::Number(_), NameChunk::Text(_)) => Ordering::Less,
            (NameChunk::Text(_), NameChunk::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len())
}

pub fn sort_natural(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}
