use super::*;
use crate::test_support::{MatFixture, make_temp_dir, mat_file_bytes, write_mat_file};

fn sample_vars() -> Vec<(&'static str, MatFixture)> {
    vec![
        (
            "m",
            MatFixture::Double {
                dims: vec![2, 3],
                data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            },
        ),
        ("label", MatFixture::text("search")),
        (
            "info",
            MatFixture::Struct {
                fields: vec!["name".to_string(), "x".to_string()],
                elements: vec![
                    vec![MatFixture::text("img001.jpg"), MatFixture::row(&[1.5, 2.5])],
                    vec![MatFixture::text("img002.jpg"), MatFixture::row(&[])],
                ],
            },
        ),
        (
            "c",
            MatFixture::Cell(vec![MatFixture::scalar(7.0), MatFixture::text("z")]),
        ),
    ]
}

fn check_sample(mat: &MatFile) {
    let m = mat.get("m").unwrap();
    assert_eq!(m.dims(), &[2, 3]);
    assert_eq!(m.as_f64_slice().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    assert_eq!(mat.get("label").unwrap().as_text(), Some("search"));

    let info = mat.get("info").unwrap();
    assert_eq!(info.struct_len(), 2);
    assert_eq!(info.field(0, "name").unwrap().as_text(), Some("img001.jpg"));
    assert_eq!(info.field(0, "x").unwrap().as_f64_slice().unwrap(), &[1.5, 2.5]);
    assert_eq!(info.field(1, "x").unwrap().numel(), 0);
    assert!(info.field(0, "missing").is_none());
    assert!(info.field(2, "name").is_none());

    match mat.get("c").unwrap() {
        MatValue::Cell { items, .. } => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].scalar(), Some(7.0));
            assert_eq!(items[1].as_text(), Some("z"));
        }
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn test_parse_uncompressed_variables() {
    let mat = parse_mat_bytes(&mat_file_bytes(&sample_vars(), false)).unwrap();
    assert!(mat.description.starts_with("MATLAB 5.0 MAT-file"));
    assert_eq!(mat.variables.len(), 4);
    check_sample(&mat);
}

#[test]
fn test_read_compressed_file() {
    let dir = make_temp_dir();
    let path = dir.join("sample.mat");
    write_mat_file(&path, &sample_vars(), true);
    let mat = read_mat_file(&path).unwrap();
    check_sample(&mat);
}

#[test]
fn test_rejects_bad_headers() {
    let err = parse_mat_bytes(&[0u8; 10]).unwrap_err();
    assert!(err.to_string().contains("too small"));

    let mut bytes = mat_file_bytes(&[], false);
    bytes[126] = b'X';
    let err = parse_mat_bytes(&bytes).unwrap_err();
    assert!(err.to_string().contains("endian indicator"));

    let mut bytes = mat_file_bytes(&[], false);
    bytes[124] = 0x00;
    bytes[125] = 0x02;
    let err = parse_mat_bytes(&bytes).unwrap_err();
    assert!(err.to_string().contains("unsupported MAT version"));

    let mut bytes = b"MATLAB 7.3 MAT-file".to_vec();
    bytes.resize(128, b' ');
    let err = parse_mat_bytes(&bytes).unwrap_err();
    assert!(err.to_string().contains("v7.3"));
}

#[test]
fn test_truncated_element_is_an_error() {
    let mut bytes = mat_file_bytes(&[("m", MatFixture::row(&[1.0, 2.0]))], false);
    bytes.truncate(bytes.len() - 12);
    let err = parse_mat_bytes(&bytes).unwrap_err();
    assert!(matches!(err, InputError::Mat(_)));
}

#[test]
fn test_duplicate_variable_keeps_first() {
    let vars = vec![
        ("v", MatFixture::scalar(1.0)),
        ("v", MatFixture::scalar(2.0)),
    ];
    let mat = parse_mat_bytes(&mat_file_bytes(&vars, false)).unwrap();
    assert_eq!(mat.get("v").unwrap().scalar(), Some(1.0));
}

#[test]
fn test_multirow_char_array_is_split_into_lines() {
    assert_eq!(reshape_chars(&[2, 2], &['a', 'c', 'b', 'd']), "ab\ncd");
    assert_eq!(reshape_chars(&[1, 3], &['x', 'y', 'z']), "xyz");
}

#[test]
fn test_decode_numeric_widths() {
    let raw = [0xffu8, 0x7f];
    assert_eq!(decode_numeric(MI_INT16, &raw, false).unwrap(), vec![32767.0]);
    assert_eq!(decode_numeric(MI_INT8, &[0xff], false).unwrap(), vec![-1.0]);
    assert_eq!(
        decode_numeric(MI_UINT32, &1u32.to_be_bytes(), true).unwrap(),
        vec![1.0]
    );
    assert!(decode_numeric(MI_DOUBLE, &[0u8; 5], false).is_err());
    assert!(decode_numeric(MI_MATRIX, &[0u8; 8], false).is_err());
}

fn put_u32(out: &mut Vec<u8>, v: u32, big_endian: bool) {
    if big_endian {
        out.extend_from_slice(&v.to_be_bytes());
    } else {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn put_element(out: &mut Vec<u8>, ty: u32, data: &[u8], big_endian: bool) {
    put_u32(out, ty, big_endian);
    put_u32(out, data.len() as u32, big_endian);
    out.extend_from_slice(data);
    while out.len() % 8 != 0 {
        out.push(0);
    }
}

fn put_small_element(out: &mut Vec<u8>, ty: u32, data: &[u8], big_endian: bool) {
    put_u32(out, ((data.len() as u32) << 16) | ty, big_endian);
    out.extend_from_slice(data);
    while out.len() % 8 != 0 {
        out.push(0);
    }
}

fn header(big_endian: bool) -> Vec<u8> {
    let mut out = b"MATLAB 5.0 MAT-file, Platform: SOL2".to_vec();
    out.resize(116, b' ');
    out.extend_from_slice(&[0u8; 8]);
    if big_endian {
        out.extend_from_slice(&0x0100u16.to_be_bytes());
        out.extend_from_slice(b"MI");
    } else {
        out.extend_from_slice(&0x0100u16.to_le_bytes());
        out.extend_from_slice(b"IM");
    }
    out
}

fn matrix_head(class: u8, dims: &[i32], name: &str, big_endian: bool) -> Vec<u8> {
    let mut body = Vec::new();
    let mut flags = Vec::new();
    put_u32(&mut flags, class as u32, big_endian);
    put_u32(&mut flags, 0, big_endian);
    put_element(&mut body, MI_UINT32, &flags, big_endian);
    let mut dim_bytes = Vec::new();
    for &d in dims {
        put_u32(&mut dim_bytes, d as u32, big_endian);
    }
    put_element(&mut body, MI_INT32, &dim_bytes, big_endian);
    put_small_element(&mut body, MI_INT8, name.as_bytes(), big_endian);
    body
}

#[test]
fn test_parse_big_endian_file() {
    let mut out = header(true);

    let mut m = matrix_head(MX_DOUBLE, &[1, 2], "v", true);
    let data: Vec<u8> = [1.5f64, -2.0].iter().flat_map(|v| v.to_be_bytes()).collect();
    put_element(&mut m, MI_DOUBLE, &data, true);
    put_element(&mut out, MI_MATRIX, &m, true);

    let mut s = matrix_head(MX_CHAR, &[1, 2], "s", true);
    let chars: Vec<u8> = "ok".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
    put_small_element(&mut s, MI_UINT16, &chars, true);
    put_element(&mut out, MI_MATRIX, &s, true);

    let mat = parse_mat_bytes(&out).unwrap();
    let v = mat.get("v").unwrap();
    assert_eq!(v.dims(), &[1, 2]);
    assert_eq!(v.as_f64_slice().unwrap(), &[1.5, -2.0]);
    assert_eq!(mat.get("s").unwrap().as_text(), Some("ok"));
}

#[test]
fn test_sparse_array_is_rejected() {
    let mut out = header(false);
    let mut m = matrix_head(MX_SPARSE, &[2, 2], "sp", false);
    put_element(&mut m, MI_INT32, &[0u8; 8], false);
    put_element(&mut out, MI_MATRIX, &m, false);

    let err = parse_mat_bytes(&out).unwrap_err();
    match err {
        InputError::Mat(msg) => assert!(msg.contains("sparse")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_oversized_dimensions_are_an_error() {
    let mut out = header(false);
    let m = matrix_head(MX_CELL, &[0x7fff_ffff; 3], "c", false);
    put_element(&mut out, MI_MATRIX, &m, false);
    let err = parse_mat_bytes(&out).unwrap_err();
    assert!(matches!(err, InputError::Mat(_)));

    // a cell claiming far more items than the element holds
    let mut out = header(false);
    let m = matrix_head(MX_CELL, &[1, 0x7fff_ffff], "c", false);
    put_element(&mut out, MI_MATRIX, &m, false);
    let err = parse_mat_bytes(&out).unwrap_err();
    assert!(matches!(err, InputError::Mat(_)));
}
