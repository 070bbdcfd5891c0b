use serde_json::json;

use super::*;
use crate::input::write_json_pretty;
use crate::test_support::make_temp_dir;

fn params() -> IrlExportParams {
    IrlExportParams {
        grid: PatchGrid::new((16, 16), (32, 20)),
        image_width: 512,
        image_height: 320,
        dataset_name: "COCOSearch18".to_string(),
        max_saccades: 6,
    }
}

fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let trajs = dir.join("trajectories.json");
    write_json_pretty(
        &trajs,
        &json!([
            { "task": "bottle", "image": "a.jpg", "initial_fix": [0.5, 0.5], "actions": [33, 330, 0] },
            { "task": "bottle", "image": "b.jpg", "initial_fix": [0.0, 0.0], "condition": "absent", "actions": [1] }
        ]),
    )
    .unwrap();
    let annos = dir.join("bbox_annos.json");
    write_json_pretty(
        &annos,
        &json!({ "bottle_a.jpg": [10.0, 10.0, 20.0, 20.0], "bottle_b.jpg": [400.0, 300.0, 10.0, 10.0] }),
    )
    .unwrap();
    (trajs, annos)
}

#[test]
fn test_export_without_annotations() {
    let dir = make_temp_dir();
    let (trajs, _) = write_inputs(&dir);
    let out = dir.join("out");
    let map = export_scanpaths(&trajs, None, &out, &params()).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["a.jpg"].len(), 4);
    assert!(!map["a.jpg"].target_found);
    assert!(scanpaths_output_path(&out).exists());
}

#[test]
fn test_export_cuts_at_target() {
    let dir = make_temp_dir();
    let (trajs, annos) = write_inputs(&dir);
    let out = dir.join("out");
    let map = export_scanpaths(&trajs, Some(&annos), &out, &params()).unwrap();

    // action 33 lands on (16, 16), inside the 10..30 box
    let a = &map["a.jpg"];
    assert!(a.target_found);
    assert_eq!(a.x, vec![256.0, 16.0]);
    assert_eq!(a.target_bbox, [10.0, 10.0, 30.0, 30.0]);
    assert!(!map["b.jpg"].target_found);

    let saved: ScanpathMap = read_json(&scanpaths_output_path(&out)).unwrap();
    assert_eq!(&saved, &map);
}

#[test]
fn test_missing_trajectories_file() {
    let dir = make_temp_dir();
    let err = export_scanpaths(&dir.join("none.json"), None, &dir, &params()).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}
