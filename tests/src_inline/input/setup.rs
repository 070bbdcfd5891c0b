use std::io::Cursor;

use serde_json::json;

use super::*;
use crate::test_support::make_temp_dir;

fn config_json() -> serde_json::Value {
    json!({
        "search_model": "greedy",
        "target_similarity": "correlation",
        "prior": "deepgaze",
        "max_saccades": 12,
        "cell_size": 32,
        "scale_factor": 3.0,
        "additive_shift": 4.0,
        "seed": 12345,
        "multiprocessing": "all",
        "save_probability_maps": false,
        "history_size": 8
    })
}

fn trials(names: &[&str]) -> Vec<TrialProperties> {
    names
        .iter()
        .map(|n| serde_json::from_value(json!({ "image": n, "target": "t.jpg" })).unwrap())
        .collect()
}

fn checkpoint() -> Checkpoint {
    Checkpoint {
        configuration: serde_json::from_value(config_json()).unwrap(),
        trials_properties: trials(&["img003.jpg"]),
        extra: Default::default(),
    }
}

#[test]
fn test_no_checkpoint_file_means_fresh_run() {
    let dir = make_temp_dir();
    let mut prompt = Vec::new();
    let cp = load_checkpoint(&dir, &mut Cursor::new(""), &mut prompt).unwrap();
    assert!(cp.is_none());
    assert!(prompt.is_empty());
}

#[test]
fn test_checkpoint_prompt_retries_until_valid_answer() {
    let dir = make_temp_dir();
    save_checkpoint(&dir, &checkpoint()).unwrap();

    let mut prompt = Vec::new();
    let cp = load_checkpoint(&dir, &mut Cursor::new("maybe\ny\n"), &mut prompt)
        .unwrap()
        .unwrap();
    assert_eq!(cp, checkpoint());

    let text = String::from_utf8(prompt).unwrap();
    assert_eq!(text.matches("Checkpoint found! Resume execution? (Y/N): ").count(), 2);
    assert!(text.contains("Invalid answer. Please try again"));
    assert!(dir.join(CHECKPOINT_FILE).exists());
}

#[test]
fn test_declining_checkpoint_deletes_it() {
    let dir = make_temp_dir();
    save_checkpoint(&dir, &checkpoint()).unwrap();
    let mut prompt = Vec::new();
    let cp = load_checkpoint(&dir, &mut Cursor::new("N\n"), &mut prompt).unwrap();
    assert!(cp.is_none());
    assert!(!dir.join(CHECKPOINT_FILE).exists());
}

#[test]
fn test_checkpoint_prompt_without_answer_fails() {
    let dir = make_temp_dir();
    save_checkpoint(&dir, &checkpoint()).unwrap();
    let mut prompt = Vec::new();
    let err = load_checkpoint(&dir, &mut Cursor::new("x\n"), &mut prompt).unwrap_err();
    assert!(matches!(err, InputError::InvalidInput(_)));
}

#[test]
fn test_load_config_prefers_checkpoint() {
    let dir = make_temp_dir();
    write_json_pretty(&dir.join("default.json"), &config_json()).unwrap();

    let config = load_config(&dir, "default", None).unwrap();
    assert_eq!(config.max_saccades, 12);
    assert!(config.multiprocessing.is_enabled());
    assert_eq!(config.extra.get("history_size"), Some(&json!(8)));

    let mut cp = checkpoint();
    cp.configuration.max_saccades = 3;
    let config = load_config(&dir, "missing", Some(&cp)).unwrap();
    assert_eq!(config.max_saccades, 3);

    assert!(load_config(&dir, "missing", None).is_err());
}

#[test]
fn test_trial_selection() {
    let dir = make_temp_dir();
    let file = dir.join("trials_properties.json");
    write_json_pretty(&file, &trials(&["a.jpg", "b.jpg", "c.jpg", "b.jpg"])).unwrap();

    let all = load_trials_properties(&file, None, None, None).unwrap();
    assert_eq!(all.len(), 4);

    let one = load_trials_properties(&file, Some("b.jpg"), None, None).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].image, "b.jpg");

    let err = load_trials_properties(&file, Some("z.jpg"), None, None).unwrap_err();
    assert!(matches!(err, InputError::ImageNotInDataset(_)));

    let range = load_trials_properties(&file, None, Some((2, 3)), None).unwrap();
    let names: Vec<&str> = range.iter().map(|t| t.image.as_str()).collect();
    assert_eq!(names, vec!["b.jpg", "c.jpg"]);

    let err = load_trials_properties(&file, None, Some((10, 12)), None).unwrap_err();
    assert!(matches!(err, InputError::RangeOutOfScope { start: 10, end: 12 }));

    let resumed =
        load_trials_properties(&dir.join("absent.json"), Some("a.jpg"), None, Some(&checkpoint()))
            .unwrap();
    assert_eq!(resumed[0].image, "img003.jpg");
}

#[test]
fn test_create_output_folders() {
    let dir = make_temp_dir();
    let plain = create_output_folders(&dir, "default", None, None).unwrap();
    assert_eq!(plain, dir.join("default"));
    assert!(plain.is_dir());

    let image = create_output_folders(&dir, "default", Some("img007.jpg"), None).unwrap();
    assert_eq!(image, dir.join("default").join("img007"));

    let ranged = create_output_folders(&dir, "default", None, Some((1, 20))).unwrap();
    assert_eq!(ranged, dir.join("default").join("range_1-20"));
    assert!(ranged.is_dir());
}

#[test]
fn test_load_dataset_info_keeps_extra_keys() {
    let dir = make_temp_dir();
    let path = dir.join("dataset_info.json");
    write_json_pretty(
        &path,
        &json!({ "max_scanpath_length": 13, "number_of_images": 134, "mean_target_size": [72, 72] }),
    )
    .unwrap();
    let info = load_dataset_info(&path).unwrap();
    assert_eq!(info.max_scanpath_length, 13);
    assert_eq!(info.number_of_images, 134);
    assert!(info.extra.contains_key("mean_target_size"));
}
