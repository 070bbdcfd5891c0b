use super::*;
use crate::input::read_json;
use crate::test_support::{TrialFixture, make_temp_dir, subject_struct, write_mat_file};

fn trial(x: Vec<f64>, y: Vec<f64>, found: bool, nsaccades: u32) -> SubjectTrial {
    let dur = vec![0.2; x.len()];
    SubjectTrial {
        image_name: "img001.jpg".to_string(),
        image_size: (768, 1024),
        screen_size: (768, 1024),
        target_rect: [101.0, 201.0, 172.0, 272.0],
        target_found: found,
        nsaccades_allowed: nsaccades,
        x,
        y,
        dur,
    }
}

#[test]
fn test_coordinates_shift_to_zero_based() {
    let profile = ConversionProfile::cibs_v1();
    let mut stats = ConversionStats::default();
    let trials = vec![trial(vec![0.5, 131.0], vec![10.0, 231.0], true, 4)];
    let map = convert_trials("07", &trials, &profile, &mut stats);
    let r = &map["img001.jpg"];

    assert_eq!(r.x, vec![0.0, 130.0]);
    assert_eq!(r.y, vec![9.0, 230.0]);
    assert_eq!(r.t, vec![0.2, 0.2]);
    assert_eq!(r.target_bbox, [200.0, 100.0, 271.0, 171.0]);
    assert_eq!(r.max_fixations, 5);
    assert_eq!(r.subject, "07");
    assert_eq!(r.dataset, "cIBS Dataset");
    assert!(r.target_found);
    assert_eq!(stats.targets_found, 1);
    assert_eq!(stats.trials_written, 1);
}

#[test]
fn test_long_scanpath_is_truncated_and_not_found() {
    let profile = ConversionProfile::cibs_v1();
    let mut stats = ConversionStats::default();
    let xs: Vec<f64> = (1..=20).map(|i| i as f64).collect();
    let trials = vec![trial(xs.clone(), xs, true, 30)];
    let map = convert_trials("01", &trials, &profile, &mut stats);
    let r = &map["img001.jpg"];
    assert_eq!(r.len(), 13);
    assert_eq!(r.t.len(), 13);
    assert_eq!(r.max_fixations, 13);
    assert!(!r.target_found);
    assert_eq!(stats.truncated, 1);
    assert_eq!(stats.targets_found, 0);
}

#[test]
fn test_large_allowance_counts_as_truncated_but_keeps_short_scanpath() {
    let profile = ConversionProfile::cibs_v1();
    let mut stats = ConversionStats::default();
    let trials = vec![trial(vec![131.0], vec![231.0], true, 30)];
    let map = convert_trials("01", &trials, &profile, &mut stats);
    assert_eq!(map["img001.jpg"].max_fixations, 13);
    assert!(map["img001.jpg"].target_found);
    assert_eq!(map["img001.jpg"].len(), 1);
    assert_eq!(stats.truncated, 1);
}

#[test]
fn test_last_fixation_outside_target_clears_found() {
    let profile = ConversionProfile::cibs_v1();
    let mut stats = ConversionStats::default();
    // bbox columns 100..171 grown by 32 -> 68..203
    let inside = trial(vec![204.0], vec![231.0], true, 4);
    let outside = trial(vec![205.0], vec![231.0], true, 4);
    let map = convert_trials("01", &[inside], &profile, &mut stats);
    assert!(map["img001.jpg"].target_found);
    let map = convert_trials("01", &[outside], &profile, &mut stats);
    assert!(!map["img001.jpg"].target_found);
    assert_eq!(stats.targets_found, 1);
    assert_eq!(stats.wrong_targets_found, 1);
}

#[test]
fn test_empty_scanpath_is_skipped() {
    let profile = ConversionProfile::cibs_v1();
    let mut stats = ConversionStats::default();
    let map = convert_trials("01", &[trial(vec![], vec![], false, 4)], &profile, &mut stats);
    assert!(map.is_empty());
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.trials_written, 0);
}

#[test]
fn test_within_receptive_bounds_is_inclusive() {
    let profile = ConversionProfile::cibs_v1();
    let bbox = [100.0, 100.0, 200.0, 200.0];
    assert!(within_receptive_bounds(&bbox, 68.0, 232.0, &profile));
    assert!(!within_receptive_bounds(&bbox, 67.9, 150.0, &profile));
    assert!(!within_receptive_bounds(&bbox, 150.0, 232.1, &profile));
}

#[test]
fn test_convert_subjects_writes_one_file_per_subject() {
    let dir = make_temp_dir();
    let subjects_dir = dir.join("subjects");
    let save_dir = dir.join("human_scanpaths");
    std::fs::create_dir_all(&subjects_dir).unwrap();

    let info = subject_struct(&[
        TrialFixture {
            image_name: "img001.jpg",
            target_rect: [101.0, 201.0, 172.0, 272.0],
            target_found: true,
            nsaccades_allowed: 4.0,
            x: &[500.0, 131.0],
            y: &[400.0, 231.0],
            dur: &[0.3, 0.2],
        },
        TrialFixture {
            image_name: "img002.jpg",
            target_rect: [1.0, 1.0, 10.0, 10.0],
            target_found: false,
            nsaccades_allowed: 4.0,
            x: &[],
            y: &[],
            dur: &[],
        },
    ]);
    write_mat_file(&subjects_dir.join("info_per_subj_3.mat"), &[("info_per_subj", info.clone())], true);
    write_mat_file(&subjects_dir.join("info_per_subj_11.mat"), &[("info_per_subj", info)], false);
    std::fs::write(subjects_dir.join("README.txt"), "not a subject").unwrap();

    let stats = convert_subjects(&subjects_dir, &save_dir, &ConversionProfile::cibs_v1()).unwrap();
    assert_eq!(stats.subjects, 2);
    assert_eq!(stats.trials_written, 2);
    assert_eq!(stats.empty, 2);
    assert_eq!(stats.targets_found, 2);

    let subj03: ScanpathMap = read_json(&save_dir.join(subject_output_name("03"))).unwrap();
    assert_eq!(subj03.len(), 1);
    assert_eq!(subj03["img001.jpg"].x, vec![499.0, 130.0]);
    assert!(save_dir.join("subj11_scanpaths.json").exists());
}
