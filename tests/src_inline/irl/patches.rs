use super::*;

fn grid() -> PatchGrid {
    PatchGrid::new((16, 16), (4, 3))
}

#[test]
fn test_action_position_mapping() {
    let g = grid();
    assert_eq!(g.n_actions(), 12);
    assert_eq!(g.pos_to_action(0.0, 0.0), 0);
    assert_eq!(g.pos_to_action(17.0, 0.0), 1);
    assert_eq!(g.pos_to_action(5.0, 33.0), 8);
    assert_eq!(g.action_to_pos(0), (8.0, 8.0));
    assert_eq!(g.action_to_pos(6), (40.0, 24.0));
    for a in 0..g.n_actions() {
        let (x, y) = g.action_to_pos(a);
        assert_eq!(g.pos_to_action(x, y), a);
    }
}

#[test]
fn test_overlap_ratio() {
    let g = grid();
    let ratio = g.overlap_ratio(&[8.0, 8.0, 16.0, 8.0]);
    assert_eq!(ratio.len(), 12);
    assert_eq!(ratio[0], 0.25);
    assert_eq!(ratio[1], 0.25);
    assert_eq!(ratio.iter().filter(|&&r| r > 0.0).count(), 2);

    let full = g.overlap_ratio(&[0.0, 0.0, 64.0, 48.0]);
    assert!(full.iter().all(|&r| r == 1.0));
}

#[test]
fn test_overlap_clips_to_grid() {
    let g = grid();
    let ratio = g.overlap_ratio(&[56.0, 40.0, 100.0, 100.0]);
    assert_eq!(ratio[11], 0.25);
    assert_eq!(ratio.iter().filter(|&&r| r > 0.0).count(), 1);
}

#[test]
fn test_multi_hot() {
    let g = grid();
    let hot = g.multi_hot(&[8.0, 8.0, 16.0, 8.0]);
    assert_eq!(&hot[..3], &[1.0, 1.0, 0.0]);

    // degenerate box on a patch border overlaps nothing
    let hot = g.multi_hot(&[16.0, 16.0, 0.0, 0.0]);
    assert_eq!(hot.iter().sum::<f32>(), 1.0);
    assert_eq!(hot[5], 1.0);

    let hot = g.multi_hot(&[500.0, 500.0, 0.0, 0.0]);
    assert_eq!(hot[11], 1.0);
}

#[test]
fn test_foveal_mask() {
    let mask = foveal_mask(1.0, 1.0, 1.0, 3, 3);
    assert_eq!(
        mask,
        vec![0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0]
    );
}
