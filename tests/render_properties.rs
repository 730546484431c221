// tests/render_properties.rs

use proptest::prelude::*;

use fleetdeploy::progress::{bar_fill, percentage, BAR_WIDTH};
use fleetdeploy::types::{HighlightColor, ProgressStyle};
use fleetdeploy::DeploymentProgress;

// (total, index) pairs with 0 <= index < total.
fn position_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..500).prop_flat_map(|total| (Just(total), 0..total))
}

proptest! {
    #[test]
    fn percentage_matches_ratio((total, index) in position_strategy()) {
        let pct = percentage(index, total);
        prop_assert_eq!(pct, index as f64 / total as f64 * 100.0);
        prop_assert!((0.0..100.0).contains(&pct));
    }

    #[test]
    fn bar_fill_is_floor_and_clamped((total, index) in position_strategy()) {
        let pct = percentage(index, total);
        let filled = bar_fill(pct);
        prop_assert_eq!(filled, (30.0 * pct / 100.0).floor() as usize);
        prop_assert!(filled <= BAR_WIDTH);
    }

    #[test]
    fn bar_line_has_fixed_width((total, index) in position_strategy()) {
        let mut progress = DeploymentProgress::new();
        progress.total_tasks = total;
        let line = progress.render(index, "task", ProgressStyle::Bar, HighlightColor::None);

        let bar_end = line.find(']').unwrap();
        let bar = &line[1..bar_end];
        prop_assert_eq!(bar.chars().count(), BAR_WIDTH);

        let filled = bar.chars().take_while(|c| *c == '=').count();
        prop_assert_eq!(filled, bar_fill(percentage(index, total)));
        // Marker directly follows the filled region.
        prop_assert_eq!(bar.chars().nth(filled), Some('>'));
        let suffix = format!("({}/{}) Current: task", index + 1, total);
        prop_assert!(line.ends_with(&suffix));
    }

    #[test]
    fn render_does_not_mutate((total, index) in position_strategy()) {
        let mut progress = DeploymentProgress::new();
        progress.total_tasks = total;
        let before = progress.clone();
        let _ = progress.render(index, "x", ProgressStyle::Percentage, HighlightColor::Cyan);
        prop_assert_eq!(before, progress);
    }
}

#[test]
fn out_of_range_percentages_are_clamped() {
    assert_eq!(bar_fill(-5.0), 0);
    assert_eq!(bar_fill(250.0), BAR_WIDTH);
    assert_eq!(percentage(5, 0), 0.0);
}
