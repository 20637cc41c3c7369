use glam::dvec2;
use sac_core::config::ChartConfig;
use sac_core::layout::{base_position, spiral_offset, LayoutParams};
use sac_core::{LayoutEngine, LayoutError, Person, Viewport};

fn wide_engine() -> LayoutEngine {
    let config = ChartConfig::default();
    let viewport = Viewport::new(1000.0, 700.0, false);
    LayoutEngine::new(LayoutParams::for_viewport(&config, &viewport).unwrap())
}

fn people(scores: &[(i64, i64)]) -> Vec<Person> {
    scores
        .iter()
        .enumerate()
        .map(|(index, (food, character))| {
            Person::new(&format!("@p{index}"), *food, *character).unwrap()
        })
        .collect()
}

#[test]
fn scores_map_into_the_padded_area_with_character_inverted() {
    let engine = wide_engine();
    let area = engine.params().area;
    assert_eq!(base_position(&area, 0, 100), dvec2(50.0, 50.0));
    assert_eq!(base_position(&area, 100, 0), dvec2(950.0, 650.0));
    assert_eq!(base_position(&area, 50, 50), dvec2(500.0, 350.0));
}

#[test]
fn far_apart_people_are_not_displaced() {
    let placements = wide_engine().place(&people(&[(0, 0), (100, 100), (50, 50)]));
    assert_eq!(placements.len(), 3);
    for placement in &placements {
        assert!(!placement.is_displaced());
        assert_eq!(placement.offset, dvec2(0.0, 0.0));
        assert_eq!(placement.position, placement.base);
    }
}

#[test]
fn identical_scores_are_separated_along_the_spiral() {
    let engine = wide_engine();
    let min_distance = engine.params().min_distance;
    let max_attempts = engine.params().max_attempts;
    let placements = engine.place(&people(&[(50, 50), (50, 50), (50, 50)]));

    assert!(!placements[0].is_displaced());
    assert_eq!(placements[1].attempt, Some(0));
    assert_eq!(placements[1].position, dvec2(530.0, 350.0));

    for placement in &placements[1..] {
        let attempt = placement.attempt.unwrap();
        assert_eq!(
            placement.offset,
            spiral_offset(attempt, max_attempts, min_distance)
        );
    }
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            assert!(a.position.distance(b.position) >= min_distance);
        }
    }
}

#[test]
fn first_in_sequence_keeps_its_base_position() {
    let engine = wide_engine();
    let forward = engine.place(&people(&[(50, 50), (51, 50)]));
    let backward = engine.place(&people(&[(51, 50), (50, 50)]));

    assert!(!forward[0].is_displaced());
    assert!(forward[1].is_displaced());
    assert!(!backward[0].is_displaced());
    assert_eq!(backward[0].base, forward[1].base);
}

#[test]
fn layout_is_deterministic() {
    let engine = wide_engine();
    let input = people(&[(50, 50), (50, 50), (52, 49), (10, 90), (11, 90)]);
    assert_eq!(engine.place(&input), engine.place(&input));
}

#[test]
fn crowded_spot_falls_back_to_last_spiral_point() {
    let engine = wide_engine();
    let max_attempts = engine.params().max_attempts;
    let crowd = vec![(50u8, 50u8); 200];
    let placements = engine.place_scores(crowd);

    assert_eq!(placements.len(), 200);
    let last = placements.last().unwrap();
    assert_eq!(last.attempt, Some(max_attempts - 1));
    assert_eq!(
        last.offset,
        spiral_offset(max_attempts - 1, max_attempts, engine.params().min_distance)
    );
}

#[test]
fn breakpoint_picks_the_profile() {
    let config = ChartConfig::default();

    let narrow = Viewport::for_window(&config, 768.0);
    assert!(narrow.narrow);
    assert_eq!(narrow.width, 758.0);
    assert_eq!(narrow.height, 700.0);

    let wide = Viewport::for_window(&config, 1024.0);
    assert!(!wide.narrow);
    assert_eq!(wide.width, 984.0);

    let params = LayoutParams::for_viewport(&config, &narrow).unwrap();
    assert_eq!(params.min_distance, 25.0);
    assert_eq!(params.avatar_size, 20.0);
    assert_eq!(params.area.padding, 35.0);
}

#[test]
fn tiny_viewport_is_rejected() {
    let config = ChartConfig::default();
    let viewport = Viewport::new(60.0, 700.0, true);
    assert!(matches!(
        LayoutParams::for_viewport(&config, &viewport),
        Err(LayoutError::EmptyPlotArea { .. })
    ));
}
