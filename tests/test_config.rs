use mutation_brawler::config::Tuning;
use mutation_brawler::error::BrawlerError;

#[test]
fn defaults_are_valid() {
    let t = Tuning::default();
    assert!(t.validate().is_ok());
    assert_eq!(t.arena_width, 960.0);
    assert_eq!(t.xp_first_level, 100);
    assert_eq!(t.boss_wave_interval, 5);
    assert_eq!(t.backpack_capacity, 6);
}

#[test]
fn empty_toml_gives_defaults() {
    let t = Tuning::from_toml_str("").expect("empty config is fine");
    assert_eq!(t, Tuning::default());
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let t = Tuning::from_toml_str(
        r#"
        arena_width = 1200.0
        boss_wave_interval = 3
        "#,
    )
    .expect("valid config");
    assert_eq!(t.arena_width, 1200.0);
    assert_eq!(t.boss_wave_interval, 3);
    assert_eq!(t.play_band_min, Tuning::default().play_band_min);
    assert_eq!(t.drop_chance, Tuning::default().drop_chance);
}

#[test]
fn inverted_play_band_is_rejected() {
    let result = Tuning::from_toml_str(
        r#"
        play_band_min = 500.0
        play_band_max = 400.0
        "#,
    );
    assert!(matches!(result, Err(BrawlerError::InvalidTuning(_))));
}

#[test]
fn out_of_range_drop_chance_is_rejected() {
    let result = Tuning::from_toml_str("drop_chance = 1.5");
    assert!(matches!(result, Err(BrawlerError::InvalidTuning(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let result = Tuning::from_toml_str("arena_width = \"wide\"");
    assert!(matches!(result, Err(BrawlerError::ConfigParse(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = Tuning::load(std::path::Path::new("/nonexistent/brawler.toml"));
    assert!(matches!(result, Err(BrawlerError::Io(_))));
}
