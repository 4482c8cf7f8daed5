use obcanka::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../obcanka.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");

    assert_eq!(cfg.extraction.min_image_bytes, 200);
    assert_eq!(cfg.extraction.row_band, 100.0);
    assert_eq!(cfg.parser.inline_number_cutoff, 10);
    assert_eq!(cfg.parser.skip_headers.len(), 2);
    assert!(cfg.binder.exclude.contains(&[17, 8]));
    assert!(!cfg.binder.keywords.is_empty());
    assert_eq!(cfg.validation.expected_orphans, 5);
    assert!(!cfg.download.url.is_empty());
}

#[test]
fn example_config_matches_defaults() {
    let raw = include_str!("../obcanka.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    let defaults = Config::default();

    assert_eq!(cfg.parser.answer_marker, defaults.parser.answer_marker);
    assert_eq!(cfg.parser.date_prefix, defaults.parser.date_prefix);
    assert_eq!(cfg.binder.keywords, defaults.binder.keywords);
    assert_eq!(cfg.binder.exclude, defaults.binder.exclude);
    assert_eq!(
        cfg.extraction.min_image_bytes,
        defaults.extraction.min_image_bytes
    );
}

#[test]
fn empty_config_falls_back_to_defaults() {
    let cfg: Config = toml::from_str("").expect("parse empty TOML");
    assert_eq!(cfg.binder.grid_options, 4);
    assert_eq!(cfg.binder.short_option_max_len, 50);
    assert!(cfg.global.print_summary);
}
