use strongarm::{
    config::{default_catalog, variable_names, Config, ConfigError, Constant, MAGNITUDE_BOUND},
    dedup::DuplicateEliminator,
    expr::Expression,
    pipeline,
    search::SubstitutionEngine,
    sql,
    value::{ResultMap, ValueKey},
};

pub const SMALL_MAX_LENGTH: usize = 9;
pub const SMALL_NUM_VARIABLES: usize = 2;

fn init_logging() {
    let _ = colog::default_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

fn small_config() -> Config {
    Config::new(SMALL_MAX_LENGTH, SMALL_NUM_VARIABLES)
}

fn run(config: &Config) -> ResultMap {
    init_logging();

    pipeline::run(config).expect("config should be valid")
}

#[test]
fn square_root_of_two() {
    let config = Config::new(7, 1)
        .with_catalog(vec![Constant::integer(1), Constant::integer(2)])
        .with_function_names(["sqrt"])
        .unwrap();

    let buckets = pipeline::templates(&config).unwrap();
    assert_eq!(buckets.get(0), ["z", "sqrt(z)"]);

    let results = run(&config);
    assert_eq!(results.len(), 1);
    assert_eq!(results.lookup(2f64.sqrt()), Some("sqrt(2)"));
    assert_eq!(results.lookup(1.0), None);
}

#[test]
fn results_are_bounded_non_integers() {
    let results = run(&small_config());

    assert!(!results.is_empty());
    for (value, equation) in results.iter() {
        assert!(value.is_finite(), "{equation} -> {value}");
        assert!(value.fract() != 0.0, "{equation} -> {value}");
        assert!(value.abs() <= MAGNITUDE_BOUND, "{equation} -> {value}");
    }
}

#[test]
fn equations_evaluate_to_their_keys() {
    let results = run(&small_config());

    for (value, equation) in results.iter() {
        let expr = Expression::build(equation, Vec::<String>::new())
            .unwrap_or_else(|e| panic!("{equation:?} does not parse: {e}"));
        let res = expr.evaluate(&[]).unwrap();

        assert_eq!(ValueKey::of(res), ValueKey::new(value), "{equation}");
    }
}

#[test]
fn runs_are_deterministic() {
    let config = small_config();

    assert_eq!(run(&config), run(&config));
}

#[test]
fn shorter_templates_win_over_longer_equivalents() {
    let results = run(&small_config());

    assert_eq!(results.lookup(std::f64::consts::PI / 2.0), Some("pi/2"));
    assert_eq!(results.lookup(std::f64::consts::E.sqrt()), Some("sqrt(e)"));
    assert_eq!(results.lookup(0.5), Some("1/2"));
}

#[test]
fn deduplication_is_idempotent() {
    init_logging();
    let config = small_config();
    let buckets = pipeline::templates(&config).unwrap();
    let dedup = DuplicateEliminator::new(&config.witnesses);

    assert!(dedup.find_duplicates(&buckets).unwrap().is_empty());
    assert_eq!(dedup.eliminate(buckets.clone()).unwrap(), buckets);
}

#[test]
fn every_template_is_tried_with_every_assignment() {
    init_logging();
    let catalog = vec![Constant::new("e", std::f64::consts::E), Constant::integer(3), Constant::integer(7)];
    let engine = SubstitutionEngine::new(&catalog);
    let names = variable_names(1).unwrap();
    let mut results = ResultMap::new();

    // z/9 is a fresh non-integer for each of the three constants
    assert_eq!(engine.search_template("z/9", &names, &mut results), 3);
    assert_eq!(results.lookup(std::f64::consts::E / 9.0), Some("e/9"));
    assert_eq!(results.lookup(3.0 / 9.0), Some("3/9"));
    assert_eq!(results.lookup(7.0 / 9.0), Some("7/9"));
}

#[test]
fn dump_round_trips_through_the_file_system() {
    let results = run(&Config::new(7, 1).with_catalog(default_catalog()));
    let dir = std::env::temp_dir().join(format!("strongarm-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(sql::DEFAULT_OUTPUT);

    sql::save(&results, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();

    assert_eq!(text.lines().count(), results.len());
    for line in text.lines() {
        let rest = line.strip_prefix("insert into strongarm (equation, result) values ('").unwrap();
        let (equation, value) = rest.strip_suffix(");").unwrap().split_once("',").unwrap();

        assert!(!value.contains(['e', 'E']), "{line}");
        let value = value.parse::<f64>().unwrap();
        assert!(results.iter().any(|entry| entry == (value, equation)), "{line}");
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn invalid_config_fails_before_any_work() {
    let config = Config::new(SMALL_MAX_LENGTH, 4);

    assert_eq!(
        pipeline::run(&config),
        Err(ConfigError::NotEnoughWitnesses { witnesses: 3, variables: 4 }),
    );
}
