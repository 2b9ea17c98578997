use log::info;

use crate::{
    config::{Config, ConfigError},
    dedup::DuplicateEliminator,
    search::SubstitutionEngine,
    synth::{EquationGen, Grammar},
    tokenize::{tokenize, Buckets},
    validate::validate,
    value::ResultMap,
};

/// Generation, validation, tokenization and deduplication: everything up to
/// the templates the substitution engine consumes.
pub fn templates(config: &Config) -> Result<Buckets, ConfigError> {
    config.validate()?;

    let grammar = Grammar::new(&config.placeholder, &config.functions);
    let raw = EquationGen::new(&grammar, config.max_length, config.num_variables)
        .collect::<Vec<_>>();

    let valid = validate(raw, &config.placeholder);
    let buckets = tokenize(valid, &config.placeholder, config.num_variables)?;
    let buckets = DuplicateEliminator::new(&config.witnesses).eliminate(buckets)?;

    info!("Final list: {}", buckets.template_count());

    Ok(buckets)
}

pub fn run(config: &Config) -> Result<ResultMap, ConfigError> {
    let buckets = templates(config)?;

    SubstitutionEngine::new(&config.catalog).run(&buckets)
}
