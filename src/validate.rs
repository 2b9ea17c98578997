use log::{info, trace};

use crate::expr::{identifier_spans, Expression};

/// Whether `candidate` parses into a well-formed expression, with
/// `placeholder` as its only free variable if it uses one at all.
pub fn is_well_formed(candidate: &str, placeholder: &str) -> bool {
    let uses_placeholder = identifier_spans(candidate).into_iter()
        .any(|span| &candidate[span] == placeholder);
    let declared = if uses_placeholder { vec![placeholder] } else { vec![] };

    match Expression::build(candidate, declared) {
        Ok(expr) => expr.is_structurally_valid(true),
        Err(e) => {
            trace!("Dropping {candidate:?}: {e}");
            false
        },
    }
}

/// Keeps the candidates that parse. Most raw candidates do not, which is
/// expected and not worth more than a count.
pub fn validate(candidates: Vec<String>, placeholder: &str) -> Vec<String> {
    let raw = candidates.len();
    let valid = candidates.into_iter()
        .filter(|c| is_well_formed(c, placeholder))
        .collect::<Vec<_>>();

    info!("Raw equation strings: {raw}, well formed: {}", valid.len());

    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_parseable_candidates() {
        let candidates = ["", "v", "v+", "(v", "log(v)", "v/(v-v)", "v)", "log(", "sqrt(v))"]
            .map(String::from)
            .to_vec();

        assert_eq!(validate(candidates, "v"), ["v", "log(v)", "v/(v-v)"]);
    }

    #[test]
    fn placeholder_is_only_declared_when_used() {
        assert!(is_well_formed("v*v", "v"));
        assert!(!is_well_formed("w*w", "v"));
        assert!(is_well_formed("log(2)", "v"));
    }
}
