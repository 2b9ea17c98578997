use std::collections::{hash_map::Entry, HashMap, HashSet};

use log::{debug, info, trace};

use crate::{
    config::{variable_names, ConfigError, ROUNDING_DIGITS},
    expr::Expression,
    tokenize::Buckets,
    value::{round_to, ValueKey},
};

/// Removes templates that agree numerically at a fixed witness point.
///
/// Agreement at one point does not prove two templates equal, so unrelated
/// templates that happen to coincide are merged as well. Templates that
/// cannot be evaluated at the witnesses are left in place.
pub struct DuplicateEliminator<'w> {
    witnesses: &'w [f64],
    digits: i32,
}

impl<'w> DuplicateEliminator<'w> {
    pub fn new(witnesses: &'w [f64]) -> Self {
        Self {
            witnesses,
            digits: ROUNDING_DIGITS,
        }
    }

    pub fn eliminate(&self, mut buckets: Buckets) -> Result<Buckets, ConfigError> {
        let duplicates = self.find_duplicates(&buckets)?;

        info!("Duplicates found: {}", duplicates.len());
        buckets.retain(|t| !duplicates.contains(t));

        Ok(buckets)
    }

    /// Every template that lost to a shorter (or earlier) template with
    /// the same fingerprint.
    pub fn find_duplicates(&self, buckets: &Buckets) -> Result<HashSet<String>, ConfigError> {
        let mut canonical = HashMap::<ValueKey, &str>::new();
        let mut duplicates = HashSet::new();

        for (arity, templates) in buckets.iter() {
            let names = variable_names(arity + 1)?;
            let point = self.witnesses.get(..=arity)
                .ok_or(ConfigError::NotEnoughWitnesses {
                    witnesses: self.witnesses.len(),
                    variables: arity + 1,
                })?;

            for template in templates {
                let Some(key) = self.fingerprint(template, &names, point) else {
                    continue;
                };

                match canonical.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(template);
                    },
                    Entry::Occupied(mut slot) => {
                        let loser = if template.len() < slot.get().len() {
                            slot.insert(template)
                        } else {
                            template.as_str()
                        };

                        trace!("{loser:?} duplicates {:?}", slot.get());
                        duplicates.insert(loser.to_string());
                    },
                }
            }
        }

        Ok(duplicates)
    }

    fn fingerprint(&self, template: &str, names: &[String], point: &[f64]) -> Option<ValueKey> {
        let expr = match Expression::build(template, names.iter().map(String::as_str)) {
            Ok(expr) => expr,
            Err(e) => {
                debug!("No fingerprint for {template:?}: {e}");
                return None;
            },
        };

        match expr.evaluate(point) {
            Ok(value) => ValueKey::new(round_to(value, self.digits)),
            Err(e) => {
                trace!("No fingerprint for {template:?}: {e}");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::default_witnesses;

    use super::*;

    fn buckets(raw: &[&[&str]]) -> Buckets {
        Buckets::from_vecs(
            raw.iter()
                .map(|b| b.iter().map(|t| t.to_string()).collect())
                .collect()
        )
    }

    #[test]
    fn keeps_the_shortest() {
        let witnesses = default_witnesses();
        let dedup = DuplicateEliminator::new(&witnesses);
        let res = dedup.eliminate(buckets(&[
            &["z*z/z", "z", "sqrt(z)", "z^(1/2)"],
            &["log(z*y)", "log(z)+log(y)", "z+y", "y+z"],
        ])).unwrap();

        assert_eq!(res.get(0), ["z", "sqrt(z)"]);
        assert_eq!(res.get(1), ["log(z*y)", "z+y"]);
    }

    #[test]
    fn equal_length_keeps_the_first() {
        let witnesses = default_witnesses();
        let dedup = DuplicateEliminator::new(&witnesses);
        let res = dedup.eliminate(buckets(&[&[], &["z*y", "y*z"]])).unwrap();

        assert_eq!(res.get(1), ["z*y"]);
    }

    #[test]
    fn unevaluable_templates_stay() {
        let witnesses = default_witnesses();
        let dedup = DuplicateEliminator::new(&witnesses);
        // z = e, y = pi
        let res = dedup.eliminate(buckets(&[&[], &["sqrt(z-y)", "log(z-y)", "z/(y-y)"]])).unwrap();

        assert_eq!(res.template_count(), 3);
    }

    #[test]
    fn idempotent() {
        let witnesses = default_witnesses();
        let dedup = DuplicateEliminator::new(&witnesses);
        let once = dedup.eliminate(buckets(&[
            &["z", "z*z/z", "(z)", "log(z)"],
            &["z-y", "z+y-y-y", "z*y", "y*z"],
            &["z*y*x", "x*y*z", "z+y+x"],
        ])).unwrap();

        assert!(dedup.find_duplicates(&once).unwrap().is_empty());
        assert_eq!(dedup.eliminate(once.clone()).unwrap(), once);
    }

    #[test]
    fn witness_shortage_is_reported() {
        let witnesses = [std::f64::consts::E];
        let dedup = DuplicateEliminator::new(&witnesses);

        assert!(matches!(
            dedup.eliminate(buckets(&[&["z"], &["z+y"]])),
            Err(ConfigError::NotEnoughWitnesses { witnesses: 1, variables: 2 }),
        ));
    }
}
