use log::{debug, info};

use crate::{
    config::{variable_names, ConfigError},
    expr::rewrite_identifiers,
};

/// Templates grouped by how many variables they use. Bucket `i` holds the
/// templates over exactly `i + 1` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets(Vec<Vec<String>>);

impl Buckets {
    pub fn new(num_variables: usize) -> Self {
        Self(vec![Vec::new(); num_variables])
    }

    pub fn from_vecs(buckets: Vec<Vec<String>>) -> Self {
        Self(buckets)
    }

    /// Number of buckets, i.e. the variable bound.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, arity: usize) -> &[String] {
        self.0.get(arity).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.0.iter().map(Vec::as_slice).enumerate()
    }

    pub fn template_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    pub fn push(&mut self, arity: usize, template: String) {
        self.0[arity].push(template);
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&str) -> bool,
    {
        for bucket in &mut self.0 {
            bucket.retain(|t| f(t.as_str()));
        }
    }
}

/// Replaces each placeholder occurrence, left to right, with the next
/// variable name. Returns the template and its arity index, or `None`
/// if the equation has no placeholder.
pub fn name_variables(equation: &str, placeholder: &str, names: &[String]) -> Option<(String, usize)> {
    let mut used = 0;
    let template = rewrite_identifiers(equation, |ident| {
        if ident != placeholder {
            return None;
        }

        let name = names.get(used)?;
        used += 1;
        Some(name.as_str())
    });

    used.checked_sub(1).map(|arity| (template, arity))
}

pub fn tokenize(
    equations: Vec<String>,
    placeholder: &str,
    num_variables: usize,
) -> Result<Buckets, ConfigError> {
    let names = variable_names(num_variables)?;
    let mut buckets = Buckets::new(num_variables);

    for equation in equations {
        match name_variables(&equation, placeholder, &names) {
            Some((template, arity)) => buckets.push(arity, template),
            None => debug!("{equation:?} has no free variable, skipping"),
        }
    }

    for (arity, templates) in buckets.iter() {
        info!("Templates over {} variable(s): {}", arity + 1, templates.len());
    }

    Ok(buckets)
}
