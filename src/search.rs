use log::{debug, info, trace};

use crate::{
    config::{variable_names, Constant, ConfigError, MAGNITUDE_BOUND, ROUNDING_DIGITS},
    expr::{rewrite_identifiers, Expression},
    tokenize::Buckets,
    value::{round_to, ResultMap, ValueKey},
};

/// Counts through every tuple of catalog indices of a given width, in
/// order. Digit 0 belongs to the first variable and is the most
/// significant one.
#[derive(Debug, Clone)]
pub struct Assignments {
    radix: usize,
    limit_reached: bool,
    digits: Vec<usize>,
}

impl Assignments {
    pub fn new(radix: usize, width: usize) -> Self {
        Self {
            radix,
            limit_reached: radix == 0,
            digits: vec![0; width],
        }
    }

    /// How many tuples a fresh counter yields. `None` on overflow.
    pub fn total(&self) -> Option<usize> {
        self.radix.checked_pow(self.digits.len().try_into().ok()?)
    }

    fn increment(&mut self) {
        if self.limit_reached {
            return;
        }

        // NOTE: this assert failing is 100% a bug
        debug_assert!(self.digits.iter().all(|x| *x < self.radix));

        for digit in self.digits.iter_mut().rev() {
            if *digit + 1 < self.radix {
                *digit += 1;
                return;
            }

            *digit = 0;
        }

        self.limit_reached = true;
    }
}

impl Iterator for Assignments {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.limit_reached {
            return None;
        }

        let res = self.digits.clone();
        self.increment();

        Some(res)
    }
}

/// Why an assignment did not make it into the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EvalError,
    NotFinite,
    OutOfBounds,
    Integer,
}

/// Substitutes every combination of catalog constants into every template
/// and keeps the shortest equation per value.
pub struct SubstitutionEngine<'c> {
    catalog: &'c [Constant],
    digits: i32,
    bound: f64,
}

impl<'c> SubstitutionEngine<'c> {
    pub fn new(catalog: &'c [Constant]) -> Self {
        Self {
            catalog,
            digits: ROUNDING_DIGITS,
            bound: MAGNITUDE_BOUND,
        }
    }

    pub fn run(&self, buckets: &Buckets) -> Result<ResultMap, ConfigError> {
        let mut results = ResultMap::new();

        for (arity, templates) in buckets.iter() {
            let names = variable_names(arity + 1)?;
            let per_template = Assignments::new(self.catalog.len(), arity + 1).total();

            info!(
                "Substituting into {} template(s) over {} variable(s), {} assignment(s) each",
                templates.len(),
                arity + 1,
                per_template.map_or_else(|| "too many".to_string(), |n| n.to_string()),
            );

            for template in templates {
                self.search_template(template, &names, &mut results);
            }
        }

        info!("Distinct values: {}", results.len());

        Ok(results)
    }

    /// Tries every assignment for one template. Returns how many of them
    /// changed `results`.
    pub fn search_template(&self, template: &str, names: &[String], results: &mut ResultMap) -> usize {
        let expr = match Expression::build(template, names.iter().map(String::as_str)) {
            Ok(expr) => expr,
            Err(e) => {
                debug!("Skipping {template:?}: {e}");
                return 0;
            },
        };

        let mut values = vec![0.0; names.len()];
        let mut improved = 0;

        for assignment in Assignments::new(self.catalog.len(), names.len()) {
            for (slot, idx) in values.iter_mut().zip(&assignment) {
                *slot = self.catalog[*idx].value;
            }

            let key = match self.accept(&expr, &values) {
                Ok(key) => key,
                Err(why) => {
                    trace!("{template:?} at {assignment:?}: {why:?}");
                    continue;
                },
            };

            let equation = self.render(template, names, &assignment);
            if results.offer(key, equation) {
                improved += 1;
            }
        }

        debug!("{template:?}: {improved} improvement(s)");

        improved
    }

    /// Evaluates and filters one assignment.
    pub fn accept(&self, expr: &Expression, values: &[f64]) -> Result<ValueKey, Rejection> {
        let res = expr.evaluate(values).map_err(|_| Rejection::EvalError)?;
        if !res.is_finite() {
            return Err(Rejection::NotFinite);
        }

        let rounded = round_to(res, self.digits);
        if rounded.abs() > self.bound {
            return Err(Rejection::OutOfBounds);
        }
        if rounded.fract() == 0.0 {
            return Err(Rejection::Integer);
        }

        ValueKey::new(rounded).ok_or(Rejection::NotFinite)
    }

    /// The template with each variable spelled as its assigned constant.
    pub fn render(&self, template: &str, names: &[String], assignment: &[usize]) -> String {
        rewrite_identifiers(template, |ident| {
            let var = names.iter().position(|n| n == ident)?;
            let constant = &self.catalog[*assignment.get(var)?];

            Some(constant.name.as_str())
        })
    }
}
