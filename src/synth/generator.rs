use log::trace;

use super::grammar::{Grammar, Token, TokenClass};

#[derive(Debug, Clone)]
struct Partial {
    text: String,
    last: TokenClass,
    placeholders: usize,
}

impl Partial {
    fn extend(&self, token: &Token) -> Self {
        Self {
            text: format!("{}{}", self.text, token.text),
            last: token.class,
            placeholders: self.placeholders + usize::from(token.class == TokenClass::Variable),
        }
    }
}

/// Enumerates every string the grammar admits within the length and
/// placeholder bounds, depth first. Every admissible prefix is yielded,
/// including the empty string, before any of its extensions.
pub struct EquationGen<'g> {
    grammar: &'g Grammar,
    max_length: usize,
    max_placeholders: usize,
    stack: Vec<Partial>,
}

impl<'g> EquationGen<'g> {
    pub fn new(grammar: &'g Grammar, max_length: usize, max_placeholders: usize) -> Self {
        Self {
            grammar,
            max_length,
            max_placeholders,
            stack: vec![Partial {
                text: String::new(),
                last: TokenClass::Start,
                placeholders: 0,
            }],
        }
    }

    fn admissible(&self, cand: &Partial) -> bool {
        if cand.text.len() > self.max_length || cand.placeholders > self.max_placeholders {
            return false;
        }

        if self.grammar.wraps_bare_placeholder(&cand.text) {
            trace!("Pruned {:?}", cand.text);
            return false;
        }

        true
    }
}

impl Iterator for EquationGen<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let curr = self.stack.pop()?;

        // Reversed so that successors come off the stack in grammar order
        for token in self.grammar.next_tokens(curr.last).iter().rev() {
            let cand = curr.extend(token);
            if self.admissible(&cand) {
                self.stack.push(cand);
            }
        }

        Some(curr.text)
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{identifier_spans, Function};

    use super::*;

    fn count_placeholders(text: &str) -> usize {
        identifier_spans(text).into_iter()
            .filter(|s| &text[s.clone()] == "v")
            .count()
    }

    #[test]
    fn prefixes_come_first() {
        let g = Grammar::new("v", &[Function::Sqrt]);
        let all = EquationGen::new(&g, 7, 1).collect::<Vec<_>>();

        assert_eq!(&all[..3], ["", "v", "v+"]);
        assert!(all.contains(&"sqrt(v)".to_string()));

        let pos = |s: &str| all.iter().position(|x| x == s).unwrap();
        assert!(pos("sqrt(") < pos("sqrt(v"));
        assert!(pos("sqrt(v") < pos("sqrt(v)"));
    }

    #[test]
    fn respects_bounds() {
        let g = Grammar::new("v", &[Function::Log, Function::Log10, Function::Cbrt]);

        for max_placeholders in 1..=2 {
            for text in EquationGen::new(&g, 9, max_placeholders) {
                assert!(text.len() <= 9, "{text:?} is too long");
                assert!(count_placeholders(&text) <= max_placeholders, "{text:?} has too many placeholders");
                assert!(!g.wraps_bare_placeholder(&text), "{text:?} wraps a bare placeholder");
            }
        }
    }

    #[test]
    fn single_placeholder_bound() {
        let g = Grammar::new("v", &[Function::Sqrt]);
        let all = EquationGen::new(&g, 5, 1).collect::<Vec<_>>();

        assert!(all.contains(&"v+".to_string()));
        assert!(!all.iter().any(|s| s == "v+v"));
        assert!(all.iter().all(|s| count_placeholders(s) <= 1));
    }

    #[test]
    fn no_duplicates() {
        let g = Grammar::new("v", &[Function::Log, Function::Log2, Function::Log10]);
        let mut all = EquationGen::new(&g, 8, 2).collect::<Vec<_>>();
        let total = all.len();

        all.sort();
        all.dedup();

        assert_eq!(all.len(), total);
    }

    #[test]
    fn leading_parenthesised_placeholder_is_pruned() {
        let g = Grammar::new("v", &[]);
        let all = EquationGen::new(&g, 6, 2).collect::<Vec<_>>();

        assert!(all.contains(&"(v".to_string()));
        assert!(all.contains(&"(v+v)".to_string()));
        assert!(!all.iter().any(|s| s.starts_with("(v)")));
    }
}
