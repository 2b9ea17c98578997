use crate::expr::Function;

pub const OPERATORS: [&str; 5] = ["+", "-", "*", "^", "/"];

/// What kind of token ended the string so far. The grammar only ever looks
/// at this to decide what may come next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Start,
    Variable,
    ClosingParen,
    Operator,
    /// A bare `(` or a function name with its `(` attached.
    OpeningParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub class: TokenClass,
}

impl Token {
    fn new(text: impl Into<String>, class: TokenClass) -> Self {
        Self {
            text: text.into(),
            class,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    placeholder: String,
    after_operand: Vec<Token>,
    after_opener: Vec<Token>,
    function_openers: Vec<String>,
}

impl Grammar {
    pub fn new(placeholder: &str, functions: &[Function]) -> Self {
        let function_openers = functions.iter()
            .map(|f| format!("{}(", f.name()))
            .collect::<Vec<_>>();

        let after_operand = OPERATORS.into_iter()
            .map(|op| Token::new(op, TokenClass::Operator))
            .chain(std::iter::once(Token::new(")", TokenClass::ClosingParen)))
            .collect();

        let after_opener = [
            Token::new(placeholder, TokenClass::Variable),
            Token::new("(", TokenClass::OpeningParen),
        ]
            .into_iter()
            .chain(function_openers.iter().map(|f| Token::new(f.as_str(), TokenClass::OpeningParen)))
            .collect();

        Self {
            placeholder: placeholder.to_string(),
            after_operand,
            after_opener,
            function_openers,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn next_tokens(&self, last: TokenClass) -> &[Token] {
        match last {
            TokenClass::Variable | TokenClass::ClosingParen => &self.after_operand,
            TokenClass::Start | TokenClass::Operator | TokenClass::OpeningParen => &self.after_opener,
        }
    }

    /// Whether `text` wraps the placeholder in parentheses that do not
    /// belong to a function call, as in `(v)` or `v*(v)`.
    pub fn wraps_bare_placeholder(&self, text: &str) -> bool {
        let wrapped = format!("({})", self.placeholder);

        text.match_indices(&wrapped).any(|(idx, _)| {
            let opener = &text[..=idx];
            !self.function_openers.iter().any(|f| opener.ends_with(f.as_str()))
        })
    }
}
