use std::{f64::consts::{E, PI, TAU}, ops::Range};

use nom::{
    bytes::complete::take_while,
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{all_consuming, map_res, peek, recognize},
    error::{ErrorKind, FromExternalError, ParseError as NomParseError},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

use crate::config::GOLDEN_RATIO;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected input at offset {offset}")]
    Syntax { offset: usize },
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("{function} is undefined at {arg}")]
    Domain {
        function: &'static str,
        arg: f64,
    },
    #[error("variable `{0}` is unbound")]
    UnboundVariable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Abs,
    Acos,
    Asin,
    Atan,
    Cbrt,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Floor,
    Log,
    Log1p,
    Log10,
    Log2,
    Signum,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
}

impl Function {
    pub const ALL: [Function; 20] = [
        Function::Abs,
        Function::Acos,
        Function::Asin,
        Function::Atan,
        Function::Cbrt,
        Function::Ceil,
        Function::Cos,
        Function::Cosh,
        Function::Exp,
        Function::Floor,
        Function::Log,
        Function::Log1p,
        Function::Log10,
        Function::Log2,
        Function::Signum,
        Function::Sin,
        Function::Sinh,
        Function::Sqrt,
        Function::Tan,
        Function::Tanh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Acos => "acos",
            Function::Asin => "asin",
            Function::Atan => "atan",
            Function::Cbrt => "cbrt",
            Function::Ceil => "ceil",
            Function::Cos => "cos",
            Function::Cosh => "cosh",
            Function::Exp => "exp",
            Function::Floor => "floor",
            Function::Log => "log",
            Function::Log1p => "log1p",
            Function::Log10 => "log10",
            Function::Log2 => "log2",
            Function::Signum => "signum",
            Function::Sin => "sin",
            Function::Sinh => "sinh",
            Function::Sqrt => "sqrt",
            Function::Tan => "tan",
            Function::Tanh => "tanh",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn apply(self, x: f64) -> Result<f64, EvalError> {
        let domain = |ok: bool| if ok {
            Ok(())
        } else {
            Err(EvalError::Domain { function: self.name(), arg: x })
        };

        match self {
            Function::Log | Function::Log2 | Function::Log10 => domain(x > 0.0)?,
            Function::Log1p => domain(x > -1.0)?,
            Function::Sqrt => domain(x >= 0.0)?,
            Function::Asin | Function::Acos => domain((-1.0..=1.0).contains(&x))?,
            _ => (),
        }

        Ok(match self {
            Function::Abs => x.abs(),
            Function::Acos => x.acos(),
            Function::Asin => x.asin(),
            Function::Atan => x.atan(),
            Function::Cbrt => x.cbrt(),
            Function::Ceil => x.ceil(),
            Function::Cos => x.cos(),
            Function::Cosh => x.cosh(),
            Function::Exp => x.exp(),
            Function::Floor => x.floor(),
            Function::Log => x.ln(),
            Function::Log1p => x.ln_1p(),
            Function::Log10 => x.log10(),
            Function::Log2 => x.log2(),
            // f64::signum maps zero to one
            Function::Signum => if x == 0.0 { 0.0 } else { x.signum() },
            Function::Sin => x.sin(),
            Function::Sinh => x.sinh(),
            Function::Sqrt => x.sqrt(),
            Function::Tan => x.tan(),
            Function::Tanh => x.tanh(),
        })
    }
}

/// Named constants every expression can refer to without declaring them.
pub fn builtin_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(PI),
        "tau" => Some(TAU),
        "e" => Some(E),
        "phi" => Some(GOLDEN_RATIO),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnopKind {
    Negate,
    Call(Function),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinopKind {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Pow,
}

impl BinopKind {
    fn from_char(c: char) -> Self {
        match c {
            '+' => BinopKind::Plus,
            '-' => BinopKind::Minus,
            '*' => BinopKind::Times,
            '/' => BinopKind::Divide,
            '%' => BinopKind::Modulo,
            _ => BinopKind::Pow,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Index into the declared variables of the owning [`Expression`].
    Variable(usize),
    Unop(UnopKind, Box<Expr>),
    Binop(BinopKind, Box<(Expr, Expr)>),
}

impl Expr {
    fn binop(kind: BinopKind, l: Expr, r: Expr) -> Self {
        Expr::Binop(kind, Box::new((l, r)))
    }

    pub fn compute<F>(&self, f: &mut F) -> Result<f64, EvalError>
    where
        F: FnMut(usize) -> Result<f64, EvalError>,
    {
        match self {
            Expr::Number(x) => Ok(*x),
            Expr::Variable(v) => f(*v),
            Expr::Unop(unop_kind, e) => {
                let e = e.compute(f)?;
                match unop_kind {
                    UnopKind::Negate => Ok(-e),
                    UnopKind::Call(func) => func.apply(e),
                }
            },
            Expr::Binop(binop_kind, lr) => {
                let (l, r) = (lr.0.compute(f)?, lr.1.compute(f)?);
                match binop_kind {
                    BinopKind::Plus => Ok(l + r),
                    BinopKind::Minus => Ok(l - r),
                    BinopKind::Times => Ok(l * r),
                    BinopKind::Divide | BinopKind::Modulo if r == 0.0 =>
                        Err(EvalError::DivisionByZero),
                    BinopKind::Divide => Ok(l / r),
                    BinopKind::Modulo => Ok(l % r),
                    BinopKind::Pow => {
                        let res = l.powf(r);
                        if res.is_nan() && !l.is_nan() && !r.is_nan() {
                            return Err(EvalError::Domain { function: "^", arg: l });
                        }

                        Ok(res)
                    },
                }
            },
        }
    }

    fn mentions_variables(&self) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Variable(_) => true,
            Expr::Unop(_, e) => e.mentions_variables(),
            Expr::Binop(_, lr) => lr.0.mentions_variables() || lr.1.mentions_variables(),
        }
    }
}

/// A parsed infix expression together with the names of its free variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    ast: Expr,
    variables: Vec<String>,
}

impl Expression {
    /// Parses `text`, resolving identifiers against `variables` first and
    /// the builtin constants second.
    pub fn build<I, S>(text: &str, variables: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variables = variables.into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();

        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let parser = Parser { variables: &variables };
        let res = all_consuming(
            delimited(multispace0, |i| parser.expr(i), multispace0)
        )(text);

        match res {
            Ok((_, ast)) => Ok(Self { ast, variables }),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e.into_parse_error(text)),
            Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax { offset: text.len() }),
        }
    }

    /// Operator/operand balance is already enforced by the parser, so the
    /// only remaining question is whether free variables are acceptable.
    pub fn is_structurally_valid(&self, allow_unbound_variables: bool) -> bool {
        allow_unbound_variables || !self.ast.mentions_variables()
    }

    /// Evaluates with `values[i]` bound to the i-th declared variable.
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, EvalError> {
        self.ast.compute(&mut |idx| {
            values.get(idx)
                .copied()
                .ok_or_else(|| EvalError::UnboundVariable(self.variables[idx].clone()))
        })
    }
}

/// Byte ranges of every identifier in `text` that is not a function call.
/// Exponents inside number literals are not identifiers.
pub fn identifier_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let offset = text.len() - rest.len();

        if let Ok((after, _)) = number(rest) {
            rest = after;
            continue;
        }

        if let Ok((after, name)) = identifier(rest) {
            if !after.starts_with('(') {
                spans.push(offset..offset + name.len());
            }
            rest = after;
            continue;
        }

        rest = &rest[c.len_utf8()..];
    }

    spans
}

/// Rebuilds `text`, replacing each identifier for which `f` returns a
/// replacement. Function names are left alone.
pub fn rewrite_identifiers<'s, F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> Option<&'s str>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for span in identifier_spans(text) {
        if let Some(replacement) = f(&text[span.clone()]) {
            out.push_str(&text[last..span.start]);
            out.push_str(replacement);
            last = span.end;
        }
    }
    out.push_str(&text[last..]);

    out
}

#[derive(Debug)]
enum SyntaxError<'a> {
    Nom(&'a str),
    UnknownIdentifier(&'a str),
    UnknownFunction(&'a str),
}

impl<'a> SyntaxError<'a> {
    fn into_parse_error(self, text: &str) -> ParseError {
        match self {
            SyntaxError::Nom(rest) => ParseError::Syntax { offset: text.len() - rest.len() },
            SyntaxError::UnknownIdentifier(name) => ParseError::UnknownIdentifier(name.to_string()),
            SyntaxError::UnknownFunction(name) => ParseError::UnknownFunction(name.to_string()),
        }
    }
}

impl<'a> NomParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        SyntaxError::Nom(input)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for SyntaxError<'a> {
    fn from_external_error(input: &'a str, _kind: ErrorKind, _e: E) -> Self {
        SyntaxError::Nom(input)
    }
}

type ParseResult<'a, O> = IResult<&'a str, O, SyntaxError<'a>>;

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    F: FnMut(&'a str) -> ParseResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn number(input: &str) -> ParseResult<'_, f64> {
    // recognize_float would also swallow a leading sign, which belongs
    // to the unary minus rule instead
    preceded(
        peek(satisfy(|c| c.is_ascii_digit() || c == '.')),
        map_res(recognize_float, |s: &str| s.parse::<f64>()),
    )(input)
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

struct Parser<'v> {
    variables: &'v [String],
}

impl<'v> Parser<'v> {
    fn expr<'a>(&self, input: &'a str) -> ParseResult<'a, Expr> {
        let (mut input, mut lhs) = self.term(input)?;

        while let Ok((rest, op)) = ws(one_of("+-"))(input) {
            let (rest, rhs) = self.term(rest)?;
            lhs = Expr::binop(BinopKind::from_char(op), lhs, rhs);
            input = rest;
        }

        Ok((input, lhs))
    }

    fn term<'a>(&self, input: &'a str) -> ParseResult<'a, Expr> {
        let (mut input, mut lhs) = self.unary(input)?;

        while let Ok((rest, op)) = ws(one_of("*/%"))(input) {
            let (rest, rhs) = self.unary(rest)?;
            lhs = Expr::binop(BinopKind::from_char(op), lhs, rhs);
            input = rest;
        }

        Ok((input, lhs))
    }

    fn unary<'a>(&self, input: &'a str) -> ParseResult<'a, Expr> {
        if let Ok((rest, sign)) = ws(one_of("+-"))(input) {
            let (rest, operand) = self.unary(rest)?;
            let res = match sign {
                '-' => Expr::Unop(UnopKind::Negate, Box::new(operand)),
                _ => operand,
            };

            return Ok((rest, res));
        }

        self.power(input)
    }

    // `^` binds tighter than unary minus and associates to the right
    fn power<'a>(&self, input: &'a str) -> ParseResult<'a, Expr> {
        let (input, base) = self.atom(input)?;

        match ws(char('^'))(input) {
            Ok((rest, _)) => {
                let (rest, exponent) = self.unary(rest)?;
                Ok((rest, Expr::binop(BinopKind::Pow, base, exponent)))
            },
            Err(nom::Err::Error(_)) => Ok((input, base)),
            Err(e) => Err(e),
        }
    }

    fn atom<'a>(&self, input: &'a str) -> ParseResult<'a, Expr> {
        let (input, _) = multispace0(input)?;

        if let Ok((rest, x)) = number(input) {
            return Ok((rest, Expr::Number(x)));
        }

        if let Ok((rest, name)) = identifier(input) {
            if let Ok((rest, _)) = char::<_, SyntaxError>('(')(rest) {
                let func = Function::from_name(name)
                    .ok_or(nom::Err::Failure(SyntaxError::UnknownFunction(name)))?;
                let (rest, arg) = terminated(|i| self.expr(i), ws(char(')')))(rest)?;

                return Ok((rest, Expr::Unop(UnopKind::Call(func), Box::new(arg))));
            }

            return self.resolve(name)
                .map(|e| (rest, e))
                .ok_or(nom::Err::Failure(SyntaxError::UnknownIdentifier(name)));
        }

        delimited(char('('), |i| self.expr(i), ws(char(')')))(input)
    }

    fn resolve(&self, name: &str) -> Option<Expr> {
        match self.variables.iter().position(|v| v == name) {
            Some(idx) => Some(Expr::Variable(idx)),
            None => builtin_constant(name).map(Expr::Number),
        }
    }
}
