//! Arithmetic expressions for derived fields and selections
//!
//! Derived quantities are described by small expressions over field names,
//! numeric metadata and physical constants, for example
//!
//! ```text
//! density*(dx*length_unit)**3/msun
//! 0.5*(B_left_x + B_right_x)
//! log10(density) > -15 & temperature < 100
//! ```
//!
//! Expressions are parsed once into an [Expr] tree and then evaluated
//! element-wise over the cells, with scalars broadcast against fields.
//!
//! | Syntax                            | Meaning                        |
//! | --------------------------------- | ------------------------------ |
//! | `+ - * /`                         | Arithmetic                     |
//! | `**` or `^`                       | Power, right associative       |
//! | `< <= > >= == !=`                 | Comparison, 1.0 or 0.0         |
//! | `&` `\|`                          | Logical and/or of non-zero     |
//! | `log10 log ln exp sqrt abs`       | Functions (`log` is natural)   |
//! | `sin cos tan`                     | Trigonometry in radians        |

// crate modules
use crate::dataset::Field;
use crate::error::{Error, Result};
use crate::info::Info;

// standard library
use std::collections::BTreeMap;

// external crates
use amrtools_utils::f;

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of};
use nom::combinator::{all_consuming, map, map_res, not, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Name of a field, metadata entry or constant
    Ident(String),
    /// Unary minus
    Neg(Box<Expr>),
    /// Binary operation
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Function call with a single argument
    Call(Func, Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    fn apply(&self, a: f64, b: f64) -> f64 {
        let truth = |c: bool| if c { 1.0 } else { 0.0 };
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
            BinOp::Lt => truth(a < b),
            BinOp::Le => truth(a <= b),
            BinOp::Gt => truth(a > b),
            BinOp::Ge => truth(a >= b),
            BinOp::Eq => truth(a == b),
            BinOp::Ne => truth(a != b),
            BinOp::And => truth(a != 0.0 && b != 0.0),
            BinOp::Or => truth(a != 0.0 || b != 0.0),
        }
    }
}

/// Supported single argument functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Func {
    Log10,
    Ln,
    Exp,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
}

impl Func {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Func::Log10 => x.log10(),
            Func::Ln => x.ln(),
            Func::Exp => x.exp(),
            Func::Sqrt => x.sqrt(),
            Func::Abs => x.abs(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
        }
    }
}

impl std::str::FromStr for Func {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "log10" => Func::Log10,
            "log" | "ln" => Func::Ln,
            "exp" => Func::Exp,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            _ => return Err(Error::ParseError(f!("unknown function \"{s}\""))),
        })
    }
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value that applies to every cell
    Scalar(f64),
    /// One value per cell
    Array(Vec<f64>),
}

impl Operand {
    /// One value per cell, broadcasting scalars to `len`
    pub fn into_values(self, len: usize) -> Result<Vec<f64>> {
        match self {
            Operand::Scalar(s) => Ok(vec![s; len]),
            Operand::Array(v) if v.len() == len => Ok(v),
            Operand::Array(v) => Err(Error::LengthMismatch {
                expected: len,
                found: v.len(),
            }),
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Operand::Scalar(s) => Operand::Scalar(f(s)),
            Operand::Array(v) => Operand::Array(v.into_iter().map(f).collect()),
        }
    }

    fn zip_with(self, other: Self, op: BinOp) -> Result<Self> {
        Ok(match (self, other) {
            (Operand::Scalar(a), Operand::Scalar(b)) => Operand::Scalar(op.apply(a, b)),
            (Operand::Scalar(a), Operand::Array(v)) => {
                Operand::Array(v.into_iter().map(|b| op.apply(a, b)).collect())
            }
            (Operand::Array(v), Operand::Scalar(b)) => {
                Operand::Array(v.into_iter().map(|a| op.apply(a, b)).collect())
            }
            (Operand::Array(x), Operand::Array(y)) => {
                if x.len() != y.len() {
                    return Err(Error::LengthMismatch {
                        expected: x.len(),
                        found: y.len(),
                    });
                }
                Operand::Array(x.iter().zip(&y).map(|(a, b)| op.apply(*a, *b)).collect())
            }
        })
    }
}

/// Names an expression can refer to
pub trait Scope {
    /// Values of a field, if one exists with this name
    fn field(&self, name: &str) -> Option<&[f64]>;

    /// A named scalar, e.g. a metadata entry or constant
    fn scalar(&self, name: &str) -> Option<f64>;
}

/// Resolves names against fields, then numeric metadata, then constants
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Fields of a dataset
    pub fields: &'a BTreeMap<String, Field>,
    /// Run metadata
    pub info: &'a Info,
    /// Physical constants
    pub constants: &'a BTreeMap<String, f64>,
}

impl Scope for Context<'_> {
    fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(|f| f.values.as_slice())
    }

    fn scalar(&self, name: &str) -> Option<f64> {
        self.info
            .number(name)
            .or_else(|| self.constants.get(name).copied())
    }
}

impl Expr {
    /// Parse an expression
    ///
    /// ```rust
    /// # use amrtools_ramses::{BinOp, Expr};
    /// let expr = Expr::parse("2 * x").unwrap();
    /// assert_eq!(
    ///     expr,
    ///     Expr::Binary(
    ///         BinOp::Mul,
    ///         Box::new(Expr::Number(2.0)),
    ///         Box::new(Expr::Ident("x".into()))
    ///     )
    /// );
    /// assert!(Expr::parse("2 * (x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        all_consuming(ws(expression))(s)
            .map(|(_, expr)| expr)
            .map_err(|_| Error::ParseError(f!("invalid operation \"{s}\"")))
    }

    /// Unique identifiers used, in order of first appearance
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut Vec<String>) {
        match self {
            Expr::Number(_) => (),
            Expr::Ident(name) => {
                if !names.contains(name) {
                    names.push(name.clone())
                }
            }
            Expr::Neg(e) | Expr::Call(_, e) => e.collect_references(names),
            Expr::Binary(_, a, b) => {
                a.collect_references(names);
                b.collect_references(names);
            }
        }
    }

    /// Evaluate against a scope
    pub fn eval<S: Scope>(&self, scope: &S) -> Result<Operand> {
        match self {
            Expr::Number(x) => Ok(Operand::Scalar(*x)),
            Expr::Ident(name) => {
                if let Some(values) = scope.field(name) {
                    Ok(Operand::Array(values.to_vec()))
                } else if let Some(value) = scope.scalar(name) {
                    Ok(Operand::Scalar(value))
                } else {
                    Err(Error::FieldNotFound(name.clone()))
                }
            }
            Expr::Neg(e) => Ok(e.eval(scope)?.map(|x| -x)),
            Expr::Call(func, e) => Ok(e.eval(scope)?.map(|x| func.apply(x))),
            Expr::Binary(op, a, b) => a.eval(scope)?.zip_with(b.eval(scope)?, *op),
        }
    }
}

// ! Grammar, from lowest to highest precedence

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Left associative chain of `operand (op operand)*`
fn chain<'a>(
    operand: fn(&'a str) -> IResult<&'a str, Expr>,
    operator: fn(&'a str) -> IResult<&'a str, BinOp>,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> {
    move |i: &'a str| {
        let (i, first) = operand(i)?;
        let (i, rest) = many0(pair(ws(operator), operand))(i)?;
        let expr = rest.into_iter().fold(first, |acc, (op, rhs)| {
            Expr::Binary(op, Box::new(acc), Box::new(rhs))
        });
        Ok((i, expr))
    }
}

fn expression(i: &str) -> IResult<&str, Expr> {
    chain(conjunction, |i| map(char('|'), |_| BinOp::Or)(i))(i)
}

fn conjunction(i: &str) -> IResult<&str, Expr> {
    chain(comparison, |i| map(char('&'), |_| BinOp::And)(i))(i)
}

fn comparison(i: &str) -> IResult<&str, Expr> {
    let (i, lhs) = sum(i)?;
    let (i, rhs) = opt(pair(ws(comparison_operator), sum))(i)?;
    Ok(match rhs {
        Some((op, rhs)) => (i, Expr::Binary(op, Box::new(lhs), Box::new(rhs))),
        None => (i, lhs),
    })
}

fn comparison_operator(i: &str) -> IResult<&str, BinOp> {
    alt((
        map(tag("<="), |_| BinOp::Le),
        map(tag(">="), |_| BinOp::Ge),
        map(tag("=="), |_| BinOp::Eq),
        map(tag("!="), |_| BinOp::Ne),
        map(char('<'), |_| BinOp::Lt),
        map(char('>'), |_| BinOp::Gt),
    ))(i)
}

fn sum(i: &str) -> IResult<&str, Expr> {
    chain(product, |i| {
        alt((
            map(char('+'), |_| BinOp::Add),
            map(char('-'), |_| BinOp::Sub),
        ))(i)
    })(i)
}

fn product(i: &str) -> IResult<&str, Expr> {
    chain(unary, |i| {
        alt((
            map(terminated(char('*'), not(char('*'))), |_| BinOp::Mul),
            map(char('/'), |_| BinOp::Div),
        ))(i)
    })(i)
}

fn unary(i: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |e| Expr::Neg(Box::new(e))),
        preceded(ws(char('+')), unary),
        power,
    ))(i)
}

/// `-x**2` is `-(x**2)` and `2**-1` is allowed, as in most languages
fn power(i: &str) -> IResult<&str, Expr> {
    let (i, base) = primary(i)?;
    let (i, exponent) = opt(preceded(ws(alt((tag("**"), tag("^")))), unary))(i)?;
    Ok(match exponent {
        Some(e) => (i, Expr::Binary(BinOp::Pow, Box::new(base), Box::new(e))),
        None => (i, base),
    })
}

fn primary(i: &str) -> IResult<&str, Expr> {
    ws(alt((
        number,
        call,
        map(identifier, |s| Expr::Ident(s.to_string())),
        delimited(char('('), ws(expression), char(')')),
    )))(i)
}

fn call(i: &str) -> IResult<&str, Expr> {
    map(
        pair(
            map_res(identifier, |s: &str| s.parse::<Func>()),
            delimited(ws(char('(')), expression, ws(char(')'))),
        ),
        |(func, arg)| Expr::Call(func, Box::new(arg)),
    )(i)
}

fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(i)
}

/// Unsigned literal, e.g. `2`, `0.5`, `.5`, `1.`, `1e-15`
fn number(i: &str) -> IResult<&str, Expr> {
    map_res(
        recognize(pair(
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        )),
        |s: &str| s.parse::<f64>().map(Expr::Number),
    )(i)
}
