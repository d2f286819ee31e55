//! Tagged value representation and literal parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runtime type tags. These are also the names accepted by type operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Bool,
    String,
    Float,
    Nil,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Bool => "bool",
            DataType::String => "string",
            DataType::Float => "float",
            DataType::Nil => "nil",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(DataType::Int),
            "bool" => Ok(DataType::Bool),
            "string" => Ok(DataType::String),
            "float" => Ok(DataType::Float),
            "nil" => Ok(DataType::Nil),
            other => Err(format!("unknown type name '{}'", other)),
        }
    }
}

/// Runtime values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Raw string text; `\ddd` escapes are kept until output.
    String(String),
    Nil,
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
            Value::Nil => DataType::Nil,
        }
    }

    /// The value `READ` stores when input is missing or malformed.
    pub fn zero(ty: DataType) -> Value {
        match ty {
            DataType::Int => Value::Int(0),
            DataType::Float => Value::Float(0.0),
            DataType::Bool => Value::Bool(false),
            DataType::String => Value::String(String::new()),
            DataType::Nil => Value::Nil,
        }
    }

    /// Parse constant text for the given type tag.
    pub fn parse_literal(ty: DataType, text: &str) -> Option<Value> {
        match ty {
            DataType::Int => parse_int(text).map(Value::Int),
            DataType::Float => parse_float(text).map(Value::Float),
            DataType::Bool => match text {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            DataType::String => {
                if text.chars().any(|c| c.is_whitespace() && c != ' ') {
                    None
                } else {
                    Some(Value::String(text.to_string()))
                }
            }
            DataType::Nil => (text == "nil").then_some(Value::Nil),
        }
    }

    /// Text as written in a program document (`int@5` → `5`, `nil@nil` → `nil`).
    pub fn source_text(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            other => other.output_text(),
        }
    }

    /// Text emitted by `WRITE`, before escape decoding. Nil prints as nothing.
    pub fn output_text(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Nil => String::new(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.data_type(), self.source_text())
    }
}

/// Shortest decimal form, keeping a `.0` on integral values.
pub fn format_float(f: f64) -> String {
    let text = format!("{}", f);
    if f.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Signed integer in decimal, or with a `0x`/`0o` prefix.
pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(rest) = strip_prefix_ci(digits, "0x") {
        (16, rest)
    } else if let Some(rest) = strip_prefix_ci(digits, "0o") {
        (8, rest)
    } else {
        (10, digits)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// Floating literal in decimal or C99 hexadecimal (`0x1.8p+1`) notation.
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let magnitude = match strip_prefix_ci(body, "0x") {
        Some(hex) => parse_hex_float(hex)?,
        None => {
            // Reject words Rust accepts ("inf", "nan") that are not literals here.
            if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                return None;
            }
            body.parse::<f64>().ok()?
        }
    };
    if !magnitude.is_finite() {
        return None;
    }
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_hex_float(body: &str) -> Option<f64> {
    let (mantissa, exponent) = match body.find(['p', 'P']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let mut value = 0f64;
    for c in int_part.chars() {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value += c.to_digit(16)? as f64 * scale;
        scale /= 16.0;
    }
    let exp: i32 = match exponent {
        Some(e) => e.parse().ok()?,
        None => 0,
    };
    Some(value * 2f64.powi(exp))
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    // `get` rather than indexing: the cut may fall inside a multibyte char.
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => s.get(prefix.len()..),
        _ => None,
    }
}
