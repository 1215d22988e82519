use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid point '{0}'. Expected 'X,Y' (e.g., '16.0,10.0').")]
    InvalidPoint(String),

    #[error("Invalid Bessel order pair '{0}'. Expected 'N1,N2' with integers (e.g., '3,1').")]
    InvalidOrderPair(String),

    #[error("Invalid step range '{0}'. Expected 'LOWER:UPPER' with non-negative integers (e.g., '0:2').")]
    InvalidStepRange(String),

    #[error("Invalid setting '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),
}

fn split_pair(s: &str, separator: char) -> Option<(&str, &str)> {
    let (a, b) = s.split_once(separator)?;
    Some((a.trim(), b.trim()))
}

pub fn parse_point(s: &str) -> Result<(f64, f64), ParseError> {
    let invalid = || ParseError::InvalidPoint(s.to_string());
    let (x, y) = split_pair(s, ',').ok_or_else(invalid)?;
    let x: f64 = x.parse().map_err(|_| invalid())?;
    let y: f64 = y.parse().map_err(|_| invalid())?;
    if x.is_finite() && y.is_finite() {
        Ok((x, y))
    } else {
        Err(invalid())
    }
}

pub fn parse_order_pair(s: &str) -> Result<(i32, i32), ParseError> {
    let invalid = || ParseError::InvalidOrderPair(s.to_string());
    let (a, b) = split_pair(s, ',').ok_or_else(invalid)?;
    Ok((
        a.parse().map_err(|_| invalid())?,
        b.parse().map_err(|_| invalid())?,
    ))
}

pub fn parse_step_range(s: &str) -> Result<(u32, u32), ParseError> {
    let invalid = || ParseError::InvalidStepRange(s.to_string());
    let (lower, upper) = split_pair(s, ':').ok_or_else(invalid)?;
    Ok((
        lower.parse().map_err(|_| invalid())?,
        upper.parse().map_err(|_| invalid())?,
    ))
}

pub fn parse_key_value(s: &str) -> Result<(&str, &str), ParseError> {
    match split_pair(s, '=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(ParseError::InvalidKeyValue(s.to_string())),
    }
}
