//! FILENAME: core/engine/src/decimal.rs
//! PURPOSE: Exact decimal arithmetic behind the formula operators.
//! CONTEXT: Add, subtract and multiply are exact up to MAX_SCALE fractional
//! digits. Division keeps DIVISION_SCALE fractional digits rounded half-up.
//! Every numeric result must stay representable as a finite double so hosts
//! can always read it back.

use bigdecimal::{BigDecimal, FromPrimitive, One, RoundingMode, ToPrimitive, Zero};
use formula_parser::{FormulaError, FormulaResult, Operator, Value};

/// Fractional digits kept by division.
pub const DIVISION_SCALE: i64 = 20;

/// Fractional digits kept by any result. Covers the exact expansion of every
/// double, so only values a double cannot hold are rounded.
pub const MAX_SCALE: i64 = 1100;

/// Largest integer exponent computed exactly by repeated squaring.
const MAX_EXACT_EXPONENT: i64 = 4096;

/// Fails with `WillBeInfinity` if the value would overflow a double.
pub fn ensure_finite(value: BigDecimal) -> FormulaResult<BigDecimal> {
    if value.to_f64().is_some_and(f64::is_finite) {
        Ok(value)
    } else {
        Err(FormulaError::WillBeInfinity)
    }
}

/// Rounds half-up to at most MAX_SCALE fractional digits.
pub fn bound_scale(value: BigDecimal) -> BigDecimal {
    let (_, scale) = value.as_bigint_and_exponent();
    if scale <= MAX_SCALE {
        return value;
    }
    // Below 10^-(MAX_SCALE + 1) nothing survives the rounding.
    if (value.digits() as i64) - scale < -MAX_SCALE {
        return BigDecimal::zero();
    }
    value.with_scale_round(MAX_SCALE, RoundingMode::HalfUp)
}

fn operands(x: &BigDecimal, y: &BigDecimal) -> (BigDecimal, BigDecimal) {
    (bound_scale(x.clone()), bound_scale(y.clone()))
}

pub fn add(x: &BigDecimal, y: &BigDecimal) -> FormulaResult<BigDecimal> {
    let (x, y) = operands(x, y);
    ensure_finite(bound_scale(x + y))
}

pub fn minus(x: &BigDecimal, y: &BigDecimal) -> FormulaResult<BigDecimal> {
    let (x, y) = operands(x, y);
    ensure_finite(bound_scale(x - y))
}

pub fn multi(x: &BigDecimal, y: &BigDecimal) -> FormulaResult<BigDecimal> {
    let (x, y) = operands(x, y);
    ensure_finite(bound_scale(x * y))
}

pub fn div(x: &BigDecimal, y: &BigDecimal) -> FormulaResult<BigDecimal> {
    let (x, y) = operands(x, y);
    if y.is_zero() {
        return Err(FormulaError::DivisionByZero);
    }
    let quotient = (x / y)
        .with_scale_round(DIVISION_SCALE, RoundingMode::HalfUp)
        .normalized();
    ensure_finite(quotient)
}

/// `x` raised to `y`. Integer exponents are exact (negative ones divide);
/// fractional exponents go through `f64`.
pub fn pow(x: &BigDecimal, y: &BigDecimal) -> FormulaResult<BigDecimal> {
    if y.is_integer() {
        if let Some(exponent) = y.to_i64().filter(|e| e.abs() <= MAX_EXACT_EXPONENT) {
            if !x.is_zero() {
                let estimate = x.to_f64().map(|base| base.powi(exponent as i32));
                match estimate {
                    Some(e) if !e.is_finite() => return Err(FormulaError::WillBeInfinity),
                    Some(e) if e == 0.0 => return Ok(BigDecimal::zero()),
                    _ => {}
                }
            }
            let magnitude = pow_exact(x, exponent.unsigned_abs());
            return if exponent < 0 {
                div(&BigDecimal::one(), &magnitude)
            } else {
                ensure_finite(magnitude)
            };
        }
    }

    let base = x.to_f64().ok_or(FormulaError::WillBeInfinity)?;
    let exponent = y.to_f64().ok_or(FormulaError::WillBeInfinity)?;
    let result = base.powf(exponent);
    if result.is_nan() {
        return Err(FormulaError::InvalidData("pow".to_string()));
    }
    if !result.is_finite() {
        return Err(FormulaError::WillBeInfinity);
    }
    BigDecimal::from_f64(result).ok_or(FormulaError::WillBeInfinity)
}

fn pow_exact(base: &BigDecimal, mut exponent: u64) -> BigDecimal {
    let mut result = BigDecimal::one();
    let mut square = bound_scale(base.clone());
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = bound_scale(&result * &square);
        }
        exponent >>= 1;
        if exponent > 0 {
            square = bound_scale(&square * &square);
        }
    }
    result
}

pub fn gt(x: &BigDecimal, y: &BigDecimal) -> bool {
    x > y
}

pub fn gte(x: &BigDecimal, y: &BigDecimal) -> bool {
    x >= y
}

pub fn lt(x: &BigDecimal, y: &BigDecimal) -> bool {
    x < y
}

pub fn lte(x: &BigDecimal, y: &BigDecimal) -> bool {
    x <= y
}

pub fn eq(x: &BigDecimal, y: &BigDecimal) -> bool {
    x == y
}

pub fn neq(x: &BigDecimal, y: &BigDecimal) -> bool {
    x != y
}

/// Applies a formula operator to two numbers.
pub fn apply(op: Operator, lhs: &BigDecimal, rhs: &BigDecimal) -> FormulaResult<Value> {
    let value = match op {
        Operator::GreaterThan => Value::Boolean(gt(lhs, rhs)),
        Operator::GreaterEqual => Value::Boolean(gte(lhs, rhs)),
        Operator::LessThan => Value::Boolean(lt(lhs, rhs)),
        Operator::LessEqual => Value::Boolean(lte(lhs, rhs)),
        Operator::Equal => Value::Boolean(eq(lhs, rhs)),
        Operator::NotEqual => Value::Boolean(neq(lhs, rhs)),
        Operator::Add => Value::Number(add(lhs, rhs)?),
        Operator::Subtract => Value::Number(minus(lhs, rhs)?),
        Operator::Multiply => Value::Number(multi(lhs, rhs)?),
        Operator::Divide => Value::Number(div(lhs, rhs)?),
    };
    Ok(value)
}
