use thiserror::Error;

//errors raised by the evaluation core
//every failure is surfaced to the caller, nothing is turned into nan or zero
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Invalid option type '{0}', expected 'call' or 'put'")]
    InvalidOptionType(String),
    #[error("Insufficient data: {required} points required, {actual} available")]
    InsufficientData { required: usize, actual: usize },
    #[error("Length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Division by zero while computing {0}")]
    DivisionByZero(&'static str),
    #[error("Timestamps must be strictly increasing (violated at index {index})")]
    UnorderedTimestamps { index: usize },
}

pub type EvalResult<T> = Result<T, EvalError>;

//fails unless value is finite and strictly positive
pub fn ensure_positive(name: &'static str, value: f64) -> EvalResult<f64> {
    if !value.is_finite() {
        return Err(EvalError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    if value <= 0.0 {
        return Err(EvalError::InvalidParameter {
            name,
            value,
            reason: "must be strictly positive",
        });
    }
    Ok(value)
}

//fails unless value is finite
pub fn ensure_finite(name: &'static str, value: f64) -> EvalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

//fails unless at least `required` points are available
pub fn ensure_len(required: usize, actual: usize) -> EvalResult<()> {
    if actual < required {
        return Err(EvalError::InsufficientData { required, actual });
    }
    Ok(())
}

//fails unless both sides hold the same number of values
pub fn ensure_same_len(expected: usize, actual: usize) -> EvalResult<()> {
    if expected != actual {
        return Err(EvalError::LengthMismatch { expected, actual });
    }
    Ok(())
}
