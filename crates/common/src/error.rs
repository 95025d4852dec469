/// Errors raised while converting human-entered amounts into base units
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount must not be negative: {0}")]
    NegativeAmount(String),
    #[error("Overflow")]
    Overflow,
    #[error("Division by zero")]
    DivisionByZero,
}
