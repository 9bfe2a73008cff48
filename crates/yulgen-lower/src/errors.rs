use thiserror::Error;

/// Failures of the code generator. Neither class is recoverable: the unit being lowered is
/// abandoned and the error is reported to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A construct the front-end accepts but the generator does not support yet.
    #[error("Unimplemented feature: {feature}")]
    Unimplemented { feature: String },

    /// An internal consistency check failed, e.g. a malformed tree or a lost lvalue.
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },
}

impl CodegenError {
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        CodegenError::Unimplemented {
            feature: feature.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CodegenError::InvariantViolation {
            message: message.into(),
        }
    }

    /// True for unsupported input, false for internal bugs. Callers use it to decide whom to blame.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, CodegenError::Unimplemented { .. })
    }
}

impl From<yulgen_core::IrError> for CodegenError {
    fn from(err: yulgen_core::IrError) -> Self {
        CodegenError::invariant(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Returns early with an invariant violation unless the condition holds.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::errors::CodegenError::invariant(format!($($arg)+)));
        }
    };
}

/// Returns early with an unimplemented-feature error unless the condition holds.
#[macro_export]
macro_rules! ensure_implemented {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::errors::CodegenError::unimplemented(format!($($arg)+)));
        }
    };
}
