use crate::HashKind;

use thiserror::Error;

/// Why a particular forgery attempt could not be completed.
///
/// Every variant is a property of the specific bit pattern being forged,
/// not of the method, so changing the message and trying again is expected
/// to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasible {
    /// The suffix is even with a number of trailing zero bits that isn't a
    /// multiple of three, so it isn't a cube modulo any power of two covering
    /// it.
    EvenSuffix,
    /// Rounding the prefix root did not settle within the attempt bound.
    PrefixRounding,
    /// The template's middle window can't be reached from the free bytes
    /// left by the prefix and suffix roots.
    MiddleGeometry,
    /// No correction inside the middle window matched the required bytes.
    MiddleWindow,
    /// None of the candidate messages could be forged.
    NoCandidate,
}

impl std::fmt::Display for Infeasible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Infeasible::EvenSuffix => "suffix is not a cube modulo a power of two",
            Infeasible::PrefixRounding => "prefix root did not converge",
            Infeasible::MiddleGeometry => "middle window is out of reach of the free bytes",
            Infeasible::MiddleWindow => "no correction reconciles the middle window",
            Infeasible::NoCandidate => "no candidate message could be forged",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Retryable,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    #[error("unsupported hash / key length combination: {hash} with {bit_len} bits")]
    UnsupportedParameters { hash: HashKind, bit_len: usize },
    #[error("wrong hash length: expected {expected} bytes, got {actual}")]
    WrongHashLength { expected: usize, actual: usize },
    #[error("signature can't be forged for this input ({0}); change the message and retry")]
    RetryableInfeasible(Infeasible),
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl ForgeError {
    pub fn severity(&self) -> Severity {
        match self {
            ForgeError::RetryableInfeasible(_) => Severity::Retryable,
            _ => Severity::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == Severity::Retryable
    }
}

impl From<Infeasible> for ForgeError {
    fn from(reason: Infeasible) -> Self {
        ForgeError::RetryableInfeasible(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(ForgeError::RetryableInfeasible(Infeasible::EvenSuffix), Severity::Retryable)]
    #[case(ForgeError::RetryableInfeasible(Infeasible::MiddleWindow), Severity::Retryable)]
    #[case(ForgeError::UnsupportedParameters { hash: HashKind::Sha256, bit_len: 1024 }, Severity::Fatal)]
    #[case(ForgeError::WrongHashLength { expected: 20, actual: 19 }, Severity::Fatal)]
    #[case(ForgeError::InternalInvariantViolation("overlap".into()), Severity::Fatal)]
    fn severity_separates_retryable_from_fatal(
        #[case] error: ForgeError,
        #[case] expected: Severity,
    ) {
        assert_eq!(error.severity(), expected);
        assert_eq!(error.is_retryable(), expected == Severity::Retryable);
    }

    #[test]
    fn infeasible_converts_into_retryable_error() {
        let error: ForgeError = Infeasible::PrefixRounding.into();

        assert_eq!(
            error,
            ForgeError::RetryableInfeasible(Infeasible::PrefixRounding)
        );
        assert!(error.to_string().contains("change the message and retry"));
    }
}
