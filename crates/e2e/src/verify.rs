//! Price verification against a set of acceptable values

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

/// Outcome of checking one observed price against every candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub matched: bool,

    /// Every candidate compared, in the order given
    pub tried_candidates: Vec<String>,

    /// Candidates that did not match, in the order they were tried
    pub mismatches: Vec<String>,
}

/// Compare `observed` with each candidate without failing on a miss.
///
/// Matching is exact string equality: no currency stripping, no numeric
/// tolerance.
pub fn check(observed: &str, expected: &[String]) -> VerificationResult {
    let mut tried_candidates = Vec::with_capacity(expected.len());
    let mut mismatches = Vec::new();
    let mut matched = false;

    for candidate in expected {
        tried_candidates.push(candidate.clone());
        if candidate.as_str() == observed {
            matched = true;
        } else {
            debug!("Price '{}' does not match candidate '{}'", observed, candidate);
            mismatches.push(candidate.clone());
        }
    }

    VerificationResult {
        matched,
        tried_candidates,
        mismatches,
    }
}

/// Pass when any candidate matches; otherwise fail with the full candidate list
pub fn verify(observed: &str, expected: &[String]) -> E2eResult<VerificationResult> {
    let result = check(observed, expected);

    if !result.matched {
        return Err(E2eError::PriceMismatch {
            observed: observed.to_string(),
            candidates: result.tried_candidates,
        });
    }

    info!(
        "Price '{}' accepted ({} of {} candidate(s) missed)",
        observed,
        result.mismatches.len(),
        result.tried_candidates.len()
    );
    Ok(result)
}
