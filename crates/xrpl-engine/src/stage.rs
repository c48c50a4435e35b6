use std::fmt;
use std::time::{Duration, Instant};

use xrpl_types::ResultCode;

use crate::error::TxResult;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One step of the engine pipeline, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Amendment gating plus stateless field checks.
    Preflight,
    /// Signature and signing authority.
    Signature,
    /// Read-only checks against ledger state.
    Preclaim,
    /// State mutation inside a sandbox.
    Apply,
    /// Fee and sequence only, after a `tec` result.
    ClaimFee,
    /// Post-apply consistency checks.
    Invariants,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Signature => "signature",
            Self::Preclaim => "preclaim",
            Self::Apply => "apply",
            Self::ClaimFee => "claim-fee",
            Self::Invariants => "invariants",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    /// `tesSUCCESS` when the stage passed.
    pub result: ResultCode,
    /// Populated on failure.
    pub reason: Option<String>,
    /// Wall-clock time the stage took.
    pub elapsed: Duration,
}

impl StageResult {
    pub fn passed(&self) -> bool {
        self.result.is_success()
    }
}

/// Run one stage, appending its outcome to `trail`.
pub(crate) fn run_stage<T>(
    trail: &mut Vec<StageResult>,
    stage: Stage,
    f: impl FnOnce() -> TxResult<T>,
) -> TxResult<T> {
    let start = Instant::now();
    let outcome = f();
    let elapsed = start.elapsed();
    let (result, reason) = match &outcome {
        Ok(_) => (ResultCode::TesSuccess, None),
        Err(failure) => (failure.code, Some(failure.diagnostic.clone())),
    };
    tracing::debug!(stage = %stage, result = %result, ?elapsed, "stage finished");
    trail.push(StageResult {
        stage,
        result,
        reason,
        elapsed,
    });
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::reject;

    #[test]
    fn records_pass_and_failure() {
        let mut trail = Vec::new();
        let ok = run_stage(&mut trail, Stage::Preflight, || Ok(7));
        assert_eq!(ok.unwrap(), 7);
        let err: TxResult<()> = run_stage(&mut trail, Stage::Preclaim, || {
            reject(ResultCode::TecNoEntry, "gone")
        });
        assert_eq!(err.unwrap_err().code, ResultCode::TecNoEntry);

        assert_eq!(trail.len(), 2);
        assert!(trail[0].passed());
        assert_eq!(trail[0].reason, None);
        assert!(!trail[1].passed());
        assert_eq!(trail[1].stage, Stage::Preclaim);
        assert_eq!(trail[1].reason.as_deref(), Some("gone"));
    }
}
