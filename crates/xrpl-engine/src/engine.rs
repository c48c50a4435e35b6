use std::time::{Duration, Instant};

use xrpl_crypto::{Ed25519Verifier, SignatureVerifier};
use xrpl_store::{Action, LedgerView, PendingChanges, ReadView, Sandbox, StoreError};
use xrpl_types::{Amount, Hash256, LedgerEntryType, ResultCode};

use crate::common::{apply_preamble, check_signature, preclaim, preflight};
use crate::config::EngineConfig;
use crate::error::TxResult;
use crate::flow::{DirectSettler, FlowSettler};
use crate::invariants;
use crate::stage::{run_stage, Stage, StageResult};
use crate::transaction::Transaction;
use crate::transactor::ApplyContext;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// How a committed transaction touched one ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeChange {
    Created,
    Modified,
    Deleted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedNode {
    pub key: Hash256,
    pub entry_type: LedgerEntryType,
    pub change: NodeChange,
}

/// What a committed transaction did to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxMeta {
    pub result: ResultCode,
    /// Entries touched, in key order.
    pub affected: Vec<AffectedNode>,
    /// Set by payments and check cashing when they succeed.
    pub delivered_amount: Option<Amount>,
}

impl TxMeta {
    pub fn change_for(&self, key: &Hash256) -> Option<NodeChange> {
        self.affected.iter().find(|n| n.key == *key).map(|n| n.change)
    }
}

// ---------------------------------------------------------------------------
// EngineResult
// ---------------------------------------------------------------------------

/// The outcome of running one transaction through the pipeline.
#[derive(Clone, Debug)]
pub struct EngineResult {
    pub result: ResultCode,
    /// `true` only for `tesSUCCESS`.
    pub applied: bool,
    /// Detail from the failing step, if any.
    pub diagnostic: Option<String>,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Present whenever something was committed: always for `tes`, and for
    /// `tec` where only the fee and sequence were.
    pub meta: Option<TxMeta>,
    pub elapsed: Duration,
}

impl EngineResult {
    /// Whether the view changed at all.
    pub fn is_committed(&self) -> bool {
        self.meta.is_some()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Applies transactions, one at a time, to a ledger view it holds
/// exclusively.
///
/// Each transaction runs preflight, signature, preclaim, then apply and
/// invariant checks inside a sandbox. `tes` commits the sandbox. `tec`
/// throws it away and commits a second sandbox holding only the fee and
/// sequence (or ticket). Anything else leaves the view untouched.
pub struct Engine<'v, V: LedgerView> {
    view: &'v mut V,
    config: EngineConfig,
    verifier: Box<dyn SignatureVerifier>,
    settler: Box<dyn FlowSettler>,
}

impl<'v, V: LedgerView> Engine<'v, V> {
    /// An engine with Ed25519 verification and the direct settler.
    pub fn new(view: &'v mut V, config: EngineConfig) -> Self {
        Self {
            view,
            config,
            verifier: Box::new(Ed25519Verifier),
            settler: Box::new(DirectSettler),
        }
    }

    pub fn with_verifier(mut self, verifier: Box<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_settler(mut self, settler: Box<dyn FlowSettler>) -> Self {
        self.settler = settler;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &*self.view
    }

    /// Run `tx` through the full pipeline.
    ///
    /// Never panics on a rule violation; every outcome is a result code.
    pub fn apply(&mut self, tx: &Transaction) -> EngineResult {
        let start = Instant::now();
        let span = tracing::debug_span!(
            "apply",
            tx_type = %tx.tx_type(),
            account = %tx.common.account,
            sequence = tx.common.seq_proxy(),
        );
        let _enter = span.enter();
        let mut trail = Vec::with_capacity(5);

        if let Err(failure) = run_stage(&mut trail, Stage::Preflight, || preflight(tx, &self.config)) {
            return finish(failure.code, Some(failure.diagnostic), trail, None, start);
        }

        if !self.config.skip_signature_verification {
            let view: &dyn ReadView = &*self.view;
            let verifier = self.verifier.as_ref();
            if let Err(failure) =
                run_stage(&mut trail, Stage::Signature, || check_signature(view, tx, verifier))
            {
                return finish(failure.code, Some(failure.diagnostic), trail, None, start);
            }
        }

        let checked = run_stage(&mut trail, Stage::Preclaim, || {
            preclaim(&*self.view, tx, &self.config)
        });
        let full = match checked {
            Ok(()) => self.attempt(tx, true, &mut trail),
            Err(failure) => Err(failure),
        };

        let (result, diagnostic, changes, delivered) = match full {
            Ok((changes, delivered)) => (ResultCode::TesSuccess, None, changes, delivered),
            Err(failure) if failure.code.is_tec() => match self.attempt(tx, false, &mut trail) {
                Ok((changes, _)) => (failure.code, Some(failure.diagnostic), changes, None),
                Err(claim) => {
                    let code = if claim.code == ResultCode::TecInvariantFailed {
                        ResultCode::TefInvariantFailed
                    } else {
                        claim.code
                    };
                    tracing::warn!(result = %code, diagnostic = %claim.diagnostic, "fee claim failed");
                    return finish(code, Some(claim.diagnostic), trail, None, start);
                }
            },
            Err(failure) => {
                if failure.code.is_tef() {
                    tracing::warn!(result = %failure.code, diagnostic = %failure.diagnostic, "transaction failed");
                }
                return finish(failure.code, Some(failure.diagnostic), trail, None, start);
            }
        };

        let affected = match self.commit(changes) {
            Ok(affected) => affected,
            Err(err) => {
                tracing::warn!(error = %err, "commit failed");
                return finish(ResultCode::TefInternal, Some(err.to_string()), trail, None, start);
            }
        };

        if result.is_success() {
            tracing::info!(nodes = affected.len(), "transaction applied");
        } else {
            tracing::debug!(result = %result, "fee claimed");
        }
        let meta = TxMeta {
            result,
            affected,
            delivered_amount: delivered,
        };
        finish(result, diagnostic, trail, Some(meta), start)
    }

    /// Apply every transaction in order, each against the state the
    /// previous ones left.
    pub fn apply_all<'t>(&mut self, txs: impl IntoIterator<Item = &'t Transaction>) -> Vec<EngineResult> {
        txs.into_iter().map(|tx| self.apply(tx)).collect()
    }

    /// One sandboxed pass: the preamble, the transactor body when
    /// `with_body`, then the invariant checks.
    fn attempt(
        &self,
        tx: &Transaction,
        with_body: bool,
        trail: &mut Vec<StageResult>,
    ) -> TxResult<(PendingChanges, Option<Amount>)> {
        let mut sandbox = Sandbox::new(&*self.view);
        let stage = if with_body { Stage::Apply } else { Stage::ClaimFee };

        let (fee_paid, delivered) = run_stage(trail, stage, || {
            let preamble = apply_preamble(&mut sandbox, &tx.common)?;
            if !with_body {
                return Ok((preamble.fee_paid, None));
            }
            let mut ctx = ApplyContext {
                view: &mut sandbox,
                common: &tx.common,
                config: &self.config,
                settler: self.settler.as_ref(),
                prior_balance: preamble.prior_balance,
                fee_paid: preamble.fee_paid,
                delivered: None,
            };
            tx.transactor().do_apply(&mut ctx)?;
            Ok((preamble.fee_paid, ctx.delivered))
        })?;

        run_stage(trail, Stage::Invariants, || {
            invariants::check(&sandbox, &tx.common.account, fee_paid, &self.config.fees)
        })?;
        Ok((sandbox.into_changes(), delivered))
    }

    fn commit(&mut self, changes: PendingChanges) -> Result<Vec<AffectedNode>, StoreError> {
        let affected = changes
            .iter()
            .map(|(key, pending)| AffectedNode {
                key: *key,
                entry_type: pending.entry_type,
                change: match pending.action {
                    Action::Created(_) => NodeChange::Created,
                    Action::Modified(_) => NodeChange::Modified,
                    Action::Deleted => NodeChange::Deleted,
                },
            })
            .collect();
        changes.apply_to(&mut *self.view)?;
        Ok(affected)
    }
}

fn finish(
    result: ResultCode,
    diagnostic: Option<String>,
    stage_results: Vec<StageResult>,
    meta: Option<TxMeta>,
    start: Instant,
) -> EngineResult {
    if !result.is_success() {
        tracing::debug!(result = %result, diagnostic = diagnostic.as_deref().unwrap_or(""), "not applied");
    }
    EngineResult {
        result,
        applied: result.is_success(),
        diagnostic,
        stage_results,
        meta,
        elapsed: start.elapsed(),
    }
}
