//! Aura reconciliation driver.
//!
//! Plans the delta with [`plan_reconciliation`] over one snapshot of the
//! scene, then applies it through the document store. Passes are serialized,
//! so two scene changes arriving together never create duplicate grants.

use skirmish_core::{
    ConcurrentModificationError, EffectState, RecordRef, plan_reconciliation,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::AuraEvent;
use crate::session::SessionContext;

/// Effects created and removed by one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuraOutcome {
    pub created: Vec<EffectState>,
    pub removed: Vec<EffectState>,
}

impl AuraOutcome {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

#[derive(Default)]
pub struct AuraReconciler {
    pass: Mutex<()>,
}

impl AuraReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings aura-derived effects in line with the current scene.
    ///
    /// Entries whose records vanish mid-pass, or whose write fails, are
    /// logged and dropped from the pass; the rest of the delta still applies.
    pub async fn reconcile(&self, ctx: &SessionContext) -> Result<AuraOutcome> {
        let _pass = self.pass.lock().await;
        let store = ctx.store();

        let tokens = store.tokens()?;
        let effects = store.effects()?;
        let delta = plan_reconciliation(&tokens, &effects, ctx.rules());
        if delta.is_empty() {
            return Ok(AuraOutcome::default());
        }

        let mut outcome = AuraOutcome::default();
        for id in delta.remove {
            match store.delete_effect(id) {
                Ok(Some(effect)) => outcome.removed.push(effect),
                Ok(None) => {}
                Err(error) => {
                    warn!(target: "runtime::aura", effect = %id, error = %error, "aura effect removal skipped");
                }
            }
        }

        for grant in delta.create {
            match store.effect(grant.source) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    let dropped = ConcurrentModificationError(RecordRef::Effect(grant.source));
                    warn!(target: "runtime::aura", error = %dropped, "aura source vanished mid-pass");
                    continue;
                }
                Err(error) => {
                    warn!(target: "runtime::aura", aura = %grant.source, error = %error, "aura source unreadable, grant skipped");
                    continue;
                }
            }
            let target = grant.target;
            match store.create_effect(grant.into_new_effect()) {
                Ok(effect) => outcome.created.push(effect),
                Err(error) if error.is_missing() => {
                    let dropped = ConcurrentModificationError(RecordRef::Actor(target));
                    warn!(target: "runtime::aura", error = %dropped, "aura target vanished mid-pass");
                }
                Err(error) => {
                    warn!(target: "runtime::aura", actor = %target, error = %error, "aura grant skipped");
                }
            }
        }

        debug!(
            target: "runtime::aura",
            created = outcome.created.len(),
            removed = outcome.removed.len(),
            "aura pass applied"
        );
        ctx.bus().publish(AuraEvent::Reconciled {
            created: outcome.created.len(),
            removed: outcome.removed.len(),
        });
        Ok(outcome)
    }
}
