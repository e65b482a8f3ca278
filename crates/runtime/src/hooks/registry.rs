//! Hook registry for managing and dispatching host-event hooks.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use skirmish_core::DomainError;
use tracing::{debug, error, trace, warn};

use super::{
    AuraHook, ConditionHook, EffectLifecycleHook, GmMirrorHook, HookCriticality, HostEvent,
    HostHook, LinkedRemovalHook, TemplateHook, TurnHook,
};
use crate::error::{Result, RuntimeError};
use crate::session::SessionContext;

/// Registry that dispatches host events to hooks.
///
/// Hooks run in priority order for every event. Events a hook returns are
/// queued behind the current one, so a cascade is processed breadth-first.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Arc<[Arc<dyn HostHook>]>,
    lookup_table: HashMap<&'static str, Arc<dyn HostHook>>,
}

impl HookRegistry {
    /// Creates a registry; hooks are sorted by priority (lower values first).
    pub fn new(mut hooks: Vec<Arc<dyn HostHook>>) -> Self {
        hooks.sort_by_key(|h| h.priority());

        let lookup_table = hooks.iter().map(|h| (h.name(), Arc::clone(h))).collect();

        Self {
            hooks: hooks.into(),
            lookup_table,
        }
    }

    /// Creates a registry with the standard set of hooks.
    ///
    /// - [`EffectLifecycleHook`]: cascades effect deletions (-20)
    /// - [`TemplateHook`]: keeps attached templates in step with tokens (-10)
    /// - [`AuraHook`]: reconciles auras after scene changes (0)
    /// - [`TurnHook`]: fires turn conditions (0)
    /// - [`ConditionHook`]: runs update actions for fired conditions (10)
    /// - [`GmMirrorHook`] and [`LinkedRemovalHook`]: message views (20)
    pub fn default_hooks() -> Self {
        Self::new(vec![
            Arc::new(EffectLifecycleHook),
            Arc::new(TemplateHook),
            Arc::new(AuraHook),
            Arc::new(TurnHook),
            Arc::new(ConditionHook),
            Arc::new(GmMirrorHook),
            Arc::new(LinkedRemovalHook),
        ])
    }

    /// Adds `hook`, replacing any hook registered under the same name.
    pub fn with(self, hook: Arc<dyn HostHook>) -> Self {
        let mut hooks: Vec<_> = self
            .hooks
            .iter()
            .filter(|existing| existing.name() != hook.name())
            .cloned()
            .collect();
        hooks.push(hook);
        Self::new(hooks)
    }

    /// Dispatches `event` and every follow-up it produces.
    ///
    /// # Error Handling
    ///
    /// Hook failures are handled based on criticality level:
    /// - `Critical`: returns the error immediately
    /// - `Important`: logs the error and continues with the next hook
    /// - `Optional`: logs at debug level and continues
    pub async fn dispatch(&self, ctx: &SessionContext, event: HostEvent) -> Result<()> {
        let limit = ctx.config().max_hook_events;
        let mut queue = VecDeque::from([event]);
        let mut processed = 0usize;

        while let Some(event) = queue.pop_front() {
            processed += 1;
            if processed > limit {
                error!(target: "runtime::hooks", limit, "hook cascade limit reached");
                return Err(RuntimeError::HookCascade { limit });
            }
            trace!(target: "runtime::hooks", event = event.name(), "dispatching host event");

            for hook in self.hooks.iter() {
                if !hook.should_trigger(&event) {
                    continue;
                }
                match hook.handle(ctx, &event).await {
                    Ok(follow_ups) => queue.extend(follow_ups),
                    Err(error) => self.handle_hook_error(hook.as_ref(), error)?,
                }
            }
        }
        Ok(())
    }

    /// Finds a hook by name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn HostHook>> {
        self.lookup_table.get(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Returns an iterator over hook names and priorities (for debugging).
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.hooks.iter().map(|h| (h.name(), h.priority()))
    }

    /// Returns Ok(()) for Important/Optional hooks, Err for Critical hooks.
    fn handle_hook_error(&self, hook: &dyn HostHook, error: RuntimeError) -> Result<()> {
        match hook.criticality() {
            HookCriticality::Critical => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "critical",
                    error = %error,
                    "Critical hook failed, aborting dispatch"
                );
                Err(error)
            }
            HookCriticality::Important if error.severity().is_recoverable() => {
                warn!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "important",
                    code = error.error_code(),
                    error = %error,
                    "Hook skipped a record that no longer exists"
                );
                Ok(())
            }
            HookCriticality::Important => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "important",
                    code = error.error_code(),
                    error = %error,
                    "Hook failed, continuing"
                );
                Ok(())
            }
            HookCriticality::Optional => {
                debug!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "optional",
                    error = %error,
                    "Optional hook failed"
                );
                Ok(())
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::default_hooks()
    }
}
