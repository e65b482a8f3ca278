use std::collections::BTreeMap;

use super::{Branch, CustomStep, Flow, FlowError, Plan, PreRollOptions};
use crate::config::RulesConfig;
use crate::item::{ApplicationType, ItemTraits};

/// Builds a branch tree from a flow context.
pub trait Evaluator<X> {
    fn evaluate(&self, flow: &mut Flow<'_, X>) -> Option<Branch>;
}

impl<X, F> Evaluator<X> for F
where
    F: Fn(&mut Flow<'_, X>) -> Option<Branch>,
{
    fn evaluate(&self, flow: &mut Flow<'_, X>) -> Option<Branch> {
        self(flow)
    }
}

/// Host capability that runs an item's stored macro against a flow.
///
/// The core never interprets macro text itself; a host without a sandboxed
/// scripting facility simply does not supply one.
pub trait MacroEvaluator<X> {
    fn evaluate_macro(
        &self,
        source: &str,
        flow: &mut Flow<'_, X>,
    ) -> Result<Option<Branch>, FlowError>;
}

/// Which evaluator produced a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PlanSource {
    Macro,
    Default,
}

/// A plan together with what the evaluation registered along the way.
#[derive(Debug)]
pub struct BuiltPlan<X> {
    pub plan: Plan,
    pub source: PlanSource,
    pub custom_steps: BTreeMap<String, CustomStep<X>>,
    pub pre_roll: PreRollOptions,
}

impl<X> Flow<'_, X> {
    /// Runs the item macro (when present and allowed), falling back to
    /// `default` when the macro yields nothing.
    pub fn evaluate(
        mut self,
        default: &dyn Evaluator<X>,
        macros: Option<&dyn MacroEvaluator<X>>,
        rules: &RulesConfig,
    ) -> Result<BuiltPlan<X>, FlowError> {
        let depth = rules.flatten_depth();

        let from_macro = match (rules.allow_item_macros, self.item().macro_body(), macros) {
            (true, Some(source), Some(evaluator)) => evaluator
                .evaluate_macro(source, &mut self)?
                .map(|branch| branch.flatten(depth))
                .transpose()?
                .filter(|steps| !steps.is_empty()),
            _ => None,
        };

        let (steps, source) = match from_macro {
            Some(steps) => (steps, PlanSource::Macro),
            None => {
                let steps = match default.evaluate(&mut self) {
                    Some(branch) => branch.flatten(depth)?,
                    None => Vec::new(),
                };
                (steps, PlanSource::Default)
            }
        };

        let (custom_steps, pre_roll) = self.into_parts();
        Ok(BuiltPlan {
            plan: Plan::new(steps),
            source,
            custom_steps,
            pre_roll,
        })
    }
}

/// Builds the plan for `item` in `application`.
pub fn build_plan<X>(
    item: &ItemTraits,
    application: ApplicationType,
    default: &dyn Evaluator<X>,
    macros: Option<&dyn MacroEvaluator<X>>,
    rules: &RulesConfig,
) -> Result<BuiltPlan<X>, FlowError> {
    Flow::new(item, application).evaluate(default, macros, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{BuiltinStep, Step};
    use crate::state::ItemId;

    struct ScriptedMacro {
        yields_steps: bool,
    }

    impl MacroEvaluator<u8> for ScriptedMacro {
        fn evaluate_macro(
            &self,
            source: &str,
            flow: &mut Flow<'_, u8>,
        ) -> Result<Option<Branch>, FlowError> {
            if source == "fail" {
                return Err(FlowError::MacroFailed("syntax error".into()));
            }
            flow.register_flow_step("fromMacro", false, 7);
            if self.yields_steps {
                Ok(flow.sequence([flow.perform_custom_step("fromMacro", ())]))
            } else {
                Ok(Some(Branch::empty()))
            }
        }
    }

    fn default_flow(flow: &mut Flow<'_, u8>) -> Option<Branch> {
        flow.apply_default_targets(())
    }

    fn macro_item(source: &str) -> ItemTraits {
        let mut item = ItemTraits::new(ItemId(9), "Scripted");
        item.macro_source = Some(source.to_string());
        item
    }

    #[test]
    fn macro_plan_takes_precedence() {
        let item = macro_item("return custom");
        let built = build_plan(
            &item,
            ApplicationType::Immediate,
            &default_flow,
            Some(&ScriptedMacro { yields_steps: true }),
            &RulesConfig::default(),
        )
        .unwrap();

        assert_eq!(built.source, PlanSource::Macro);
        assert_eq!(built.plan.steps(), [Step::new("fromMacro", ())]);
        assert!(built.custom_steps.contains_key("fromMacro"));
    }

    #[test]
    fn empty_macro_result_falls_through_but_keeps_registrations() {
        let item = macro_item("noop");
        let built = build_plan(
            &item,
            ApplicationType::Immediate,
            &default_flow,
            Some(&ScriptedMacro { yields_steps: false }),
            &RulesConfig::default(),
        )
        .unwrap();

        assert_eq!(built.source, PlanSource::Default);
        assert!(built.plan.contains(BuiltinStep::ApplyDefaultTargets));
        assert!(built.custom_steps.contains_key("fromMacro"));
    }

    #[test]
    fn disallowed_macros_are_not_run() {
        let item = macro_item("fail");
        let rules = RulesConfig {
            allow_item_macros: false,
            ..RulesConfig::default()
        };
        let built = build_plan(
            &item,
            ApplicationType::Immediate,
            &default_flow,
            Some(&ScriptedMacro { yields_steps: true }),
            &rules,
        )
        .unwrap();
        assert_eq!(built.source, PlanSource::Default);

        let err = build_plan(
            &item,
            ApplicationType::Immediate,
            &default_flow,
            Some(&ScriptedMacro { yields_steps: true }),
            &RulesConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, FlowError::MacroFailed("syntax error".into()));
    }
}
