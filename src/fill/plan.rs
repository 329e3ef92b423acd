//! Argument plan construction.

use crate::fill::synthesize::{RecursionGuard, Synthesizer};
use crate::types::{ArgumentPlan, ParameterDescriptor, PlannedArgument};

/// Map the synthesizer over the eligible parameters, preserving order.
pub fn build_plan(
    eligible: &[&ParameterDescriptor],
    synthesizer: &mut Synthesizer<'_>,
    guard: &mut RecursionGuard,
) -> ArgumentPlan {
    let arguments = eligible
        .iter()
        .map(|parameter| PlannedArgument {
            parameter_name: parameter.name.clone(),
            value: synthesizer.synthesize(parameter, guard),
        })
        .collect();
    ArgumentPlan { arguments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::dummy::LoremCorpus;
    use crate::fill::filter::eligible_parameters;
    use crate::fill::synthesize::TypeLookup;
    use crate::types::{CallCandidate, FillPolicy, Origin, TypeClass, TypeRef, ValueMode};

    struct NoClasses;

    impl TypeLookup for NoClasses {
        fn constructors(&self, _type_ref: &TypeRef) -> Vec<CallCandidate> {
            Vec::new()
        }
    }

    fn user() -> CallCandidate {
        CallCandidate {
            name: "User".to_string(),
            parameters: vec![
                ParameterDescriptor::new("name", "String", TypeClass::CharSequence),
                ParameterDescriptor::new("age", "Int", TypeClass::Integral),
            ],
            is_constructor: true,
            is_primary: true,
            origin: Origin::Kotlin,
        }
    }

    fn plan_for(candidate: &CallCandidate, policy: &FillPolicy) -> ArgumentPlan {
        let mut corpus = LoremCorpus::seeded(7);
        let mut synthesizer = Synthesizer::new(policy, &NoClasses, &mut corpus);
        let mut guard = RecursionGuard::new(policy.max_nesting_depth);
        let eligible = eligible_parameters(candidate, &[], policy, false);
        build_plan(&eligible, &mut synthesizer, &mut guard)
    }

    #[test]
    fn plan_follows_declaration_order() {
        let plan = plan_for(&user(), &FillPolicy::default());
        assert_eq!(plan.parameter_names(), vec!["name", "age"]);
        assert_eq!(plan.to_string(), "name = \"\", age = 0");
    }

    #[test]
    fn same_name_plan() {
        let policy = FillPolicy {
            value_mode: ValueMode::SameNameAsParameter,
            ..FillPolicy::default()
        };
        assert_eq!(plan_for(&user(), &policy).to_string(), "name = name, age = age");
    }

    #[test]
    fn one_entry_per_missing_parameter() {
        let mut candidate = user();
        candidate.parameters.push(ParameterDescriptor::new(
            "tags",
            "List<String>",
            TypeClass::List,
        ));
        let plan = plan_for(&candidate, &FillPolicy::default());
        assert_eq!(plan.len(), 3);
    }
}
