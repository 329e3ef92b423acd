//! Parameter eligibility.
//!
//! Decides which parameters of the chosen candidate still need an
//! argument.  The rules are applied per parameter, in declaration order:
//!
//! 1. a function-typed last parameter is skipped when a trailing lambda
//!    already supplies it;
//! 2. a slot occupied by a positional argument is skipped;
//! 3. a parameter already passed by name is skipped;
//! 4. vararg parameters are never filled;
//! 5. parameters with a default value are skipped when the policy says so.

use crate::types::{CallCandidate, ExistingArgument, FillPolicy, ParameterDescriptor};

pub fn eligible_parameters<'a>(
    candidate: &'a CallCandidate,
    existing: &[ExistingArgument],
    policy: &FillPolicy,
    trailing_lambda_present: bool,
) -> Vec<&'a ParameterDescriptor> {
    let named: Vec<&str> = existing.iter().filter_map(|a| a.name.as_deref()).collect();
    let last_index = candidate.parameters.len().saturating_sub(1);

    candidate
        .parameters
        .iter()
        .enumerate()
        .filter(|(index, parameter)| {
            if trailing_lambda_present && *index == last_index && parameter.is_function_type() {
                return false;
            }
            if existing.get(*index).is_some_and(|arg| !arg.is_named()) {
                return false;
            }
            if named.contains(&parameter.name.as_str()) {
                return false;
            }
            if parameter.is_vararg {
                return false;
            }
            !(policy.skip_defaulted_parameters && parameter.has_default_value)
        })
        .map(|(_, parameter)| parameter)
        .collect()
}
