//! Validator that runs child validators and merges their results.

use super::{failure_issue, run_guarded, Priority, Validator};
use crate::error::ValidationError;
use crate::models::context::Context;
use crate::models::ValidationResult;
use tracing::{debug, warn};

pub struct CompositeValidator {
    name: String,
    priority: Priority,
    children: Vec<Box<dyn Validator>>,
}

impl CompositeValidator {
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        CompositeValidator {
            name: name.into(),
            priority,
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: Box<dyn Validator>) {
        self.children.push(child);
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    /// Children run in descending priority, insertion order breaking ties.
    fn validate(&self, ctx: &Context) -> Result<ValidationResult, ValidationError> {
        let mut res = ValidationResult::new(self.name.clone());
        let mut order: Vec<&dyn Validator> = self.children.iter().map(|c| c.as_ref()).collect();
        order.sort_by_key(|c| std::cmp::Reverse(c.priority()));
        for child in order {
            debug!(composite = %self.name, child = child.name(), "running child validator");
            match run_guarded(child, ctx) {
                Ok(r) => {
                    if !r.is_valid() {
                        res.mark_invalid();
                    }
                    res.absorb(child.name(), r);
                }
                Err(msg) => {
                    warn!(composite = %self.name, child = child.name(), error = %msg, "child validator failed");
                    res.add_issue(failure_issue("VALIDATOR_ERROR", child.name(), &msg));
                }
            }
        }
        res.set_metric("children", self.children.len());
        Ok(res)
    }
}
