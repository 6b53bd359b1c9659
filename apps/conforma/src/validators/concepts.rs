//! Checks that the submission exercises the module's learning objectives.

use super::{Priority, Validator};
use crate::error::ValidationError;
use crate::models::context::{Context, ModuleTag};
use crate::models::{Issue, Suggestion, ValidationResult};
use crate::rules::{self, Concept};
use crate::scan::{LineSanitizer, Matcher};
use std::fs;
use tracing::debug;

const NAME: &str = "required-concepts";

pub struct ConceptValidator {
    concepts: Vec<(Concept, Matcher)>,
}

impl ConceptValidator {
    pub fn new(concepts: &[Concept]) -> Self {
        ConceptValidator {
            concepts: concepts
                .iter()
                .map(|c| (*c, Matcher::compile(c.pattern)))
                .collect(),
        }
    }

    pub fn for_module(module: ModuleTag) -> Self {
        Self::new(rules::required_concepts(module))
    }

    /// Mark every concept found in `text`.
    fn mark_found(&self, text: &str, found: &mut [bool]) {
        let mut sanitizer = LineSanitizer::new();
        for raw in text.lines() {
            let Some(line) = sanitizer.sanitize(raw) else {
                continue;
            };
            for (slot, (_, matcher)) in found.iter_mut().zip(&self.concepts) {
                if !*slot && matcher.is_match(&line) {
                    *slot = true;
                }
            }
        }
    }
}

impl Validator for ConceptValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn validate(&self, ctx: &Context) -> Result<ValidationResult, ValidationError> {
        let mut res = ValidationResult::new(NAME);
        let mut found = vec![false; self.concepts.len()];
        // Unreadable files are reported by the feature scan.
        for path in ctx.all_files() {
            if let Ok(text) = fs::read_to_string(path) {
                self.mark_found(&text, &mut found);
            }
        }
        for ((concept, _), hit) in self.concepts.iter().zip(&found) {
            if !hit {
                res.add_issue(
                    Issue::minor(
                        "MISSING_CONCEPT",
                        format!("expected {} ({}) for module {}", concept.description, concept.name, ctx.module),
                    )
                    .suggest(Suggestion::new(
                        format!("Use {} somewhere in the submission.", concept.description),
                        format!("Utilisez {} dans la soumission.", concept.name),
                    )),
                );
            }
        }
        let present = found.iter().filter(|f| **f).count();
        debug!(present, expected = found.len(), "checked required concepts");
        res.set_metric("expected", found.len());
        res.set_metric("present", present);
        Ok(res)
    }
}
