//! Per-module rule table: forbidden language features, required concepts,
//! and the human-readable list of checks applied.
//!
//! Read-only lookup data. Forbidden features are either always forbidden or
//! forbidden until the module that introduces them.

use crate::models::context::ModuleTag;
use crate::models::Severity;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// One forbidden-feature pattern. `pattern` is a regex; when it does not
/// compile the scanner falls back to plain substring search.
pub struct FeatureRule {
    pub name: String,
    pub pattern: String,
    pub description: String,
    pub severity: Severity,
}

struct ForbiddenEntry {
    name: &'static str,
    pattern: &'static str,
    description: &'static str,
    severity: Severity,
    unlocked_by: Option<ModuleTag>,
}

const FORBIDDEN: &[ForbiddenEntry] = &[
    ForbiddenEntry {
        name: "goto",
        pattern: r"\bgoto\b",
        description: "goto breaks structured control flow; use loops, break, or early return",
        severity: Severity::Major,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "gets",
        pattern: r"\bgets\s*\(",
        description: "gets() cannot bound its input and was removed in C11; use fgets()",
        severity: Severity::Critical,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "system",
        pattern: r"\bsystem\s*\(",
        description: "system() hands work to the shell; implement the behavior in C",
        severity: Severity::Critical,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "inline-assembly",
        pattern: r"\b(asm|__asm__)\b",
        description: "inline assembly is not portable C",
        severity: Severity::Critical,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "setjmp-longjmp",
        pattern: r"\b(setjmp|longjmp)\s*\(",
        description: "non-local jumps bypass normal control flow and cleanup",
        severity: Severity::Major,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "unbounded-string-function",
        pattern: r"\b(strcpy|strcat|sprintf)\s*\(",
        description: "unbounded string functions overflow easily; prefer strncpy, strncat, snprintf",
        severity: Severity::Minor,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "pragma",
        pattern: r"^\s*#\s*pragma\b",
        description: "compiler-specific pragmas are not portable",
        severity: Severity::Minor,
        unlocked_by: None,
    },
    ForbiddenEntry {
        name: "dynamic-allocation",
        pattern: r"\b(malloc|calloc|realloc|free)\s*\(",
        description: "dynamic memory is introduced in the memory module; use automatic storage",
        severity: Severity::Major,
        unlocked_by: Some(ModuleTag::Memory),
    },
    ForbiddenEntry {
        name: "struct",
        pattern: r"\bstruct\b",
        description: "structures are introduced in the structures module",
        severity: Severity::Major,
        unlocked_by: Some(ModuleTag::Structures),
    },
    ForbiddenEntry {
        name: "file-io",
        pattern: r"\b(fopen|fclose|fread|fwrite|fprintf|fscanf|fgets)\s*\(",
        description: "file streams are introduced in the files module",
        severity: Severity::Major,
        unlocked_by: Some(ModuleTag::Files),
    },
];

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
/// A learning objective the submission is expected to exercise.
pub struct Concept {
    pub name: &'static str,
    pub pattern: &'static str,
    pub description: &'static str,
}

const BASICS_CONCEPTS: &[Concept] = &[
    Concept {
        name: "main-function",
        pattern: r"\bint\s+main\s*\(",
        description: "a standard int main entry point",
    },
    Concept {
        name: "conditional",
        pattern: r"\b(if|switch)\b",
        description: "branching with if or switch",
    },
    Concept {
        name: "loop",
        pattern: r"\b(for|while|do)\b",
        description: "iteration with for, while, or do",
    },
];

const POINTERS_CONCEPTS: &[Concept] = &[
    Concept {
        name: "pointer-declaration",
        pattern: r"\b\w+\s*\*+\s*\w+\s*[=;,)\[]",
        description: "declaring a pointer variable or parameter",
    },
    Concept {
        name: "address-of",
        pattern: r"[=(,]\s*&\s*\w+",
        description: "taking the address of an object with &",
    },
];

const MEMORY_CONCEPTS: &[Concept] = &[
    Concept {
        name: "allocation",
        pattern: r"\b(malloc|calloc|realloc)\s*\(",
        description: "allocating heap memory",
    },
    Concept {
        name: "release",
        pattern: r"\bfree\s*\(",
        description: "releasing heap memory with free",
    },
];

const STRUCTURES_CONCEPTS: &[Concept] = &[
    Concept {
        name: "struct-definition",
        pattern: r"\bstruct\s+\w+\s*\{",
        description: "defining a structure type",
    },
    Concept {
        name: "typedef",
        pattern: r"\btypedef\b",
        description: "naming a type with typedef",
    },
];

const FILES_CONCEPTS: &[Concept] = &[
    Concept {
        name: "open-stream",
        pattern: r"\bfopen\s*\(",
        description: "opening a file stream",
    },
    Concept {
        name: "close-stream",
        pattern: r"\bfclose\s*\(",
        description: "closing a file stream",
    },
];

const CAPSTONE_CONCEPTS: &[Concept] = &[
    Concept {
        name: "local-header",
        pattern: r#"#\s*include\s*""#,
        description: "splitting the program into headers and translation units",
    },
    Concept {
        name: "internal-linkage",
        pattern: r"\bstatic\b",
        description: "hiding helpers with static",
    },
];

const BASE_CHECKS: &[&str] = &[
    "compiles without errors under the configured language revision",
    "uses no always-forbidden feature (goto, gets, system, inline assembly, setjmp/longjmp)",
];

/// Lookup view of the rule table for one module.
#[derive(Serialize, Debug, Clone)]
pub struct ModuleRules {
    pub module: ModuleTag,
    pub required_concepts: Vec<&'static str>,
    pub forbidden_features: Vec<&'static str>,
    pub checks: Vec<String>,
}

/// Forbidden-feature rules in table order for `module`.
pub fn forbidden_features(module: ModuleTag) -> Vec<FeatureRule> {
    FORBIDDEN
        .iter()
        .filter(|e| e.unlocked_by.map_or(true, |m| module < m))
        .map(|e| FeatureRule {
            name: e.name.to_string(),
            pattern: e.pattern.to_string(),
            description: e.description.to_string(),
            severity: e.severity,
        })
        .collect()
}

pub fn required_concepts(module: ModuleTag) -> &'static [Concept] {
    match module {
        ModuleTag::Basics => BASICS_CONCEPTS,
        ModuleTag::Pointers => POINTERS_CONCEPTS,
        ModuleTag::Memory => MEMORY_CONCEPTS,
        ModuleTag::Structures => STRUCTURES_CONCEPTS,
        ModuleTag::Files => FILES_CONCEPTS,
        ModuleTag::Capstone => CAPSTONE_CONCEPTS,
    }
}

pub fn module_rules(module: ModuleTag) -> ModuleRules {
    let mut checks: Vec<String> = BASE_CHECKS.iter().map(|s| s.to_string()).collect();
    if module >= ModuleTag::Memory {
        checks.push("frees every allocation and performs no invalid memory access".to_string());
    }
    for e in FORBIDDEN.iter() {
        if let Some(m) = e.unlocked_by {
            if module < m {
                checks.push(format!("does not use {} before the {} module", e.name, m));
            }
        }
    }
    ModuleRules {
        module,
        required_concepts: required_concepts(module).iter().map(|c| c.name).collect(),
        forbidden_features: FORBIDDEN
            .iter()
            .filter(|e| e.unlocked_by.map_or(true, |m| module < m))
            .map(|e| e.name)
            .collect(),
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_feature_unlocking_follows_module_order() {
        let basics = forbidden_features(ModuleTag::Basics);
        assert!(basics.iter().any(|r| r.name == "dynamic-allocation"));
        assert!(basics.iter().any(|r| r.name == "file-io"));
        let memory = forbidden_features(ModuleTag::Memory);
        assert!(memory.iter().all(|r| r.name != "dynamic-allocation"));
        assert!(memory.iter().any(|r| r.name == "struct"));
        let capstone = forbidden_features(ModuleTag::Capstone);
        assert!(capstone.iter().any(|r| r.name == "goto"));
        assert!(capstone.iter().all(|r| r.name != "file-io"));
    }

    #[test]
    fn test_all_table_patterns_compile() {
        for m in ModuleTag::ALL {
            for r in forbidden_features(m) {
                assert!(Regex::new(&r.pattern).is_ok(), "{}", r.name);
            }
            for c in required_concepts(m) {
                assert!(Regex::new(c.pattern).is_ok(), "{}", c.name);
            }
        }
    }

    #[test]
    fn test_module_rules_view() {
        let r = module_rules(ModuleTag::Memory);
        assert_eq!(r.required_concepts, vec!["allocation", "release"]);
        assert!(r.forbidden_features.contains(&"goto"));
        assert!(r.checks.iter().any(|c| c.contains("frees every allocation")));
        assert!(!module_rules(ModuleTag::Basics)
            .checks
            .iter()
            .any(|c| c.contains("frees every allocation")));
    }
}
