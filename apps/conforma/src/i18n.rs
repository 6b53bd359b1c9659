//! Localized (French) fallbacks for issue messages.
//!
//! Every issue carries an English message and a French one. When a caller
//! does not supply the French text, it is synthesized from the category with
//! the English message kept verbatim after the prefix.

const CATEGORY_PREFIXES: &[(&str, &str)] = &[
    ("COMPILATION_ERROR", "Erreur de compilation"),
    ("COMPILATION_WARNING", "Avertissement du compilateur"),
    ("COMPILATION_FAILED", "La compilation a échoué"),
    ("COMPILER_UNAVAILABLE", "Compilateur introuvable"),
    ("NO_SOURCE_FILES", "Aucun fichier source"),
    ("MEMORY_LEAK", "Fuite de mémoire"),
    ("MEMORY_ERROR", "Erreur mémoire"),
    ("MEMORY_TOOL_ERROR", "Échec de l'outil d'analyse mémoire"),
    ("MEMORY_TOOL_UNAVAILABLE", "Aucun outil d'analyse mémoire disponible"),
    ("MEMORY_ANALYSIS_SKIPPED", "Analyse mémoire ignorée"),
    ("FORBIDDEN_FEATURE", "Fonctionnalité interdite"),
    ("MISSING_CONCEPT", "Notion requise absente"),
    ("FILE_READ_ERROR", "Fichier illisible"),
    ("INVALID_CONTEXT", "Contexte de validation invalide"),
    ("NO_VALIDATORS", "Aucun validateur enregistré"),
    ("VALIDATOR_ERROR", "Erreur interne du validateur"),
    ("VALIDATOR_THREAD_ERROR", "Erreur d'exécution parallèle du validateur"),
];

/// French prefix for a known category.
pub fn category_label(category: &str) -> Option<&'static str> {
    CATEGORY_PREFIXES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, fr)| *fr)
}

/// Build the localized message for `category`, or `None` when the category
/// has no localized label.
pub fn synthesize(category: &str, message: &str) -> Option<String> {
    category_label(category).map(|label| format!("{} : {}", label, message))
}
