//! Compiler diagnostic parsing (GCC/Clang `file:line[:col]: kind: message`).
//!
//! Parsing is line-oriented and lenient: lines without a recoverable file and
//! positive line number are skipped, never treated as hard failures.

use crate::models::diagnostic::Diagnostic;
use crate::models::Suggestion;

const KINDS: &[&str] = &["fatal error", "error", "warning", "note"];
const INCLUDE_PREFIXES: &[&str] = &["In file included from ", "from "];

/// Parse every recognizable diagnostic in `output`.
pub fn parse_output(output: &str) -> Vec<Diagnostic> {
    output.lines().filter_map(parse_line).collect()
}

/// Parse a single line, or `None` for continuation/malformed lines.
pub fn parse_line(line: &str) -> Option<Diagnostic> {
    let mut line = line.trim();
    if line.is_empty() {
        return None;
    }
    for p in INCLUDE_PREFIXES {
        if let Some(rest) = line.strip_prefix(p) {
            line = rest;
        }
    }

    let colon = first_location_colon(line)?;
    let file = line[..colon].trim();
    if file.is_empty() || file.contains(char::is_whitespace) {
        return None;
    }

    let rest = &line[colon + 1..];
    let mut parts = rest.splitn(3, ':');
    let line_no: u32 = parts.next()?.trim().parse().ok().filter(|n| *n > 0)?;
    let second = parts.next();
    let third = parts.next();
    let (column, remainder) = match second {
        Some(s) if is_number(s) => (s.trim().parse().ok(), third.unwrap_or("").to_string()),
        Some(s) => {
            let mut r = s.to_string();
            if let Some(t) = third {
                r.push(':');
                r.push_str(t);
            }
            (None, r)
        }
        None => (None, String::new()),
    };

    let (category, message) = split_kind(remainder.trim());
    let suggestion = suggest(&message);
    Some(Diagnostic {
        file: file.to_string(),
        line: line_no,
        column,
        category,
        message,
        suggestion,
    })
}

/// Index of the colon ending the file segment; skips a drive-letter colon.
fn first_location_colon(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let start = if bytes.len() > 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
    {
        2
    } else {
        0
    };
    line[start..].find(':').map(|i| i + start)
}

fn is_number(s: &str) -> bool {
    let t = s.trim();
    !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit())
}

fn split_kind(remainder: &str) -> (String, String) {
    for kind in KINDS {
        if let Some(after) = remainder.strip_prefix(kind) {
            if let Some(msg) = after.strip_prefix(':') {
                return (kind.to_string(), msg.trim().to_string());
            }
        }
    }
    ("note".to_string(), remainder.to_string())
}

struct SuggestionRule {
    needles: &'static [&'static str],
    text: &'static str,
    text_local: &'static str,
}

const SUGGESTIONS: &[SuggestionRule] = &[
    SuggestionRule {
        needles: &["undeclared", "use of undeclared identifier"],
        text: "Declare the identifier before its first use, or include the header that declares it.",
        text_local: "Déclarez l'identifiant avant sa première utilisation, ou incluez l'en-tête qui le déclare.",
    },
    SuggestionRule {
        needles: &["implicit declaration of function"],
        text: "Add a prototype or include the header declaring the function before calling it.",
        text_local: "Ajoutez un prototype ou incluez l'en-tête déclarant la fonction avant de l'appeler.",
    },
    SuggestionRule {
        needles: &["only allowed in c99", "c99 mode", "c11", "iso c90 forbids", "c23 extension", "is a c2x extension"],
        text: "This construct needs a later language revision; raise -std or rewrite it in the configured revision.",
        text_local: "Cette construction exige une révision plus récente du langage ; augmentez -std ou réécrivez-la.",
    },
    SuggestionRule {
        needles: &["expected ';'", "expected ')'", "expected '}'", "expected expression", "expected identifier"],
        text: "A token is missing near this location; check for an unbalanced bracket or a missing semicolon on this or the previous line.",
        text_local: "Un symbole manque à cet endroit ; vérifiez les parenthèses et les points-virgules sur cette ligne ou la précédente.",
    },
    SuggestionRule {
        needles: &["no such file or directory", "file not found"],
        text: "Check the #include path and spelling; local headers use quotes and must be next to the source or passed with -I.",
        text_local: "Vérifiez le chemin et l'orthographe de l'#include ; les en-têtes locaux utilisent des guillemets.",
    },
    SuggestionRule {
        needles: &["unused variable", "unused parameter", "defined but not used"],
        text: "Remove the unused declaration, or cast it to (void) when it is intentionally unused.",
        text_local: "Supprimez la déclaration inutilisée, ou convertissez-la en (void) si c'est voulu.",
    },
    SuggestionRule {
        needles: &["makes pointer from integer", "makes integer from pointer", "incompatible pointer type", "incompatible integer to pointer"],
        text: "The pointer and integer types do not match; check the declared types and use & or * where an address or value is meant.",
        text_local: "Les types pointeur et entier ne correspondent pas ; vérifiez les déclarations et l'usage de & et *.",
    },
    SuggestionRule {
        needles: &["control reaches end of non-void function", "non-void function does not return"],
        text: "Return a value on every path of a function whose return type is not void.",
        text_local: "Retournez une valeur sur chaque chemin d'une fonction dont le type de retour n'est pas void.",
    },
    SuggestionRule {
        needles: &["format '%", "format specifies type", "format string"],
        text: "Match each printf/scanf conversion specifier to the type of its argument.",
        text_local: "Faites correspondre chaque spécificateur de format au type de son argument.",
    },
    SuggestionRule {
        needles: &["conflicting types", "redefinition of", "previous definition"],
        text: "The same name is declared twice with different meanings; keep one declaration in a header and include it.",
        text_local: "Le même nom est déclaré deux fois ; gardez une seule déclaration dans un en-tête.",
    },
    SuggestionRule {
        needles: &["undefined reference", "symbol(s) not found"],
        text: "A function is declared but never defined or linked; add its definition or the missing source file.",
        text_local: "Une fonction est déclarée mais jamais définie ; ajoutez sa définition ou le fichier source manquant.",
    },
    SuggestionRule {
        needles: &["uninitialized", "may be used uninitialized"],
        text: "Initialize the variable before reading it.",
        text_local: "Initialisez la variable avant de la lire.",
    },
];

const GENERIC_TEXT: &str =
    "Review the code at the reported location; the compiler message names the construct it rejected.";
const GENERIC_TEXT_LOCAL: &str =
    "Examinez le code à l'emplacement indiqué ; le message du compilateur nomme la construction refusée.";

/// First matching canned suggestion for a diagnostic message.
pub fn suggest(message: &str) -> Suggestion {
    let lower = message.to_lowercase();
    SUGGESTIONS
        .iter()
        .find(|r| r.needles.iter().any(|n| lower.contains(n)))
        .map(|r| Suggestion::new(r.text, r.text_local))
        .unwrap_or_else(|| Suggestion::new(GENERIC_TEXT, GENERIC_TEXT_LOCAL))
}
