// Tag canonicalization helpers
// Submitted fields arrive as free-form strings; every tag is trimmed and
// uppercased before validation, and comparisons that must survive accent
// variants go through fold_accents.

/// Trim and uppercase a submitted tag.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Trim and uppercase an optional tag; blank input becomes None.
pub fn normalize_opt(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(s) => {
            let tag = normalize_tag(s);
            if tag.is_empty() {
                None
            } else {
                Some(tag)
            }
        }
        None => None,
    }
}

/// Replace accented Latin letters with their base letter.
///
/// Covers the precomposed characters that show up in the organization's data
/// (Spanish accents plus Ñ/ñ). Anything else passes through unchanged.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'Á' | 'À' | 'Â' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ñ' => 'N',
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Case- and accent-insensitive substring check (export filters).
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold_accents(&haystack.to_lowercase()).contains(&fold_accents(&needle.to_lowercase()))
}

// ============================================================================
// TESTS
// ============================================================================
