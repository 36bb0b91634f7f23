//! Machine identifiers minted from human-entered labels.
//!
//! Labels may be written in any alphabet. [`normalize`] transliterates the
//! Cyrillic alphabet to Latin, then folds the result into `snake_case`
//! ASCII. The result is never empty: labels with nothing usable left fall
//! back to [`FALLBACK_IDENTIFIER`].

use std::collections::HashSet;

/// Identifier returned when a label normalizes to nothing.
pub const FALLBACK_IDENTIFIER: &str = "variable";

/// Convert a human-readable label into a `snake_case` ASCII identifier.
///
/// Whitespace and hyphens become underscores, every character outside
/// `[A-Za-z0-9_]` is dropped, runs of underscores collapse to one, and
/// leading/trailing underscores are trimmed.
///
/// ```
/// use mailform_core::identifier::normalize;
///
/// assert_eq!(normalize("Имя Клиента"), "imya_klienta");
/// assert_eq!(normalize("A  B--C"), "a_b_c");
/// assert_eq!(normalize(""), "variable");
/// ```
pub fn normalize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_separator = false;

    for ch in label.chars() {
        match transliterate(ch) {
            Some(latin) => {
                for c in latin.chars() {
                    push_folded(&mut out, c, &mut pending_separator);
                }
            }
            None => push_folded(&mut out, ch, &mut pending_separator),
        }
    }

    if out.is_empty() {
        FALLBACK_IDENTIFIER.to_string()
    } else {
        out
    }
}

fn push_folded(out: &mut String, c: char, pending_separator: &mut bool) {
    if c.is_whitespace() || c == '-' || c == '_' {
        *pending_separator = true;
    } else if c.is_ascii_alphanumeric() {
        // Separators before the first kept character are leading underscores.
        if *pending_separator && !out.is_empty() {
            out.push('_');
        }
        *pending_separator = false;
        out.push(c.to_ascii_lowercase());
    }
}

/// Latin spelling for a Cyrillic letter, `None` for anything else.
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a", 'б' => "b", 'в' => "v", 'г' => "g", 'д' => "d", 'е' => "e", 'ё' => "yo",
        'ж' => "zh", 'з' => "z", 'и' => "i", 'й' => "y", 'к' => "k", 'л' => "l", 'м' => "m",
        'н' => "n", 'о' => "o", 'п' => "p", 'р' => "r", 'с' => "s", 'т' => "t", 'у' => "u",
        'ф' => "f", 'х' => "h", 'ц' => "ts", 'ч' => "ch", 'ш' => "sh", 'щ' => "shch",
        'ъ' => "", 'ы' => "y", 'ь' => "", 'э' => "e", 'ю' => "yu", 'я' => "ya",
        'А' => "A", 'Б' => "B", 'В' => "V", 'Г' => "G", 'Д' => "D", 'Е' => "E", 'Ё' => "Yo",
        'Ж' => "Zh", 'З' => "Z", 'И' => "I", 'Й' => "Y", 'К' => "K", 'Л' => "L", 'М' => "M",
        'Н' => "N", 'О' => "O", 'П' => "P", 'Р' => "R", 'С' => "S", 'Т' => "T", 'У' => "U",
        'Ф' => "F", 'Х' => "H", 'Ц' => "Ts", 'Ч' => "Ch", 'Ш' => "Sh", 'Щ' => "Shch",
        'Ъ' => "", 'Ы' => "Y", 'Ь' => "", 'Э' => "E", 'Ю' => "Yu", 'Я' => "Ya",
        _ => return None,
    };
    Some(latin)
}

/// Check that an identifier is non-empty and uses only `[A-Za-z0-9_]`
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Clean up a manually typed identifier: every character outside
/// `[A-Za-z0-9_]` is replaced with an underscore.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Identifiers already handed out during one derivation pass.
///
/// Claiming a taken identifier yields the next free numeric suffix
/// (`name_2`, `name_3`, ...).
#[derive(Debug, Clone, Default)]
pub struct IdentifierLedger {
    taken: HashSet<String>,
}

impl IdentifierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an identifier as taken. Returns false if it already was.
    pub fn reserve(&mut self, identifier: &str) -> bool {
        self.taken.insert(identifier.to_string())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.taken.contains(identifier)
    }

    /// Take `base`, or the first free `base_N` (N >= 2) if `base` is taken.
    pub fn claim(&mut self, base: &str) -> String {
        if self.reserve(base) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.reserve(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Monotonic counter for ids minted during an editing session.
#[derive(Debug, Clone, Default)]
pub struct IdCounter {
    last: u64,
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after ids that already exist (e.g. when reopening a layout)
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cyrillic() {
        assert_eq!(normalize("Имя Клиента"), "imya_klienta");
        assert_eq!(normalize("Email Адрес"), "email_adres");
        assert_eq!(normalize("Телефон"), "telefon");
        assert_eq!(normalize("Щука"), "shchuka");
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize("A  B--C"), "a_b_c");
        assert_eq!(normalize("  leading and trailing  "), "leading_and_trailing");
        assert_eq!(normalize("__already__snake__"), "already_snake");
        assert_eq!(normalize("a ! b"), "a_b");
        assert_eq!(normalize("a!b"), "ab");
    }

    #[test]
    fn test_normalize_fallback() {
        assert_eq!(normalize(""), FALLBACK_IDENTIFIER);
        assert_eq!(normalize("   "), FALLBACK_IDENTIFIER);
        assert_eq!(normalize("!!!"), FALLBACK_IDENTIFIER);
        assert_eq!(normalize("ъь"), FALLBACK_IDENTIFIER);
        assert_eq!(normalize("日本"), FALLBACK_IDENTIFIER);
    }

    #[test]
    fn test_normalize_output_alphabet() {
        let labels = [
            "Order #42 — total",
            "Ёлка\tи\nёж",
            "Crème brûlée",
            "x-y_z 1",
            "🙂 smile",
        ];
        for label in labels {
            let first = normalize(label);
            assert_eq!(first, normalize(label), "not deterministic for {:?}", label);
            assert!(!first.is_empty());
            assert!(
                first
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "unexpected characters in {:?}",
                first
            );
            assert!(!first.starts_with('_') && !first.ends_with('_'));
            assert!(!first.contains("__"));
        }
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("client_name"));
        assert!(is_valid_identifier("Field2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("client name"));
        assert!(!is_valid_identifier("имя"));
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("client name"), "client_name");
        assert_eq!(sanitize_identifier("a-b.c"), "a_b_c");
        assert_eq!(sanitize_identifier("ok_1"), "ok_1");
    }

    #[test]
    fn test_ledger_claims_suffixes() {
        let mut ledger = IdentifierLedger::new();
        assert_eq!(ledger.claim("name"), "name");
        assert_eq!(ledger.claim("name"), "name_2");
        assert_eq!(ledger.claim("name"), "name_3");
        assert!(ledger.reserve("other"));
        assert!(!ledger.reserve("other"));
        assert_eq!(ledger.claim("other"), "other_2");
    }

    #[test]
    fn test_id_counter_is_monotonic() {
        let mut counter = IdCounter::new();
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
        let mut resumed = IdCounter::starting_after(10);
        assert_eq!(resumed.next(), 11);
    }
}
