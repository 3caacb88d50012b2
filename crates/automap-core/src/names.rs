//! Name rules shared by every parser family
//!
//! Both families must spell the same definition the same way, so the
//! qualification, folding and mangling rules live here rather than in
//! each parser.

use crate::SymbolKind;

/// Join a namespace and a short name into a fully qualified name
///
/// Leading backslashes are dropped; an empty or missing namespace leaves
/// the name unqualified.
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    let name = name.trim_start_matches('\\');
    match namespace.map(|ns| ns.trim_matches('\\')) {
        Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
        _ => name.to_string(),
    }
}

/// The key a name is stored under for the given kind
///
/// Class names are folded to lower case; PHP only folds ASCII letters.
pub fn canonical_key(kind: SymbolKind, name: &str) -> String {
    let name = name.trim_start_matches('\\');
    if kind.is_case_insensitive() {
        name.to_ascii_lowercase()
    } else {
        name.to_string()
    }
}

/// Ordered lookup candidates for `name`, optionally under `prefix`
///
/// The order is fixed: folded form with the prefix, original form with the
/// prefix, then the bare name. Each candidate is already canonical for
/// `kind` and duplicates are removed, so callers probe the map once per
/// entry and take the first hit.
pub fn normalization_candidates(kind: SymbolKind, prefix: Option<&str>, name: &str) -> Vec<String> {
    let qualified = match prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("{}\\{}", prefix.trim_matches('\\'), name.trim_start_matches('\\'))
        }
        _ => name.trim_start_matches('\\').to_string(),
    };

    let mut candidates: Vec<String> = Vec::with_capacity(3);
    for candidate in [qualified.to_ascii_lowercase(), qualified, name.to_string()] {
        let key = canonical_key(kind, &candidate);
        if !candidates.contains(&key) {
            candidates.push(key);
        }
    }
    candidates
}

/// Mangle an XHP element name (`:ui:fancy-button`) into its class name
pub fn xhp_class_name(element: &str) -> String {
    let element = element.trim_start_matches(':');
    format!("xhp_{}", element.replace(':', "__").replace('-', "_"))
}

/// Value of a PHP string literal used as a symbol name
///
/// Returns `None` unless `literal` is a single- or double-quoted string
/// without interpolation.
pub fn unquote_literal(literal: &str) -> Option<String> {
    let literal = literal.trim();
    let bytes = literal.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let quote = bytes[0];
    if (quote != b'\'' && quote != b'"') || bytes[bytes.len() - 1] != quote {
        return None;
    }

    let body = &literal[1..literal.len() - 1];
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek().copied() {
                Some('\\') => {
                    value.push('\\');
                    chars.next();
                }
                Some(next) if next == quote as char => {
                    value.push(next);
                    chars.next();
                }
                Some('$') if quote == b'"' => {
                    value.push('$');
                    chars.next();
                }
                _ => value.push('\\'),
            },
            '$' if quote == b'"' => {
                if matches!(chars.peek(), Some(c) if c.is_ascii_alphabetic() || *c == '_' || *c == '{') {
                    return None;
                }
                value.push('$');
            }
            _ => value.push(ch),
        }
    }

    Some(value)
}
