//! Symbol name demangling.
//!
//! `demangle` is total: a name that matches no known scheme, or that a
//! decoder rejects, comes back unchanged.

use cpp_demangle::DemangleOptions;

/// Decode a linker-visible name into its human-readable qualified form.
///
/// Recognised schemes:
/// - Rust v0 (`_R...`) and legacy Rust (`_ZN...17h<hash>E`), hash omitted
/// - Itanium C++ (`_Z...`, or `__Z...` as written in Mach-O symbol tables)
pub fn demangle(raw: &str) -> String {
    if raw.starts_with("_R") || is_rust_legacy(raw) {
        if let Ok(d) = rustc_demangle::try_demangle(raw) {
            return format!("{d:#}");
        }
    }

    // Mach-O spells Itanium names with one extra leading underscore.
    let itanium = raw
        .strip_prefix('_')
        .filter(|s| s.starts_with("_Z"))
        .unwrap_or(raw);
    if itanium.starts_with("_Z") {
        if let Some(s) = demangle_itanium(itanium) {
            return s;
        }
    }

    raw.to_string()
}

fn demangle_itanium(raw: &str) -> Option<String> {
    let sym = cpp_demangle::Symbol::new(raw.as_bytes()).ok()?;
    let out = sym.demangle(&DemangleOptions::default()).ok()?;
    if out.is_empty() { None } else { Some(out) }
}

/// Legacy Rust symbols share the `_ZN` prefix with C++ but always end in a
/// 16-digit hash path component.
fn is_rust_legacy(raw: &str) -> bool {
    let Some(body) = raw.strip_prefix("_ZN").and_then(|s| s.strip_suffix('E')) else {
        return false;
    };
    let Some(hash) = body.get(body.len().saturating_sub(19)..) else {
        return false;
    };
    hash.len() == 19 && hash.starts_with("17h") && hash[3..].chars().all(|c| c.is_ascii_hexdigit())
}
