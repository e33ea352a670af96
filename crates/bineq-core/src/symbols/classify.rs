//! Pattern-based symbol classification.
//!
//! Classification is an ordered list of `(predicate, category)` rules where
//! the first matching rule wins. Order is part of the contract: constructor
//! and destructor manglings are special cases of class methods and must be
//! recognised before the generic `Method` bucket, and vtable/typeinfo data
//! symbols must be recognised before anything inspects their demangled
//! text as if it were a function.
//!
//! Every input maps to exactly one category; the final rule always matches.

use std::sync::LazyLock;

use regex::Regex;

use crate::symbols::model::SymbolCategory;

static DTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_ZN[A-Za-z0-9_]*D[012]Ev$").expect("destructor pattern"));

static CTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_ZN[A-Za-z0-9_]*C[123][EI]").expect("constructor pattern"));

static OPERATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\boperator\s*(?:[^\sA-Za-z0-9_]|new\b|delete\b)").expect("operator pattern")
});

const ANON_NS: &str = "(anonymous namespace)";

const VTABLE_PREFIX: &str = "_ZTV";
const TYPEINFO_PREFIX: &str = "_ZTI";
const TYPEINFO_NAME_PREFIX: &str = "_ZTS";

/// Result of classifying one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: SymbolCategory,
    pub owner_class: Option<String>,
}

/// Pre-computed views over a symbol name shared by all rules.
struct NameView<'a> {
    raw: &'a str,
    demangled: &'a str,
    demangled_ok: bool,
    has_params: bool,
    scope: Vec<&'a str>,
}

impl<'a> NameView<'a> {
    fn new(raw: &'a str, demangled: &'a str) -> Self {
        let sig = split_signature(demangled);
        Self {
            raw,
            demangled,
            demangled_ok: raw != demangled,
            has_params: sig.has_params,
            scope: split_scope(sig.qualified),
        }
    }

    fn is_scoped(&self) -> bool {
        self.scope.len() > 1
    }

    fn enclosing_scope(&self) -> Option<String> {
        if self.is_scoped() {
            Some(self.scope[..self.scope.len() - 1].join("::"))
        } else {
            None
        }
    }
}

struct Rule {
    category: SymbolCategory,
    matches: fn(&NameView<'_>) -> bool,
}

/// Ordered classification rules. First match wins.
const RULES: &[Rule] = &[
    Rule {
        category: SymbolCategory::Destructor,
        matches: is_destructor,
    },
    Rule {
        category: SymbolCategory::Constructor,
        matches: is_constructor,
    },
    Rule {
        category: SymbolCategory::Vtable,
        matches: is_vtable,
    },
    Rule {
        category: SymbolCategory::TypeInfoStruct,
        matches: is_typeinfo,
    },
    Rule {
        category: SymbolCategory::TypeInfoString,
        matches: is_typeinfo_name,
    },
    Rule {
        category: SymbolCategory::Operator,
        matches: is_operator,
    },
    Rule {
        category: SymbolCategory::Template,
        matches: is_template,
    },
    Rule {
        category: SymbolCategory::GlobalFunction,
        matches: is_free_function,
    },
    Rule {
        category: SymbolCategory::StaticMember,
        matches: is_scoped_data,
    },
    Rule {
        category: SymbolCategory::Method,
        matches: is_scoped,
    },
    Rule {
        category: SymbolCategory::Other,
        matches: always,
    },
];

/// Assign a category and, where the category implies class membership,
/// the owning class.
///
/// A pure function of `(raw, demangled)`.
pub fn classify(raw: &str, demangled: &str) -> Classification {
    let view = NameView::new(raw, demangled);

    let category = RULES
        .iter()
        .find(|rule| (rule.matches)(&view))
        .map(|rule| rule.category)
        .unwrap_or(SymbolCategory::Other);

    let owner_class = owner_for(category, &view);

    Classification {
        category,
        owner_class,
    }
}

fn owner_for(category: SymbolCategory, view: &NameView<'_>) -> Option<String> {
    match category {
        SymbolCategory::Vtable => type_owner(view, VTABLE_PREFIX, "vtable for "),
        SymbolCategory::TypeInfoStruct => type_owner(view, TYPEINFO_PREFIX, "typeinfo for "),
        SymbolCategory::TypeInfoString => {
            type_owner(view, TYPEINFO_NAME_PREFIX, "typeinfo name for ")
        }
        SymbolCategory::Constructor | SymbolCategory::Destructor if !view.demangled_ok => {
            decode_qualified(&view.raw[3..])
        }
        SymbolCategory::Constructor
        | SymbolCategory::Destructor
        | SymbolCategory::Operator
        | SymbolCategory::StaticMember
        | SymbolCategory::Method => view.enclosing_scope(),
        SymbolCategory::Template | SymbolCategory::GlobalFunction | SymbolCategory::Other => None,
    }
}

fn is_vtable(view: &NameView<'_>) -> bool {
    view.raw.starts_with(VTABLE_PREFIX)
}

fn is_typeinfo(view: &NameView<'_>) -> bool {
    view.raw.starts_with(TYPEINFO_PREFIX)
}

fn is_typeinfo_name(view: &NameView<'_>) -> bool {
    view.raw.starts_with(TYPEINFO_NAME_PREFIX)
}

fn is_operator(view: &NameView<'_>) -> bool {
    OPERATOR_RE.is_match(view.demangled)
}

fn is_template(view: &NameView<'_>) -> bool {
    view.demangled.contains('<') && view.demangled.contains('>')
}

fn is_free_function(view: &NameView<'_>) -> bool {
    view.has_params && !view.is_scoped()
}

fn is_scoped_data(view: &NameView<'_>) -> bool {
    !view.has_params && view.is_scoped()
}

fn is_scoped(view: &NameView<'_>) -> bool {
    view.is_scoped()
}

fn always(_: &NameView<'_>) -> bool {
    true
}

fn is_destructor(view: &NameView<'_>) -> bool {
    if !DTOR_RE.is_match(view.raw) {
        return false;
    }
    if !view.demangled_ok {
        return true;
    }
    match view.scope.as_slice() {
        [.., class, last] => last
            .strip_prefix('~')
            .is_some_and(|name| name == base_name(class)),
        _ => false,
    }
}

fn is_constructor(view: &NameView<'_>) -> bool {
    if !CTOR_RE.is_match(view.raw) {
        return false;
    }
    if !view.demangled_ok {
        return true;
    }
    match view.scope.as_slice() {
        [.., class, last] => base_name(last) == base_name(class),
        _ => false,
    }
}

/// Strip template arguments: `Foo<int>` -> `Foo`.
fn base_name(component: &str) -> &str {
    component.split('<').next().unwrap_or(component).trim()
}

fn type_owner(view: &NameView<'_>, raw_prefix: &str, demangled_prefix: &str) -> Option<String> {
    if let Some(rest) = view.demangled.strip_prefix(demangled_prefix) {
        let rest = rest.trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
    }
    let suffix = view.raw.strip_prefix(raw_prefix)?;
    decode_qualified(suffix.strip_prefix('N').unwrap_or(suffix))
}

/// Decode a run of `<length><identifier>` source names, stopping at the
/// first byte that does not start another one.
fn decode_source_names(mut s: &str) -> Option<Vec<&str>> {
    let mut names = Vec::new();
    loop {
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            break;
        }
        let len: usize = s[..digits].parse().ok()?;
        let end = digits.checked_add(len)?;
        names.push(s.get(digits..end)?);
        s = &s[end..];
    }
    if names.is_empty() { None } else { Some(names) }
}

/// Qualified name spelled by the leading source names of an undemangled
/// nested name. Skips a CV qualifier (`K`).
fn decode_qualified(nested: &str) -> Option<String> {
    let nested = nested.strip_prefix('K').unwrap_or(nested);
    decode_source_names(nested).map(|names| names.join("::"))
}

pub(crate) struct Signature<'a> {
    pub qualified: &'a str,
    pub has_params: bool,
}

/// Split a demangled name into its qualified entity name and whether a
/// parameter list follows. A leading return type (template functions) and
/// trailing qualifiers (`const`) are dropped.
pub(crate) fn split_signature(name: &str) -> Signature<'_> {
    let bytes = name.as_bytes();
    let mut angle = 0usize;
    let mut paren = 0usize;
    let mut name_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if angle == 0 && paren == 0 {
            if bytes[i] == b'(' && name[i..].starts_with(ANON_NS) {
                i += ANON_NS.len();
                continue;
            }
            if is_operator_at(name, i) {
                i = skip_operator(name, i);
                continue;
            }
            match bytes[i] {
                b'(' => {
                    if let Some(inner) = declarator_group(name, i) {
                        return split_signature(inner);
                    }
                    return Signature {
                        qualified: name[name_start..i].trim(),
                        has_params: true,
                    };
                }
                b' ' => name_start = i + 1,
                _ => {}
            }
        }
        match bytes[i] {
            b'<' => angle += 1,
            b'>' => angle = angle.saturating_sub(1),
            b'(' => paren += 1,
            b')' => paren = paren.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }

    Signature {
        qualified: name[name_start..].trim(),
        has_params: false,
    }
}

/// The entity inside a `(*name(args))` declarator group, as demangled for
/// functions returning a function pointer or array reference.
fn declarator_group(name: &str, open: usize) -> Option<&str> {
    let rest = &name[open + 1..];
    if !rest.trim_start().starts_with(['*', '&']) {
        return None;
    }
    let mut depth = 1usize;
    for (j, b) in rest.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = rest[..j].trim_start_matches(['*', '&', ' ']);
                    return (!inner.is_empty()).then_some(inner);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a qualified name on `::` separators that are not nested inside
/// template arguments or parentheses.
pub(crate) fn split_scope(qualified: &str) -> Vec<&str> {
    let bytes = qualified.as_bytes();
    let mut parts = Vec::new();
    let mut angle = 0usize;
    let mut paren = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if angle == 0 && paren == 0 && is_operator_at(qualified, i) {
            // Everything from here on is the operator's own name.
            break;
        }
        match bytes[i] {
            b'<' => angle += 1,
            b'>' => angle = angle.saturating_sub(1),
            b'(' => paren += 1,
            b')' => paren = paren.saturating_sub(1),
            b':' if angle == 0 && paren == 0 && bytes.get(i + 1) == Some(&b':') => {
                parts.push(&qualified[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&qualified[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_operator_at(s: &str, i: usize) -> bool {
    let bytes = s.as_bytes();
    if !bytes[i..].starts_with(b"operator") {
        return false;
    }
    let before_ok = i == 0 || !is_ident_byte(bytes[i - 1]);
    let after_ok = bytes.get(i + 8).is_none_or(|b| !is_ident_byte(*b));
    before_ok && after_ok
}

/// Advance past `operator` and its symbol (`()`, `[]`, `<<=`, `new[]`,
/// conversion type name, ...).
fn skip_operator(s: &str, i: usize) -> usize {
    let bytes = s.as_bytes();
    let mut j = i + "operator".len();
    while bytes.get(j) == Some(&b' ') {
        j += 1;
    }
    let rest = &s[j..];
    if rest.starts_with("()") || rest.starts_with("[]") {
        return j + 2;
    }
    if bytes.get(j).is_some_and(|b| is_ident_byte(*b)) {
        while bytes.get(j).is_some_and(|b| is_ident_byte(*b)) {
            j += 1;
        }
        if s[j..].starts_with("[]") {
            j += 2;
        }
        return j;
    }
    while bytes.get(j).is_some_and(|b| b"+-*/%^&|~!=<>,".contains(b)) {
        j += 1;
    }
    j
}
