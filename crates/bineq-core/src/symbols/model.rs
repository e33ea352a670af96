use serde::{Deserialize, Serialize};

/// Which side of a comparison an artifact represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Baseline,
    Candidate,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Baseline => f.write_str("baseline"),
            Side::Candidate => f.write_str("candidate"),
        }
    }
}

/// Classification bucket assigned to every symbol.
///
/// Declaration order is the order used for category tables in reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolCategory {
    Constructor,
    Destructor,
    Vtable,
    TypeInfoStruct,
    TypeInfoString,
    Operator,
    Template,
    StaticMember,
    GlobalFunction,
    Method,
    Other,
}

impl SymbolCategory {
    pub const ALL: [SymbolCategory; 11] = [
        SymbolCategory::Constructor,
        SymbolCategory::Destructor,
        SymbolCategory::Vtable,
        SymbolCategory::TypeInfoStruct,
        SymbolCategory::TypeInfoString,
        SymbolCategory::Operator,
        SymbolCategory::Template,
        SymbolCategory::StaticMember,
        SymbolCategory::GlobalFunction,
        SymbolCategory::Method,
        SymbolCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolCategory::Constructor => "Constructor",
            SymbolCategory::Destructor => "Destructor",
            SymbolCategory::Vtable => "Vtable",
            SymbolCategory::TypeInfoStruct => "TypeInfoStruct",
            SymbolCategory::TypeInfoString => "TypeInfoString",
            SymbolCategory::Operator => "Operator",
            SymbolCategory::Template => "Template",
            SymbolCategory::StaticMember => "StaticMember",
            SymbolCategory::GlobalFunction => "GlobalFunction",
            SymbolCategory::Method => "Method",
            SymbolCategory::Other => "Other",
        }
    }
}

impl std::fmt::Display for SymbolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One linker-visible symbol after demangling and classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Symbol {
    /// Mangled name; unique within one artifact.
    pub raw_name: String,
    /// Equals `raw_name` when demangling failed.
    pub demangled_name: String,
    /// `nm`-style kind letter. Informational only.
    pub kind_letter: char,
    pub size_bytes: u64,
    pub category: SymbolCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_class: Option<String>,
}

/// One named section. Flags are opaque and only compared for equality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub size_bytes: u64,
    pub flags: u64,
}

/// Normalised structural metadata for one artifact.
///
/// Created once by the introspector and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactMetadata {
    pub path: String,
    pub label: Side,
    /// Container kind, e.g. `elf64`, `mach-o64`, `pe32+`, `archive`.
    pub format: String,
    pub size_bytes: u64,
    pub sha256: String,
    /// Extraction order.
    pub symbols: Vec<Symbol>,
    pub sections: Vec<Section>,
}
