use goblin::pe::PE;

use crate::binary::facts::{ObjectFacts, SectionFact, SymbolFact};

/// Extract the section table, exports (defined, `T`) and imports
/// (undefined, `U`) of a PE image. Section flags are the raw
/// characteristics word.
pub fn extract(pe: &PE<'_>) -> ObjectFacts {
    let mut facts = ObjectFacts::new(if pe.is_64 { "pe32+" } else { "pe32" });

    for sec in &pe.sections {
        let name = sec.name().unwrap_or("");
        if name.is_empty() {
            continue;
        }
        facts.sections.push(SectionFact {
            name: name.to_string(),
            size: u64::from(sec.size_of_raw_data),
            flags: u64::from(sec.characteristics),
        });
    }

    for export in &pe.exports {
        let Some(name) = export.name else { continue };
        if name.is_empty() {
            continue;
        }
        facts.symbols.push(SymbolFact {
            name: name.to_string(),
            kind: 'T',
            size: 0,
        });
    }

    for import in &pe.imports {
        if import.name.is_empty() {
            continue;
        }
        facts.symbols.push(SymbolFact {
            name: import.name.to_string(),
            kind: 'U',
            size: 0,
        });
    }

    facts
}
