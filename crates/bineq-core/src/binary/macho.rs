use goblin::mach::MachO;

use crate::binary::facts::{ObjectFacts, SectionFact, SymbolFact};

/// Extract sections (`segment,section`) and the symbol table of a thin
/// Mach-O image.
///
/// Mach-O prepends one underscore to every C-level name; it is removed so
/// that `__ZN3FooD1Ev` classifies the same way as its ELF spelling.
pub fn extract(bin: &MachO<'_>) -> ObjectFacts {
    let mut facts = ObjectFacts::new(if bin.is_64 { "mach-o64" } else { "mach-o32" });

    // n_sect is 1-based over this ordering.
    let mut section_names: Vec<String> = Vec::new();
    for (sec, _) in bin
        .segments
        .sections()
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
    {
        let segname = sec.segname().unwrap_or("");
        let name = sec.name().unwrap_or("");
        section_names.push(name.to_string());
        facts.sections.push(SectionFact {
            name: format!("{segname},{name}"),
            size: sec.size,
            flags: u64::from(sec.flags),
        });
    }

    for entry in bin.symbols() {
        let Ok((name, nlist)) = entry else { continue };
        if nlist.is_stab() {
            continue;
        }
        let name = name.strip_prefix('_').unwrap_or(name);
        if name.is_empty() {
            continue;
        }

        let kind = if nlist.is_undefined() {
            'U'
        } else {
            let letter = section_names
                .get(nlist.n_sect.wrapping_sub(1))
                .map(|s| section_letter(s))
                .unwrap_or('A');
            if nlist.is_global() {
                letter
            } else {
                letter.to_ascii_lowercase()
            }
        };

        facts.symbols.push(SymbolFact {
            name: name.to_string(),
            kind,
            size: 0,
        });
    }

    facts
}

fn section_letter(section: &str) -> char {
    match section {
        "__text" => 'T',
        "__data" => 'D',
        "__bss" | "__common" => 'B',
        "__const" | "__cstring" => 'R',
        _ => 'S',
    }
}
