use goblin::elf::Elf;
use goblin::elf::section_header::{
    SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHN_ABS, SHN_COMMON, SHN_UNDEF, SHT_NOBITS, SHT_NULL,
};
use goblin::elf::sym::{STB_LOCAL, STB_WEAK, STT_FILE, STT_OBJECT, STT_SECTION, Sym, Symtab};
use goblin::strtab::Strtab;

use crate::binary::facts::{ObjectFacts, SectionFact, SymbolFact};

/// Extract section headers plus `.symtab` and `.dynsym` entries.
///
/// Section and file symbols carry no linkable name and are skipped, as are
/// entries with an empty name.
pub fn extract(elf: &Elf<'_>) -> ObjectFacts {
    let mut facts = ObjectFacts::new(if elf.is_64 { "elf64" } else { "elf32" });

    for sh in &elf.section_headers {
        if sh.sh_type == SHT_NULL {
            continue;
        }
        let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("");
        if name.is_empty() {
            continue;
        }
        facts.sections.push(SectionFact {
            name: name.to_string(),
            size: sh.sh_size,
            flags: sh.sh_flags,
        });
    }

    push_symbols(&mut facts, elf, &elf.syms, &elf.strtab);
    push_symbols(&mut facts, elf, &elf.dynsyms, &elf.dynstrtab);

    facts
}

fn push_symbols(facts: &mut ObjectFacts, elf: &Elf<'_>, syms: &Symtab<'_>, strtab: &Strtab<'_>) {
    for sym in syms.iter() {
        let ty = sym.st_type();
        if ty == STT_SECTION || ty == STT_FILE {
            continue;
        }
        let name = strtab.get_at(sym.st_name).unwrap_or("");
        if name.is_empty() {
            continue;
        }
        facts.symbols.push(SymbolFact {
            name: name.to_string(),
            kind: kind_letter(elf, &sym),
            size: sym.st_size,
        });
    }
}

/// `nm`-style kind letter. Lowercase marks local binding.
fn kind_letter(elf: &Elf<'_>, sym: &Sym) -> char {
    let bind = sym.st_bind();

    if sym.st_shndx == SHN_UNDEF as usize {
        return if bind == STB_WEAK { 'w' } else { 'U' };
    }
    if bind == STB_WEAK {
        return if sym.st_type() == STT_OBJECT {
            'V'
        } else {
            'W'
        };
    }

    let letter = if sym.st_shndx == SHN_ABS as usize {
        'A'
    } else if sym.st_shndx == SHN_COMMON as usize {
        'C'
    } else {
        match elf.section_headers.get(sym.st_shndx) {
            Some(sh) if sh.sh_type == SHT_NOBITS => 'B',
            Some(sh) if sh.sh_flags & u64::from(SHF_EXECINSTR) != 0 => 'T',
            Some(sh) if sh.sh_flags & u64::from(SHF_WRITE) != 0 => 'D',
            Some(sh) if sh.sh_flags & u64::from(SHF_ALLOC) != 0 => 'R',
            Some(_) => 'N',
            None => '?',
        }
    };

    if bind == STB_LOCAL {
        letter.to_ascii_lowercase()
    } else {
        letter
    }
}
