use anyhow::{Context, Result, bail};
use goblin::Object;
use goblin::mach::Mach;
use tracing::debug;

use crate::binary::facts::ObjectFacts;
use crate::binary::{elf, macho, pe};

/// Parse a compiled container and extract its raw symbol and section tables.
///
/// Dispatches on the container kind detected by `goblin`:
///
/// 1. ELF objects, shared objects and executables.
/// 2. Thin Mach-O images.
/// 3. PE images (exports and imports).
/// 4. `ar` archives: every member that is itself one of the above is
///    parsed and merged; other members (symbol indexes, text) are skipped.
///
/// Unrecognised magic and structural corruption are errors. The returned
/// facts are normalised: symbol names and section names are unique.
pub fn parse_object(bytes: &[u8]) -> Result<ObjectFacts> {
    let object = Object::parse(bytes).context("failed to parse binary container")?;

    let mut facts = match object {
        Object::Elf(elf) => elf::extract(&elf),
        Object::Mach(Mach::Binary(bin)) => macho::extract(&bin),
        Object::Mach(Mach::Fat(_)) => {
            bail!("universal (fat) Mach-O binaries are not supported; extract one slice first")
        }
        Object::PE(pe) => pe::extract(&pe),
        Object::Archive(archive) => {
            // Members are walked by position: the name index keeps only the
            // last of several same-named members.
            let mut facts = ObjectFacts::new("archive");
            for index in 0..archive.len() {
                let Some(member) = archive.get_at(index) else {
                    continue;
                };
                let name = member.extended_name();
                let data = usize::try_from(member.offset)
                    .ok()
                    .and_then(|start| bytes.get(start..))
                    .and_then(|rest| rest.get(..member.size()))
                    .with_context(|| {
                        format!("archive member {name} (#{index}) extends past end of file")
                    })?;
                match parse_member(data) {
                    Some(member_facts) => facts.absorb(member_facts),
                    None => debug!(member = name, index, "skipping non-object archive member"),
                }
            }
            facts
        }
        Object::Unknown(magic) => bail!("unrecognized container magic {magic:#x}"),
        _ => bail!("unsupported container kind"),
    };

    facts.normalize();
    debug!(
        format = %facts.format,
        symbols = facts.symbols.len(),
        sections = facts.sections.len(),
        "parsed container"
    );

    Ok(facts)
}

fn parse_member(data: &[u8]) -> Option<ObjectFacts> {
    match Object::parse(data).ok()? {
        Object::Elf(elf) => Some(elf::extract(&elf)),
        Object::Mach(Mach::Binary(bin)) => Some(macho::extract(&bin)),
        Object::PE(pe) => Some(pe::extract(&pe)),
        _ => None,
    }
}
