use std::collections::{BTreeMap, HashSet};

/// Symbol table entry as read from the container, before demangling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFact {
    pub name: String,
    pub kind: char,
    pub size: u64,
}

/// Section header entry as read from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFact {
    pub name: String,
    pub size: u64,
    pub flags: u64,
}

/// Raw tables extracted from one container (or every member of an archive).
///
/// Pure observations: no demangling, no classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectFacts {
    pub format: String,
    pub symbols: Vec<SymbolFact>,
    pub sections: Vec<SectionFact>,
}

impl ObjectFacts {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Default::default()
        }
    }

    /// Append another container's tables (archive members).
    pub fn absorb(&mut self, other: ObjectFacts) {
        self.symbols.extend(other.symbols);
        self.sections.extend(other.sections);
    }

    /// Enforce per-artifact name uniqueness.
    ///
    /// Symbols: the first occurrence of a name wins, extraction order is kept.
    /// Sections: entries sharing a name are merged (sizes summed, flags OR-ed)
    /// at the position of the first occurrence.
    pub fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.symbols.retain(|s| seen.insert(s.name.clone()));

        let mut order: Vec<String> = Vec::new();
        let mut merged: BTreeMap<String, SectionFact> = BTreeMap::new();
        for sec in self.sections.drain(..) {
            match merged.get_mut(&sec.name) {
                Some(existing) => {
                    existing.size = existing.size.saturating_add(sec.size);
                    existing.flags |= sec.flags;
                }
                None => {
                    order.push(sec.name.clone());
                    merged.insert(sec.name.clone(), sec);
                }
            }
        }
        self.sections = order
            .into_iter()
            .filter_map(|name| merged.remove(&name))
            .collect();
    }
}
