use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A capability record advertised by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl Descriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        functions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            functions: functions.into_iter().map(Into::into).collect(),
        }
    }

    /// Text fed to the embedding oracle for this descriptor
    pub fn embedding_text(&self) -> String {
        format!(
            "{}. {}. {}",
            self.name,
            self.description,
            self.functions.join(", ")
        )
    }
}

/// Ordered mapping from identifier to descriptor.
///
/// Iteration follows insertion order, which is also the tie-break order
/// used when ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: IndexMap<String, Descriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry. A replaced entry keeps its position.
    pub fn with_entry(mut self, id: impl Into<String>, descriptor: Descriptor) -> Self {
        self.entries.insert(id.into(), descriptor);
        self
    }

    /// Shallow per-key merge: every entry of `other` replaces or extends `self`
    pub fn overlay(mut self, other: Catalog) -> Self {
        for (id, descriptor) in other.entries {
            self.entries.insert(id, descriptor);
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&Descriptor> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.entries.iter().map(|(id, d)| (id.as_str(), d))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Descriptor)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, Descriptor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Outcome of a matching strategy.
///
/// Once validated, every identifier is a key of the catalog it was checked
/// against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub best_match_id: Option<String>,
    pub relevant_match_ids: Vec<String>,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.best_match_id.is_none() && self.relevant_match_ids.is_empty()
    }

    /// Drop ids missing from `catalog`, de-duplicate relevant ids and make
    /// sure a surviving best id leads the relevant list.
    pub fn validated(self, catalog: &Catalog) -> Self {
        let best_match_id = self.best_match_id.filter(|id| catalog.contains(id));

        let mut relevant_match_ids: Vec<String> = Vec::with_capacity(self.relevant_match_ids.len());
        for id in self.relevant_match_ids {
            if catalog.contains(&id) && !relevant_match_ids.contains(&id) {
                relevant_match_ids.push(id);
            }
        }

        if let Some(best) = &best_match_id {
            if !relevant_match_ids.contains(best) {
                relevant_match_ids.insert(0, best.clone());
            }
        }

        Self {
            best_match_id,
            relevant_match_ids,
        }
    }
}
