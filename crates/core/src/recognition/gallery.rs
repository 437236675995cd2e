use std::collections::BTreeMap;

/// Known-identity gallery: canonical name → mean unit embedding.
///
/// Built once at startup and read-only for the engine's lifetime. Entries
/// iterate in name order so matching is deterministic.
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    entries: BTreeMap<String, Vec<f32>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, embedding: Vec<f32>) {
        self.entries.insert(name.to_string(), embedding);
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<f32>)> for Gallery {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f32>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Canonical identity name for a reference image file stem.
///
/// A trailing `-N`/`_N` variant suffix is stripped ("alice-2", "alice_3"
/// → "alice") and the result is lowercased so variants group
/// case-insensitively.
pub fn canonical_name(stem: &str) -> String {
    let trimmed = match stem.rfind(['-', '_']) {
        Some(pos)
            if pos > 0
                && pos + 1 < stem.len()
                && stem[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            &stem[..pos]
        }
        _ => stem,
    };
    trimmed.to_lowercase()
}
