//! Label localization

use std::collections::HashMap;

use crate::language::Language;

/// Built-in Tamil names for common detector classes
const TAMIL_LABELS: &[(&str, &str)] = &[
    ("person", "நபர்"),
    ("bicycle", "மிதிவண்டி"),
    ("car", "கார்"),
    ("motorcycle", "மோட்டார்சைக்கிள்"),
    ("bus", "பேருந்து"),
    ("truck", "லாரி"),
    ("traffic light", "போக்குவரத்து விளக்கு"),
    ("stop sign", "நிறுத்தக் குறி"),
    ("bench", "நாற்காலி"),
    ("bird", "பறவை"),
    ("cat", "பூனை"),
    ("dog", "நாய்"),
    ("backpack", "பையின்"),
    ("umbrella", "குடை"),
];

/// Maps detector labels to their spoken form per language
///
/// Total: a label without an entry for the requested language is spoken as-is.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<Language, HashMap<String, String>>,
}

impl TranslationTable {
    /// Table with the built-in entries
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (label, localized) in TAMIL_LABELS {
            table.insert(Language::Tamil, *label, *localized);
        }
        table
    }

    /// Add or replace one entry
    pub fn insert(
        &mut self,
        language: Language,
        label: impl Into<String>,
        localized: impl Into<String>,
    ) {
        self.entries
            .entry(language)
            .or_default()
            .insert(label.into(), localized.into());
    }

    /// Merge entries over this table, replacing existing ones
    #[must_use]
    pub fn with_overrides(mut self, overrides: &HashMap<Language, HashMap<String, String>>) -> Self {
        for (language, entries) in overrides {
            for (label, localized) in entries {
                self.insert(*language, label.clone(), localized.clone());
            }
        }
        self
    }

    /// Spoken form of `label` in `language`, falling back to `label` itself
    #[must_use]
    pub fn localize<'a>(&'a self, label: &'a str, language: Language) -> &'a str {
        self.entries
            .get(&language)
            .and_then(|entries| entries.get(label))
            .map_or(label, String::as_str)
    }
}
