use serde::{Deserialize, Serialize};

/// Longest description (in characters) carried into embedding text.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Free-text fields of a submitted report.
///
/// Only [`embedding_text`](Self::embedding_text) interprets these; every field
/// is optional and blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFields {
    #[serde(default)]
    pub scammer_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub scam_type: Option<String>,
}

impl ReportFields {
    /// Compose the labelled single-line text that gets embedded.
    ///
    /// Field order is fixed (names first, location and contact details after)
    /// so identical reports always produce identical text. Labels are the
    /// ones stored embeddings were computed with and must not change.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        let description = self.description.as_deref().map(truncate_description);

        let labelled = [
            ("Meno", self.scammer_name.as_deref()),
            ("Firma", self.company_name.as_deref()),
            ("Popis", description.as_deref()),
            ("Adresa", self.address.as_deref()),
            ("Mesto", self.city.as_deref()),
            ("Web", self.website.as_deref()),
            ("Email", self.email.as_deref()),
            ("Typ", self.scam_type.as_deref()),
        ];

        labelled
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{label}: {v}"))
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let mut truncated: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    truncated.push_str("...");
    truncated
}
