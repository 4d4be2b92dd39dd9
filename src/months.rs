//! Localized short month names.

use serde::Deserialize;

const EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DE: [&str; 12] = [
    "Jan", "Feb", "März", "Apr", "Mai", "Juni", "Juli", "Aug", "Sept", "Okt", "Nov", "Dez",
];

// Spellings seen in German exports besides the canonical ones above.
const DE_VARIANTS: [(&str, u32); 6] = [
    ("mär", 3),
    ("mrz", 3),
    ("jun", 6),
    ("jul", 7),
    ("sep", 9),
    ("okt", 10),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthLanguage {
    #[default]
    En,
    De,
}

impl MonthLanguage {
    fn names(self) -> &'static [&'static str; 12] {
        match self {
            MonthLanguage::En => &EN,
            MonthLanguage::De => &DE,
        }
    }

    /// Short name of a month number (1-12); empty for anything else.
    pub fn abbr(self, month: u32) -> &'static str {
        match month {
            1..=12 => self.names()[(month - 1) as usize],
            _ => "",
        }
    }

    /// Month number of a short name. The configured language is tried first,
    /// then the others.
    pub fn month_from_abbr(self, text: &str) -> Option<u32> {
        let wanted = text.trim().trim_end_matches('.').to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let others = match self {
            MonthLanguage::En => MonthLanguage::De,
            MonthLanguage::De => MonthLanguage::En,
        };
        for language in [self, others] {
            if let Some(idx) = language
                .names()
                .iter()
                .position(|name| name.to_lowercase() == wanted)
            {
                return Some(idx as u32 + 1);
            }
        }
        DE_VARIANTS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, month)| *month)
    }
}
