//! Supported languages

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
}

pub static LANGUAGES: [Language; 8] = [
    Language { code: "en", name: "English", native_name: "English", flag: "🇺🇸" },
    Language { code: "hi", name: "Hindi", native_name: "हिन्दी", flag: "🇮🇳" },
    Language { code: "es", name: "Spanish", native_name: "Español", flag: "🇪🇸" },
    Language { code: "fr", name: "French", native_name: "Français", flag: "🇫🇷" },
    Language { code: "de", name: "German", native_name: "Deutsch", flag: "🇩🇪" },
    Language { code: "zh", name: "Chinese", native_name: "中文", flag: "🇨🇳" },
    Language { code: "ja", name: "Japanese", native_name: "日本語", flag: "🇯🇵" },
    Language { code: "ar", name: "Arabic", native_name: "العربية", flag: "🇸🇦" },
];

pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Case-insensitive substring match on English or native name.
pub fn search(term: &str) -> Vec<&'static Language> {
    let term = term.trim().to_lowercase();
    LANGUAGES
        .iter()
        .filter(|l| {
            term.is_empty()
                || l.name.to_lowercase().contains(&term)
                || l.native_name.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_code() {
        assert_eq!(find("es").unwrap().native_name, "Español");
        assert!(find("xx").is_none());
    }

    #[test]
    fn search_matches_either_name() {
        let hits: Vec<_> = search("ESP").iter().map(|l| l.code).collect();
        assert_eq!(hits, vec!["es"]);
        let hits: Vec<_> = search("german").iter().map(|l| l.code).collect();
        assert_eq!(hits, vec!["de"]);
        assert_eq!(search("").len(), LANGUAGES.len());
        assert!(search("klingon").is_empty());
    }
}
