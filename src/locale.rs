//! Display labels per language.
//!
//! Lookups that have no translation fall back to English, so adding a label
//! only requires the English entry.

use serde::Serialize;

/// Supported display languages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    It,
    De,
    Fr,
    Nl,
    Es,
}

impl Language {
    /// Parse a language tag. Region suffixes (`de-AT`, `fr_CA`) are ignored and
    /// anything unrecognized is English.
    pub fn parse(tag: &str) -> Self {
        let primary = tag.trim().split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        match primary.as_str() {
            "it" => Self::It,
            "de" => Self::De,
            "fr" => Self::Fr,
            "nl" => Self::Nl,
            "es" => Self::Es,
            _ => Self::En,
        }
    }
}

/// Label keys used by the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    DailyYield,
    PvTotal,
    Array,
    House,
    Inverter,
    GridImport,
    GridExport,
    Car,
}

/// Label text for `language`, falling back to English.
pub fn label(
    language: Language,
    key: Label,
) -> &'static str {
    translate(language, key).unwrap_or_else(|| english(key))
}

fn english(key: Label) -> &'static str {
    match key {
        Label::DailyYield => "DAILY YIELD",
        Label::PvTotal => "PV TOT",
        Label::Array => "Array",
        Label::House => "HOUSE",
        Label::Inverter => "INV",
        Label::GridImport => "IMPORT",
        Label::GridExport => "EXPORT",
        Label::Car => "EV",
    }
}

fn translate(
    language: Language,
    key: Label,
) -> Option<&'static str> {
    let text = match (language, key) {
        (Language::En, _) => return None,

        (Language::It, Label::DailyYield) => "PRODUZIONE OGGI",
        (Language::It, Label::PvTotal) => "FV TOT",
        (Language::It, Label::Array) => "Campo",
        (Language::It, Label::House) => "CASA",
        (Language::It, Label::GridImport) => "PRELIEVO",
        (Language::It, Label::GridExport) => "IMMISSIONE",
        (Language::It, Label::Car) => "AUTO",

        (Language::De, Label::DailyYield) => "TAGESERTRAG",
        (Language::De, Label::PvTotal) => "PV GES",
        (Language::De, Label::Array) => "Feld",
        (Language::De, Label::House) => "HAUS",
        (Language::De, Label::Inverter) => "WR",
        (Language::De, Label::GridImport) => "BEZUG",
        (Language::De, Label::GridExport) => "EINSPEISUNG",
        (Language::De, Label::Car) => "AUTO",

        (Language::Fr, Label::DailyYield) => "PRODUCTION DU JOUR",
        (Language::Fr, Label::Array) => "Champ",
        (Language::Fr, Label::House) => "MAISON",
        (Language::Fr, Label::Inverter) => "OND",
        (Language::Fr, Label::Car) => "VE",

        (Language::Nl, Label::DailyYield) => "DAGOPBRENGST",
        (Language::Nl, Label::Array) => "Veld",
        (Language::Nl, Label::House) => "HUIS",
        (Language::Nl, Label::GridImport) => "AFNAME",
        (Language::Nl, Label::GridExport) => "TERUGLEVERING",

        (Language::Es, Label::DailyYield) => "PRODUCCIÓN DIARIA",
        (Language::Es, Label::PvTotal) => "FV TOT",
        (Language::Es, Label::Array) => "Campo",
        (Language::Es, Label::House) => "CASA",
        (Language::Es, Label::GridImport) => "IMPORTACIÓN",
        (Language::Es, Label::GridExport) => "EXPORTACIÓN",
        (Language::Es, Label::Car) => "VE",

        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_tags() {
        assert_eq!(Language::parse("de"), Language::De);
        assert_eq!(Language::parse("DE-at"), Language::De, "region and case are ignored");
        assert_eq!(Language::parse("fr_CA"), Language::Fr);
        assert_eq!(Language::parse("pt"), Language::En, "unknown falls back to English");
        assert_eq!(Language::parse(""), Language::En);
    }

    #[test]
    fn test_translated_label() {
        assert_eq!(label(Language::It, Label::DailyYield), "PRODUZIONE OGGI");
        assert_eq!(label(Language::De, Label::GridExport), "EINSPEISUNG");
    }

    #[test]
    fn test_missing_translation_falls_back_to_english() {
        assert_eq!(label(Language::Fr, Label::GridImport), "IMPORT");
    }

    #[test]
    fn test_every_label_has_text() {
        let languages = [Language::En, Language::It, Language::De, Language::Fr, Language::Nl, Language::Es];
        let keys = [
            Label::DailyYield,
            Label::PvTotal,
            Label::Array,
            Label::House,
            Label::Inverter,
            Label::GridImport,
            Label::GridExport,
            Label::Car,
        ];
        for language in languages {
            for key in keys {
                assert!(!label(language, key).is_empty(), "{language:?} {key:?} is blank");
            }
        }
    }
}
