use super::{InstructionKind, Language, TaskType};

/// Detail labels recognised inside a task section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TankStatus,
    CustomerReference,
    LoadDate,
    UnloadDate,
    LoadReference,
    UnloadReference,
    Product,
    Weight,
    Volume,
    Compartment,
    Temperature,
    Remark,
    Destination,
}

/// Keyword tables for every label the parser understands, in all supported
/// languages. All keywords are stored lower-case.
///
/// Build one with [`Dictionary::standard`] at startup and pass it to
/// [`parse_shipment_text`](super::parse_shipment_text). Tests and new vendor
/// formats can assemble their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    /// Task-start keywords, checked in this order.
    pub tasks: Vec<(TaskType, Vec<String>)>,
    /// Title markers fixing the document language, highest priority first.
    pub markers: Vec<(Language, String)>,
    /// Instruction description keywords per language.
    pub instructions: Vec<(Language, Vec<(String, InstructionKind)>)>,
    pub company: Vec<String>,
    pub truck: Vec<String>,
    pub driver: Vec<String>,
    pub chassis: Vec<String>,
    pub container: Vec<String>,
    /// Lines mentioning these carry the tank status, not the container.
    pub container_exclusions: Vec<String>,
    pub tank_details: Vec<String>,
    pub general_remark: Vec<String>,
    pub fields: Vec<(Field, Vec<String>)>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Dictionary {
    /// French, German, English and Polish labels as printed by the vendors
    /// seen so far.
    pub fn standard() -> Self {
        use InstructionKind as K;

        Self {
            tasks: vec![
                (
                    TaskType::Unload,
                    words(&["unload", "entladen", "rozładunek", "déchargement"]),
                ),
                (
                    TaskType::Load,
                    words(&["load", "laden", "załadunek", "prise en charge", "chargement"]),
                ),
                (
                    TaskType::Collect,
                    words(&["collect", "aufnehmen", "aufnehmer bei", "odbiór", "collecte"]),
                ),
                (
                    TaskType::Dropoff,
                    words(&[
                        "drop off",
                        "absatteln",
                        "absetzen",
                        "odstawienie",
                        "odczepienie",
                        "dépose",
                        "dételage",
                        "décroche",
                        "decouple",
                    ]),
                ),
                (
                    TaskType::Cleaning,
                    words(&["cleaning", "reinigen", "czyszczenie", "nettoyage"]),
                ),
            ],
            markers: vec![
                (Language::French, "instructions de".to_string()),
                (Language::German, "anweisung".to_string()),
                (Language::English, "instruction".to_string()),
            ],
            instructions: vec![
                (
                    Language::French,
                    vec![
                        ("chargement".to_string(), K::Load),
                        ("déchargement".to_string(), K::Unload),
                        ("shunt".to_string(), K::Shunt),
                    ],
                ),
                (
                    Language::German,
                    vec![
                        ("lade".to_string(), K::Load),
                        ("entlade".to_string(), K::Unload),
                        ("umfuhr".to_string(), K::Transfer),
                        ("absetz".to_string(), K::Dropoff),
                    ],
                ),
                (
                    Language::English,
                    vec![
                        ("load".to_string(), K::Load),
                        ("unload".to_string(), K::Unload),
                        ("transfer".to_string(), K::Transfer),
                        ("shunt".to_string(), K::Shunt),
                        ("drop".to_string(), K::Dropoff),
                    ],
                ),
            ],
            company: words(&["im auftrag von", "pour le compte de", "in order of"]),
            truck: words(&["truck", "n° camion"]),
            driver: words(&["fahrer", "chauffeur", "driver"]),
            chassis: words(&["chassis"]),
            container: words(&["container", "tank", "conteneur"]),
            container_exclusions: words(&["status", "etat du"]),
            tank_details: words(&["tankdetails", "détails du conteneur"]),
            general_remark: words(&[
                "genereller hinweis",
                "general remark",
                "commentaires généraux",
            ]),
            fields: vec![
                (Field::TankStatus, words(&["tank status", "etat du conteneur"])),
                (
                    Field::CustomerReference,
                    words(&["customer reference", "référence client", "kundenreferenz"]),
                ),
                (
                    Field::LoadDate,
                    words(&["load date", "date de chargement", "ladedatum"]),
                ),
                (
                    Field::UnloadDate,
                    words(&["unload date", "date de livraison", "entladedatum"]),
                ),
                (
                    Field::LoadReference,
                    words(&["ladereferenz", "load reference", "référence de chargement"]),
                ),
                (
                    Field::UnloadReference,
                    words(&["entladereferenz", "unload reference", "référence de livraison"]),
                ),
                (Field::Product, words(&["product", "produit", "produkt"])),
                (Field::Weight, words(&["poids", "weight", "gewicht"])),
                (Field::Volume, words(&["volume", "volumen"])),
                (
                    Field::Compartment,
                    words(&["compartiment", "compartment", "kammer"]),
                ),
                (
                    Field::Temperature,
                    words(&["temp", "temperatur", "temperature", "température", "tempér"]),
                ),
                (Field::Remark, words(&["hinweis", "remark", "commentaires"])),
                (Field::Destination, words(&["destination"])),
            ],
        }
    }

    pub fn task_keywords(&self, task_type: TaskType) -> &[String] {
        self.tasks
            .iter()
            .find(|(t, _)| *t == task_type)
            .map(|(_, keywords)| keywords.as_slice())
            .unwrap_or_default()
    }

    /// Task type of a section-opening line. The trimmed line has to start
    /// with the keyword in capitals, so `Load date:` never opens a task.
    pub fn task_type_of(&self, line: &str) -> Option<TaskType> {
        let line = line.trim();
        self.tasks
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| line.starts_with(keyword.to_uppercase().as_str()))
            })
            .map(|(task_type, _)| *task_type)
    }

    /// Case-insensitive variant of [`Dictionary::task_type_of`], used while
    /// scanning the header.
    pub fn starts_task(&self, line: &str) -> bool {
        let line = line.trim();
        self.tasks
            .iter()
            .flat_map(|(_, keywords)| keywords)
            .any(|keyword| strip_keyword(line, keyword).is_some())
    }

    pub fn marker_language(&self, line: &str) -> Option<Language> {
        self.markers
            .iter()
            .find(|(_, marker)| line.contains(marker.to_uppercase().as_str()))
            .map(|(language, _)| *language)
    }

    /// First instruction keyword of `language` printed on the line.
    ///
    /// A keyword is skipped when a longer keyword containing it is also on the
    /// line: `ENTLADE` hides `LADE`, `UNLOAD` hides `LOAD`, `DÉCHARGEMENT`
    /// hides `CHARGEMENT`.
    pub fn instruction_kind(&self, language: Language, line: &str) -> Option<InstructionKind> {
        let (_, keywords) = self.instructions.iter().find(|(l, _)| *l == language)?;
        keywords
            .iter()
            .find(|(keyword, _)| {
                line.contains(keyword.to_uppercase().as_str())
                    && !keywords.iter().any(|(other, _)| {
                        other.len() > keyword.len()
                            && other.contains(keyword.as_str())
                            && line.contains(other.to_uppercase().as_str())
                    })
            })
            .map(|(_, kind)| *kind)
    }

    /// Detail label at the start of `line`, with the text after it.
    /// The longest matching keyword wins.
    pub fn field_label<'a>(&self, line: &'a str) -> Option<(Field, &'a str)> {
        let mut best: Option<(usize, Field, &'a str)> = None;
        for (field, keywords) in &self.fields {
            for keyword in keywords {
                if let Some(rest) = strip_keyword(line, keyword) {
                    if best.is_none_or(|(len, _, _)| keyword.len() > len) {
                        best = Some((keyword.len(), *field, rest));
                    }
                }
            }
        }
        best.map(|(_, field, rest)| (field, rest))
    }
}

/// Strip `keyword` from the start of `line`, ignoring case.
pub fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let mut chars = line.char_indices();
    let mut end = 0;
    for expected in keyword.chars() {
        let (idx, c) = chars.next()?;
        if !c.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = idx + c.len_utf8();
    }
    Some(&line[end..])
}

/// Text following the first case-insensitive occurrence of `keyword`.
pub fn find_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.char_indices()
        .find_map(|(idx, _)| strip_keyword(&line[idx..], keyword))
}

/// Longest keyword of the list that starts the line, with the text after it.
pub fn match_label<'a>(line: &'a str, keywords: &[String]) -> Option<&'a str> {
    keywords
        .iter()
        .filter_map(|keyword| strip_keyword(line, keyword).map(|rest| (keyword.len(), rest)))
        .max_by_key(|(len, _)| *len)
        .map(|(_, rest)| rest)
}

/// Value part after a label: surrounding blanks and one `:` removed.
pub fn label_value(rest: &str) -> &str {
    let rest = rest.trim();
    rest.strip_prefix(':').unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_keyword_ignores_case() {
        assert_eq!(strip_keyword("PRODUCT: acid", "product"), Some(": acid"));
        assert_eq!(strip_keyword("Détails du conteneur : 3", "détails du conteneur"), Some(" : 3"));
        assert_eq!(strip_keyword("DÉCHARGEMENT Lyon", "déchargement"), Some(" Lyon"));
        assert_eq!(strip_keyword("prod", "product"), None);
    }

    #[test]
    fn test_find_keyword_mid_line() {
        assert_eq!(
            find_keyword("Task 1   In Order Of: ACME", "in order of"),
            Some(": ACME")
        );
        assert_eq!(find_keyword("nothing here", "in order of"), None);
    }

    #[test]
    fn test_label_value() {
        assert_eq!(label_value(" : 42 "), "42");
        assert_eq!(label_value("  no colon"), "no colon");
    }

    #[test]
    fn test_task_type_is_case_sensitive_on_line() {
        let dict = Dictionary::standard();
        assert_eq!(dict.task_type_of("LOAD BASF"), Some(TaskType::Load));
        assert_eq!(dict.task_type_of("  UNLOAD Port"), Some(TaskType::Unload));
        assert_eq!(dict.task_type_of("DÉCHARGEMENT Lyon"), Some(TaskType::Unload));
        assert_eq!(dict.task_type_of("CHARGEMENT Lyon"), Some(TaskType::Load));
        assert_eq!(dict.task_type_of("Load date: 03/11/2025"), None);
        assert!(dict.starts_task("Load date: 03/11/2025"));
    }

    #[test]
    fn test_instruction_keyword_exclusivity() {
        let dict = Dictionary::standard();
        assert_eq!(
            dict.instruction_kind(Language::English, "UNLOAD INSTRUCTION"),
            Some(InstructionKind::Unload)
        );
        assert_eq!(
            dict.instruction_kind(Language::English, "LOAD INSTRUCTION"),
            Some(InstructionKind::Load)
        );
        assert_eq!(
            dict.instruction_kind(Language::German, "ENTLADE ANWEISUNG"),
            Some(InstructionKind::Unload)
        );
        assert_eq!(
            dict.instruction_kind(Language::French, "INSTRUCTIONS DE DÉCHARGEMENT"),
            Some(InstructionKind::Unload)
        );
        assert_eq!(
            dict.instruction_kind(Language::French, "INSTRUCTIONS DE CHARGEMENT"),
            Some(InstructionKind::Load)
        );
    }

    #[test]
    fn test_marker_priority() {
        let dict = Dictionary::standard();
        assert_eq!(
            dict.marker_language("INSTRUCTIONS DE CHARGEMENT"),
            Some(Language::French)
        );
        assert_eq!(dict.marker_language("LADE ANWEISUNG"), Some(Language::German));
        assert_eq!(dict.marker_language("LOAD INSTRUCTION"), Some(Language::English));
        assert_eq!(dict.marker_language("Instruction lower case"), None);
    }

    #[test]
    fn test_field_label_prefers_longest_keyword() {
        let dict = Dictionary::standard();
        let (field, rest) = dict.field_label("Temperature: 20 C").unwrap();
        assert_eq!(field, Field::Temperature);
        assert_eq!(label_value(rest), "20 C");
        assert_eq!(dict.field_label("  Weight: indented"), None);
    }

    #[test]
    fn test_custom_dictionary() {
        let mut dict = Dictionary::standard();
        dict.tasks[0].1.push("lossen".to_string());
        assert_eq!(dict.task_type_of("LOSSEN Rotterdam"), Some(TaskType::Unload));
        assert_eq!(Dictionary::standard().task_type_of("LOSSEN Rotterdam"), None);
    }
}
