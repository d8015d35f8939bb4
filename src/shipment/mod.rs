// src/shipment/mod.rs

mod fields;
mod header;
pub mod keywords;
mod segment;

use crate::config::ExtractionSection;
use crate::error::ExtractError;
use crate::extract;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use time::PrimitiveDateTime;
use tracing::{debug, info};

pub use keywords::{Dictionary, Field};

/// One operational leg of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Load,
    Unload,
    Collect,
    Dropoff,
    Cleaning,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Load => "load",
            TaskType::Unload => "unload",
            TaskType::Collect => "collect",
            TaskType::Dropoff => "dropoff",
            TaskType::Cleaning => "cleaning",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language the document labels are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ua")]
    Ukrainian,
    #[serde(rename = "pl")]
    Polish,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::German => "de",
            Language::English => "en",
            Language::Ukrainian => "ua",
            Language::Polish => "pl",
        }
    }
}

/// What the instruction title says the whole document is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Load,
    Unload,
    Transfer,
    Shunt,
    Dropoff,
}

/// The closed set of instruction titles vendors are known to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionType {
    #[serde(rename = "INSTRUCTIONS DE DÉCHARGEMENT")]
    FrenchUnload,
    #[serde(rename = "INSTRUCTIONS DE CHARGEMENT")]
    FrenchLoad,
    #[serde(rename = "INSTRUCTIONS DE SHUNT")]
    FrenchShunt,
    #[serde(rename = "LADE ANWEISUNG")]
    GermanLoad,
    #[serde(rename = "ENTLADE ANWEISUNG")]
    GermanUnload,
    #[serde(rename = "UMFUHR ANWEISUNG")]
    GermanTransfer,
    #[serde(rename = "LOAD INSTRUCTION")]
    EnglishLoad,
    #[serde(rename = "UNLOAD INSTRUCTION")]
    EnglishUnload,
    #[serde(rename = "TRANSFER INSTRUCTION")]
    EnglishTransfer,
    #[serde(rename = "SHUNTING INSTRUCTION")]
    EnglishShunting,
}

impl InstructionType {
    /// Returns `None` for combinations outside the known vendor titles.
    pub fn new(language: Language, kind: InstructionKind) -> Option<Self> {
        use InstructionKind as K;
        use Language as L;
        match (language, kind) {
            (L::French, K::Unload) => Some(Self::FrenchUnload),
            (L::French, K::Load) => Some(Self::FrenchLoad),
            (L::French, K::Shunt) => Some(Self::FrenchShunt),
            (L::German, K::Load) => Some(Self::GermanLoad),
            (L::German, K::Unload) => Some(Self::GermanUnload),
            (L::German, K::Transfer) => Some(Self::GermanTransfer),
            (L::English, K::Load) => Some(Self::EnglishLoad),
            (L::English, K::Unload) => Some(Self::EnglishUnload),
            (L::English, K::Transfer) => Some(Self::EnglishTransfer),
            (L::English, K::Shunt) => Some(Self::EnglishShunting),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FrenchUnload => "INSTRUCTIONS DE DÉCHARGEMENT",
            Self::FrenchLoad => "INSTRUCTIONS DE CHARGEMENT",
            Self::FrenchShunt => "INSTRUCTIONS DE SHUNT",
            Self::GermanLoad => "LADE ANWEISUNG",
            Self::GermanUnload => "ENTLADE ANWEISUNG",
            Self::GermanTransfer => "UMFUHR ANWEISUNG",
            Self::EnglishLoad => "LOAD INSTRUCTION",
            Self::EnglishUnload => "UNLOAD INSTRUCTION",
            Self::EnglishTransfer => "TRANSFER INSTRUCTION",
            Self::EnglishShunting => "SHUNTING INSTRUCTION",
        }
    }
}

impl fmt::Display for InstructionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Load,
    Unload,
}

/// A field that could not be read. Parsing carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    InstructionNotDetected,
    UnrecognizedInstruction {
        language: Language,
        instruction: InstructionKind,
    },
    ShipmentIdNotFound,
    MalformedShipmentId {
        raw: String,
    },
    MalformedDateRange {
        task: usize,
        field: DateField,
        raw: String,
        reason: String,
    },
    MalformedCompartment {
        task: usize,
        raw: String,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstructionNotDetected => write!(f, "instruction title not found"),
            Self::UnrecognizedInstruction {
                language,
                instruction,
            } => write!(
                f,
                "unknown instruction {instruction:?} for language {}",
                language.code()
            ),
            Self::ShipmentIdNotFound => write!(f, "shipment id not found"),
            Self::MalformedShipmentId { raw } => write!(f, "shipment id {raw:?} is not a number"),
            Self::MalformedDateRange {
                task,
                field,
                raw,
                reason,
            } => write!(
                f,
                "task {}: {field:?} date range {raw:?} unreadable ({reason})",
                task + 1
            ),
            Self::MalformedCompartment { task, raw } => {
                write!(f, "task {}: compartment {raw:?} is not a number", task + 1)
            }
        }
    }
}

/// Tuning knobs for vendor-specific layout quirks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Run of whitespace that ends a single-value header field.
    pub column_gap: usize,
    /// Vendor names printed after the shipment id.
    pub vendor_suffixes: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            column_gap: 2,
            vendor_suffixes: vec!["Hoyer GmbH".to_string()],
        }
    }
}

/// One operational step of a shipment, with the raw lines it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSection {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub shipment_id: i64,
    pub lines: Vec<String>,
    pub content: String,

    pub address: String,
    pub destination_address: String,
    pub company: String,
    pub customer_reference: String,
    pub load_reference: String,
    pub unload_reference: String,
    pub load_start_date: Option<PrimitiveDateTime>,
    pub load_end_date: Option<PrimitiveDateTime>,
    pub unload_start_date: Option<PrimitiveDateTime>,
    pub unload_end_date: Option<PrimitiveDateTime>,
    pub tank_status: String,
    pub product: String,
    pub weight: String,
    pub volume: String,
    pub temperature: String,
    pub compartment: Option<u32>,
    pub remark: String,

    // Filled in by the driver while the task runs, never by the parser.
    pub current_kilometrage: Option<i64>,
    pub current_weight: Option<i64>,
    pub current_temperature: Option<f64>,
    pub start: Option<PrimitiveDateTime>,
    pub end: Option<PrimitiveDateTime>,
}

impl TaskSection {
    pub fn new(task_type: TaskType, first_line: &str) -> Self {
        Self {
            task_type,
            shipment_id: 0,
            lines: vec![first_line.to_string()],
            content: first_line.to_string(),
            address: String::new(),
            destination_address: String::new(),
            company: String::new(),
            customer_reference: String::new(),
            load_reference: String::new(),
            unload_reference: String::new(),
            load_start_date: None,
            load_end_date: None,
            unload_start_date: None,
            unload_end_date: None,
            tank_status: String::new(),
            product: String::new(),
            weight: String::new(),
            volume: String::new(),
            temperature: String::new(),
            compartment: None,
            remark: String::new(),
            current_kilometrage: None,
            current_weight: None,
            current_temperature: None,
            start: None,
            end: None,
        }
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.content.push('\n');
        self.content.push_str(line);
        self.lines.push(line.to_string());
    }

    /// Single-line sections and sections opened by an indented keyword
    /// are segmentation noise, not tasks.
    pub fn is_well_formed(&self) -> bool {
        self.lines.len() >= 2
            && self
                .lines
                .first()
                .is_some_and(|line| !line.starts_with(char::is_whitespace))
    }
}

/// Everything extracted from one shipment instruction document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// 0 when the document carries no readable id.
    pub shipment_id: i64,
    pub doc_lang: Option<Language>,
    pub instruction_type: Option<InstructionType>,
    pub car_id: String,
    pub driver_name: String,
    pub container: String,
    pub chassis: String,
    pub tank_details: String,
    pub general_remark: String,
    /// Document order, which is also the order the driver works through them.
    pub tasks: Vec<TaskSection>,
    pub warnings: Vec<ParseWarning>,
    /// SHA-256 of the extracted text.
    pub source_fingerprint: String,

    // Assigned once the shipment is linked in storage.
    pub driver_id: Option<String>,
    pub shipment_doc_id: Option<i64>,
}

impl Shipment {
    /// How many header fields were successfully extracted.
    pub fn coverage(&self) -> (usize, usize) {
        let total = 9;
        let filled = [
            self.shipment_id != 0,
            self.doc_lang.is_some(),
            self.instruction_type.is_some(),
            !self.car_id.is_empty(),
            !self.driver_name.is_empty(),
            !self.container.is_empty(),
            !self.chassis.is_empty(),
            !self.tank_details.is_empty(),
            !self.general_remark.is_empty(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, total)
    }
}

/// Extract the text of the PDF at `path` and parse it.
///
/// Fails only when no usable text could be extracted; every other problem
/// ends up in [`Shipment::warnings`].
pub fn parse_shipment(
    path: &Path,
    extraction: &ExtractionSection,
    dictionary: &Dictionary,
    options: &ParserOptions,
) -> Result<Shipment, ExtractError> {
    let span = tracing::info_span!("shipment", path = %path.display());
    let _guard = span.enter();

    let text = extract::extract_text(path, extraction)?;
    Ok(parse_shipment_text(&text, dictionary, options))
}

/// Parse already-extracted, layout-preserved document text.
pub fn parse_shipment_text(text: &str, dictionary: &Dictionary, options: &ParserOptions) -> Shipment {
    let mut shipment = Shipment {
        source_fingerprint: extract::fingerprint(text),
        ..Shipment::default()
    };

    let cut = header::ColumnCut::new(options.column_gap);
    let after_title = header::detect_instruction(&mut shipment, text, dictionary);
    header::detect_shipment_id(&mut shipment, after_title, options, &cut);
    // Vendor fields can sit above the id line, so this pass starts from the top again.
    let task_text = header::scan_delivery_details(&mut shipment, text, dictionary, &cut);

    let mut tasks = Vec::new();
    for mut section in segment::split_sections(task_text, dictionary) {
        if !section.is_well_formed() {
            debug!(
                task_type = %section.task_type,
                lines = section.lines.len(),
                first = %section.lines[0],
                "Discarding section"
            );
            continue;
        }
        section.shipment_id = shipment.shipment_id;
        fields::parse_details(&mut section, tasks.len(), dictionary, &mut shipment.warnings);
        tasks.push(section);
    }
    shipment.tasks = tasks;

    let (filled, total) = shipment.coverage();
    info!(
        filled,
        total,
        shipment_id = shipment.shipment_id,
        instruction = ?shipment.instruction_type,
        language = ?shipment.doc_lang,
        tasks = shipment.tasks.len(),
        warnings = shipment.warnings.len(),
        "Parsed shipment"
    );

    shipment
}
