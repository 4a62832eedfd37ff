// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured extraction of the assistant's free-text summary.
//!
//! The summary is scanned line by line. A line whose text before the first
//! colon normalizes to a known label opens that field; following lines that
//! are not labels extend it. The scan is a pure reducer over [`ScanState`]
//! that emits completed `(field, value)` pairs, and [`parse_summary`] folds
//! those into a [`StructuredRecord`]. Parsing never fails: anything it does
//! not recognize degrades to placeholders.

use std::collections::HashMap;

use airgi_core::StructuredRecord;

/// Value of a required field the summary did not provide.
pub const PLACEHOLDER: &str = "No especificado";

/// Title used when the summary, the edited incident, and the description
/// all fail to provide one.
pub const DEFAULT_TITLE: &str = "Incidencia reportada";

/// Appended to a description-derived title that had to be cut.
pub const TRUNCATION_MARKER: &str = "...";

/// The fields a summary may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Title,
    StepsToReproduce,
    ExpectedBehavior,
    ActualBehavior,
    Impact,
    Environment,
    Category,
    Priority,
    ReporterName,
}

impl FieldKey {
    pub const ALL: [FieldKey; 9] = [
        FieldKey::Title,
        FieldKey::StepsToReproduce,
        FieldKey::ExpectedBehavior,
        FieldKey::ActualBehavior,
        FieldKey::Impact,
        FieldKey::Environment,
        FieldKey::Category,
        FieldKey::Priority,
        FieldKey::ReporterName,
    ];

    /// Normalized labels (lower-case, no whitespace, no accents).
    /// The first entry is the label the summary request asks for.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            FieldKey::Title => &["titulosugerido", "suggestedtitle"],
            FieldKey::StepsToReproduce => &["pasosparareproducir", "stepstoreproduce"],
            FieldKey::ExpectedBehavior => &["comportamientoesperado", "expectedbehavior"],
            FieldKey::ActualBehavior => &["comportamientoactual", "actualbehavior"],
            FieldKey::Impact => &["impactodelproblema", "impact"],
            FieldKey::Environment => &["entornopotencial", "environment"],
            FieldKey::Category => &["categoriasugerida", "suggestedcategory"],
            FieldKey::Priority => &["prioridadsugerida", "suggestedpriority"],
            FieldKey::ReporterName => &["nombredelreportador", "reportername"],
        }
    }

    fn from_label(label: &str) -> Option<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.labels().contains(&label))
    }

    /// Later occurrences may replace an earlier value for this field.
    fn is_overwritable(self) -> bool {
        self == FieldKey::ReporterName
    }
}

/// Normalizes the text before a colon into a label candidate.
fn normalize_label(head: &str) -> String {
    head.trim_start()
        .trim_start_matches(['-', '*', '•', '#', ' ', '\t'])
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '*' && *c != '_')
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

/// Splits a labelled line into its field and the value text after the colon.
pub fn match_field(line: &str) -> Option<(FieldKey, &str)> {
    let (head, rest) = line.split_once(':')?;
    let key = FieldKey::from_label(&normalize_label(head))?;
    Some((key, rest.trim_start_matches(['*', '_']).trim()))
}

/// A completed field value emitted by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub key: FieldKey,
    pub value: String,
}

/// Scanner state between lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub cursor: Option<FieldKey>,
    pub buffer: String,
}

impl ScanState {
    /// Consumes one line, returning the next state and the value of the
    /// field it closed, if any.
    pub fn step(self, line: &str) -> (ScanState, Option<Flush>) {
        match match_field(line) {
            Some((key, rest)) => {
                let flushed = self.finish();
                let next = ScanState {
                    cursor: Some(key),
                    buffer: rest.to_string(),
                };
                (next, flushed)
            }
            None => match self.cursor {
                Some(_) => {
                    let mut next = self;
                    next.buffer.push('\n');
                    next.buffer.push_str(line);
                    (next, None)
                }
                None => (self, None),
            },
        }
    }

    /// Closes the open field at end of input.
    pub fn finish(self) -> Option<Flush> {
        let key = self.cursor?;
        let value = self.buffer.trim();
        (!value.is_empty()).then(|| Flush {
            key,
            value: value.to_string(),
        })
    }
}

/// Field values gathered so far.
#[derive(Debug, Clone, Default)]
struct Fields(HashMap<FieldKey, String>);

impl Fields {
    /// First value wins, except for overwritable fields.
    fn apply(&mut self, flush: Flush) {
        if flush.key.is_overwritable() || !self.0.contains_key(&flush.key) {
            self.0.insert(flush.key, flush.value);
        }
    }

    fn take(&mut self, key: FieldKey) -> Option<String> {
        self.0.remove(&key)
    }
}

/// Everything the parser needs besides the summary text.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Title of the incident being edited, if any.
    pub existing_title: Option<String>,
    pub original_description: String,
    /// Display name of the signed-in user.
    pub reporter_name: String,
    pub title_fallback_chars: usize,
}

/// Parses a summary into a structured record. Deterministic and total.
pub fn parse_summary(text: &str, ctx: &ParseContext) -> StructuredRecord {
    let mut fields = Fields::default();
    let mut state = ScanState::default();
    for line in text.lines() {
        let (next, flushed) = state.step(line);
        if let Some(flush) = flushed {
            fields.apply(flush);
        }
        state = next;
    }
    if let Some(flush) = state.finish() {
        fields.apply(flush);
    }

    let mut required = |key| fields.take(key).unwrap_or_else(|| PLACEHOLDER.to_string());
    let steps_to_reproduce = required(FieldKey::StepsToReproduce);
    let expected_behavior = required(FieldKey::ExpectedBehavior);
    let actual_behavior = required(FieldKey::ActualBehavior);
    let impact = required(FieldKey::Impact);

    StructuredRecord {
        title: fields
            .take(FieldKey::Title)
            .unwrap_or_else(|| fallback_title(ctx)),
        steps_to_reproduce,
        expected_behavior,
        actual_behavior,
        impact,
        environment: fields.take(FieldKey::Environment),
        category: fields.take(FieldKey::Category),
        priority: fields.take(FieldKey::Priority),
        reporter_name_hint: fields
            .take(FieldKey::ReporterName)
            .unwrap_or_else(|| ctx.reporter_name.clone()),
    }
}

/// Edited incident's title, then a cut of the description, then the default.
pub fn fallback_title(ctx: &ParseContext) -> String {
    if let Some(title) = ctx.existing_title.as_deref().map(str::trim)
        && !title.is_empty()
    {
        return title.to_string();
    }

    let description = ctx.original_description.trim();
    if description.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let limit = ctx.title_fallback_chars.max(1);
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}{TRUNCATION_MARKER}", head.trim_end())
    } else {
        head
    }
}
