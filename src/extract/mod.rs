//! Filter documentation extractor: single-pass state machine over HTML tokens.
//!
//! A filter section starts at a heading (`h3` by default). The first
//! definition list after the heading holds the filter's parameters; a list
//! nested inside a parameter's description holds that parameter's allowed
//! values. Anything nested deeper is flattened into the enclosing value.

pub mod tokenizer;

use crate::model::{FilterRecord, ParameterRecord};
use tokenizer::{tokenize, Token};
use tracing::{debug, trace, warn};

/// Reason attached to a structural anomaly in the markup.
type Anomaly = &'static str;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("malformed markup at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: Anomaly },
}

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Tag name of the headings that title a filter
    pub heading: String,
    /// Fail on the first structural anomaly instead of skipping it
    pub strict: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            heading: "h3".to_string(),
            strict: false,
        }
    }
}

// -- Public API ---------------------------------------------------------------

/// Extract every documented filter from `markup`, in document order.
pub fn extract(markup: &str, options: &ExtractOptions) -> Result<Vec<FilterRecord>, ExtractError> {
    let mut extractor = Extractor::new(options);
    for token in tokenize(markup) {
        extractor.feed(token)?;
    }
    extractor.finish(markup.len())
}

// -- Extractor state ----------------------------------------------------------

enum State {
    /// Outside any filter section, or past its parameter list
    Scanning,
    /// Inside a heading, accumulating its text
    Heading { text: String },
    /// After a heading, waiting for the parameter list
    Section,
    /// Inside the parameter list of the last filter
    Parameters(ParameterList),
}

#[derive(Default)]
enum Capture {
    #[default]
    Idle,
    Term(String),
    Description(String),
}

/// An entry being defined: a term, then its description.
/// `N` is whatever the entry may own below itself.
struct Entry<N> {
    record: ParameterRecord,
    capture: Capture,
    nested: N,
}

/// A parameter may own one nested list of allowed values.
type ParameterEntry = Entry<Option<ValueList>>;
/// An allowed value owns nothing.
type ValueEntry = Entry<()>;

#[derive(Default)]
struct ParameterList {
    entry: Option<ParameterEntry>,
    /// Depth of lists opened with no parameter to own them
    opaque: usize,
}

#[derive(Default)]
struct ValueList {
    entry: Option<ValueEntry>,
    /// Depth of lists nested below the value list
    opaque: usize,
}

/// Where tags and text inside the parameter list currently land.
enum Level<'a> {
    Opaque,
    Parameter(&'a mut Option<ParameterEntry>),
    Value {
        slot: &'a mut Option<ValueEntry>,
        owner: &'a mut Vec<ParameterRecord>,
        /// Inside a list nested below the value list
        flattened: bool,
    },
}

struct Extractor<'o> {
    options: &'o ExtractOptions,
    state: State,
    filters: Vec<FilterRecord>,
}

impl<'o> Extractor<'o> {
    fn new(options: &'o ExtractOptions) -> Self {
        Self {
            options,
            state: State::Scanning,
            filters: Vec::new(),
        }
    }

    fn feed(&mut self, token: Token<'_>) -> Result<(), ExtractError> {
        let offset = token.offset();
        let outcome = match token {
            Token::Open { name, .. } => self.open(&name),
            Token::Close { name, .. } => self.close(&name),
            Token::Text { text, .. } => {
                self.text(&text);
                Ok(())
            }
        };
        match outcome {
            Ok(()) => Ok(()),
            Err(reason) => self.report(offset, reason),
        }
    }

    fn finish(self, end: usize) -> Result<Vec<FilterRecord>, ExtractError> {
        let outcome = match self.state {
            State::Heading { .. } => Err("heading not closed at end of input"),
            State::Parameters(_) => Err("parameter list not closed at end of input"),
            State::Scanning | State::Section => Ok(()),
        };
        if let Err(reason) = outcome {
            self.report(end, reason)?;
        }
        debug!(filters = self.filters.len(), "extraction finished");
        Ok(self.filters)
    }

    fn report(&self, offset: usize, reason: Anomaly) -> Result<(), ExtractError> {
        if self.options.strict {
            return Err(ExtractError::Malformed { offset, reason });
        }
        warn!(offset, "{}", reason);
        Ok(())
    }

    fn open(&mut self, name: &str) -> Result<(), Anomaly> {
        if name == self.options.heading {
            let previous = std::mem::replace(
                &mut self.state,
                State::Heading {
                    text: String::new(),
                },
            );
            return match previous {
                State::Heading { .. } => Err("heading opened inside a heading"),
                State::Parameters(_) => Err("parameter list not closed before next heading"),
                State::Scanning | State::Section => Ok(()),
            };
        }

        if name == "dl" && matches!(self.state, State::Section) {
            self.state = State::Parameters(ParameterList::default());
            return Ok(());
        }

        let State::Parameters(list) = &mut self.state else {
            return Ok(());
        };
        match name {
            "dl" => list.open_list(),
            "dt" => list.open_term(),
            "dd" => list.open_description(),
            _ => Ok(()),
        }
    }

    fn close(&mut self, name: &str) -> Result<(), Anomaly> {
        if name == self.options.heading {
            let State::Heading { text } = &self.state else {
                return Err("heading closed without being opened");
            };
            let filter = filter_name(text);
            if filter.is_empty() {
                self.state = State::Scanning;
                return Err("heading has no filter name");
            }
            debug!(filter, "filter heading");
            self.filters.push(FilterRecord {
                name: filter.to_string(),
                parameters: Vec::new(),
            });
            self.state = State::Section;
            return Ok(());
        }

        let State::Parameters(list) = &mut self.state else {
            return Ok(());
        };
        match name {
            "dl" => {
                if list.close_list()? {
                    let unfinished = list.entry.is_some();
                    self.state = State::Scanning;
                    if unfinished {
                        return Err("parameter without description at end of list");
                    }
                }
                Ok(())
            }
            "dt" => list.close_term(),
            "dd" => {
                if let Some(parameter) = list.close_description()? {
                    if let Some(filter) = self.filters.last_mut() {
                        trace!(filter = %filter.name, parameter = %parameter.name, "parameter");
                        filter.parameters.push(parameter);
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn text(&mut self, text: &str) {
        match &mut self.state {
            State::Heading { text: heading } => heading.push_str(text),
            State::Parameters(list) => list.push_text(text),
            State::Scanning | State::Section => {}
        }
    }
}

/// Last token of the heading text that can name a filter.
/// Skips trailing glyphs such as a `¶` permalink.
fn filter_name(heading: &str) -> &str {
    heading
        .split_whitespace()
        .rev()
        .find(|t| t.chars().any(|c| c.is_alphanumeric() || c == '_'))
        .unwrap_or_default()
}

// -- Parameter list -----------------------------------------------------------

impl ParameterList {
    fn level(&mut self) -> Level<'_> {
        if self.opaque > 0 {
            return Level::Opaque;
        }
        let nested = matches!(self.entry, Some(Entry { nested: Some(_), .. }));
        if !nested {
            return Level::Parameter(&mut self.entry);
        }
        match &mut self.entry {
            Some(Entry {
                record,
                nested: Some(values),
                ..
            }) => Level::Value {
                slot: &mut values.entry,
                owner: &mut record.allowed_values,
                flattened: values.opaque > 0,
            },
            _ => Level::Opaque,
        }
    }

    fn open_list(&mut self) -> Result<(), Anomaly> {
        if self.opaque > 0 {
            self.opaque += 1;
            return Ok(());
        }
        match &mut self.entry {
            Some(parameter) => match &mut parameter.nested {
                Some(values) => {
                    values.opaque += 1;
                    if values.opaque == 1 {
                        Err("list nested below allowed values")
                    } else {
                        Ok(())
                    }
                }
                None => {
                    parameter.nested = Some(ValueList::default());
                    Ok(())
                }
            },
            None => {
                self.opaque += 1;
                Err("list nested with no parameter to own it")
            }
        }
    }

    /// Returns `true` when the parameter list itself closed.
    fn close_list(&mut self) -> Result<bool, Anomaly> {
        if self.opaque > 0 {
            self.opaque -= 1;
            return Ok(false);
        }
        let Some(parameter) = &mut self.entry else {
            return Ok(true);
        };
        let Some(values) = &mut parameter.nested else {
            return Ok(true);
        };
        if values.opaque > 0 {
            values.opaque -= 1;
            return Ok(false);
        }
        let unfinished = values.entry.is_some();
        parameter.nested = None;
        if unfinished {
            return Err("allowed value without description at end of list");
        }
        Ok(false)
    }

    fn open_term(&mut self) -> Result<(), Anomaly> {
        match self.level() {
            Level::Opaque | Level::Value { flattened: true, .. } => Ok(()),
            Level::Parameter(slot) => begin_term(slot),
            Level::Value { slot, .. } => begin_term(slot),
        }
    }

    fn close_term(&mut self) -> Result<(), Anomaly> {
        match self.level() {
            Level::Opaque | Level::Value { flattened: true, .. } => Ok(()),
            Level::Parameter(slot) => end_term(slot),
            Level::Value { slot, .. } => end_term(slot),
        }
    }

    fn open_description(&mut self) -> Result<(), Anomaly> {
        match self.level() {
            Level::Opaque | Level::Value { flattened: true, .. } => Ok(()),
            Level::Parameter(slot) => begin_description(slot),
            Level::Value { slot, .. } => begin_description(slot),
        }
    }

    /// Returns the parameter finished by this close, if any.
    fn close_description(&mut self) -> Result<Option<ParameterRecord>, Anomaly> {
        match self.level() {
            Level::Opaque | Level::Value { flattened: true, .. } => Ok(None),
            Level::Parameter(slot) => end_description(slot).map(Some),
            Level::Value { slot, owner, .. } => {
                let value = end_description(slot)?;
                owner.push(value);
                Ok(None)
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.level() {
            Level::Opaque => {}
            Level::Parameter(slot) => {
                if let Some(entry) = slot {
                    entry.push_text(text);
                }
            }
            Level::Value { slot, .. } => {
                if let Some(entry) = slot {
                    entry.push_text(text);
                }
            }
        }
    }
}

// -- Entries ------------------------------------------------------------------

impl<N: Default> Entry<N> {
    fn new() -> Self {
        Self {
            record: ParameterRecord::default(),
            capture: Capture::Term(String::new()),
            nested: N::default(),
        }
    }
}

impl<N> Entry<N> {
    /// A further term before the description adds aliases to this entry.
    fn accepts_term(&self) -> bool {
        matches!(self.capture, Capture::Idle)
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.capture {
            Capture::Term(buf) | Capture::Description(buf) => buf.push_str(text),
            Capture::Idle => {}
        }
    }
}

fn begin_term<N: Default>(slot: &mut Option<Entry<N>>) -> Result<(), Anomaly> {
    if let Some(entry) = slot {
        if entry.accepts_term() {
            entry.capture = Capture::Term(String::new());
            return Ok(());
        }
    }
    match slot.replace(Entry::new()) {
        Some(_) => Err("entry replaced before its description closed"),
        None => Ok(()),
    }
}

fn end_term<N>(slot: &mut Option<Entry<N>>) -> Result<(), Anomaly> {
    let Some(entry) = slot else {
        return Err("term closed with no open entry");
    };
    match std::mem::take(&mut entry.capture) {
        Capture::Term(raw) => {
            if entry.record.name.is_empty() {
                entry.record.set_label(&raw);
            } else {
                let mut extra = ParameterRecord::default();
                extra.set_label(&raw);
                entry.record.aliases.push(extra.name);
                entry.record.aliases.extend(extra.aliases);
            }
            Ok(())
        }
        other => {
            entry.capture = other;
            Err("term closed outside a term")
        }
    }
}

fn begin_description<N>(slot: &mut Option<Entry<N>>) -> Result<(), Anomaly> {
    match slot {
        Some(entry) if entry.accepts_term() => {
            entry.capture = Capture::Description(String::new());
            Ok(())
        }
        Some(_) => Err("description opened inside a term or description"),
        None => Err("description with no term"),
    }
}

fn end_description<N>(slot: &mut Option<Entry<N>>) -> Result<ParameterRecord, Anomaly> {
    match slot.take() {
        Some(Entry {
            mut record,
            capture: Capture::Description(text),
            ..
        }) => {
            record.description = text;
            Ok(record)
        }
        other => {
            *slot = other;
            Err("description closed outside a description")
        }
    }
}
