/// Line parser for ability blocks in XCOM 2 localization files.
///
/// The format has no end-of-block marker. A block starts at a header and runs
/// until the next header or the end of the file:
///
/// ```text
/// [M1_ReturnFire X2AbilityTemplate]
/// +LocFriendlyName="Return Fire"
/// +LocLongDescription="Fires back automatically." // shown in the armory
/// LocHelpText=Unquoted values are fine too
/// ```
///
/// Parsing is a fold over the lines with an explicit two-state machine,
/// [`ParseState::Outside`] and [`ParseState::InsideBlock`]; the open block
/// travels inside the state rather than in a mutable variable beside it. The
/// parser is pure: it never fails, never touches the file system, and the same
/// lines always produce the same records.
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::results::AbilityRecord;

static HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[(\w+)\s+X2AbilityTemplate\]").expect("header pattern is valid")
});

static PROPERTY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\+?(Loc\w*)\s*=(.*)$").expect("property pattern is valid")
});

/// The localized fields the parser extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocField {
    FriendlyName,
    LongDescription,
    HelpText,
    PromotionPopupText,
    FlyoverText,
}

impl LocField {
    /// Maps a property key to a field, ignoring case. Unknown keys map to `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "locfriendlyname" => Some(LocField::FriendlyName),
            "loclongdescription" => Some(LocField::LongDescription),
            "lochelptext" => Some(LocField::HelpText),
            "locpromotionpopuptext" => Some(LocField::PromotionPopupText),
            "locflyovertext" => Some(LocField::FlyoverText),
            _ => None,
        }
    }

    /// Stores `value` in the matching field of `record`
    pub fn apply(self, record: &mut AbilityRecord, value: String) {
        let slot = match self {
            LocField::FriendlyName => &mut record.friendly_name,
            LocField::LongDescription => &mut record.description,
            LocField::HelpText => &mut record.help_text,
            LocField::PromotionPopupText => &mut record.promotion_text,
            LocField::FlyoverText => &mut record.flyover_text,
        };
        *slot = value;
    }
}

/// Parser state between lines
#[derive(Debug, Clone, PartialEq)]
pub enum ParseState {
    /// Before the first header
    Outside,
    /// Collecting properties for the block opened by the last header
    InsideBlock(AbilityRecord),
}

impl ParseState {
    /// Consumes one line, pushing a finished record to `out` when a new header closes a block
    pub fn feed(self, line: &str, source_file: &Path, out: &mut Vec<AbilityRecord>) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return self;
        }

        if let Some(template_name) = match_header(line) {
            self.finish(out);
            return ParseState::InsideBlock(AbilityRecord::new(template_name, source_file));
        }

        match self {
            ParseState::Outside => ParseState::Outside,
            ParseState::InsideBlock(mut record) => {
                if let Some((field, value)) = match_property(line) {
                    field.apply(&mut record, value);
                }
                ParseState::InsideBlock(record)
            }
        }
    }

    /// Emits the open block, if any
    pub fn finish(self, out: &mut Vec<AbilityRecord>) {
        if let ParseState::InsideBlock(record) = self {
            if !record.template_name.is_empty() {
                out.push(record);
            }
        }
    }
}

/// Returns the template name if `line` is a block header
pub fn match_header(line: &str) -> Option<&str> {
    HEADER_REGEX
        .captures(line.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns the field and cleaned value if `line` is a recognized property line
pub fn match_property(line: &str) -> Option<(LocField, String)> {
    let caps = PROPERTY_REGEX.captures(line.trim())?;
    let field = LocField::from_key(caps.get(1)?.as_str())?;
    let value = clean_value(caps.get(2)?.as_str());
    Some((field, value))
}

/// Strips a trailing `//` comment, surrounding whitespace, and one pair of double quotes
pub fn clean_value(raw: &str) -> String {
    let without_comment = match raw.find("//") {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let trimmed = without_comment.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.to_string()
}

/// Parses a sequence of lines into ability records
pub fn parse<I, S>(lines: I, source_file: &Path) -> Vec<AbilityRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records = Vec::new();
    let state = lines
        .into_iter()
        .fold(ParseState::Outside, |state, line| {
            state.feed(line.as_ref(), source_file, &mut records)
        });
    state.finish(&mut records);
    records
}
