//! Placeholder location and template filling

use std::borrow::Cow;
use std::collections::HashMap;

use crate::records::PopError;
use crate::scan::find_all;
use crate::{Result, SagomaError};

/// Wrap a field name in its placeholder token, `{name}`.
fn placeholder_token(field: &str) -> String {
    format!("{{{field}}}")
}

/// One placeholder instance in the template text:
/// `template[start..end] == "{field}"`, offsets in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub field: String,
    pub start: usize,
    pub end: usize,
}

/// A template with every placeholder occurrence located up front.
///
/// Construction scans the text once per field name and sorts the combined
/// occurrence list by start offset; the engine is immutable afterwards and
/// can fill any number of records.
#[derive(Debug)]
pub struct TemplateEngine {
    text: String,
    occurrences: Vec<Occurrence>,
}

impl TemplateEngine {
    /// Scan `text` for the placeholder of every field name.
    ///
    /// A field with no occurrence is silently ignored; a template in which
    /// *no* field occurs at all is rejected with
    /// [`SagomaError::NoPlaceholdersFound`].
    pub fn new(text: String, field_names: &[String]) -> Result<Self> {
        let mut occurrences = Vec::new();
        for field in field_names {
            let token = placeholder_token(field);
            occurrences.extend(find_all(&text, &token).map(|(start, end)| Occurrence {
                field: field.clone(),
                start,
                end,
            }));
        }
        occurrences.sort_by_key(|occ| occ.start);

        // a field name containing '{' can make one token a substring of
        // another; keep the earliest of any overlapping pair so the
        // literal slices between occurrences stay well formed
        let mut end = 0;
        occurrences.retain(|occ| {
            if occ.start < end {
                return false;
            }
            end = occ.end;
            true
        });

        if occurrences.is_empty() {
            return Err(SagomaError::NoPlaceholdersFound {
                expected: field_names.to_vec(),
            });
        }

        Ok(Self { text, occurrences })
    }

    /// The raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All placeholder occurrences, sorted ascending by start offset.
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Fill the template once, pulling one value per placeholder from
    /// `provider` (typically [`RecordSource::pop`][crate::RecordSource::pop]).
    ///
    /// The returned iterator yields the literal text before each
    /// occurrence, the provided value at each occurrence, and the tail
    /// after the last one; concatenating the `Ok` fragments gives the
    /// filled document. An exhausted provider degrades to empty values; a
    /// provider reporting a missing field aborts the pass with
    /// [`SagomaError::MissingPlaceholder`].
    pub fn fill<P>(&self, provider: P) -> Fill<'_, P>
    where
        P: FnMut(&str) -> std::result::Result<String, PopError>,
    {
        Fill {
            engine: self,
            provider,
            next: 0,
            cursor: 0,
            at_value: false,
            done: false,
            seen: HashMap::new(),
        }
    }
}

/// One fill pass over a template: a finite, one-shot fragment stream.
///
/// Alternates literal template slices with provided values. Fuses after
/// the tail fragment or after yielding an error.
pub struct Fill<'a, P> {
    engine: &'a TemplateEngine,
    provider: P,
    /// Index of the next occurrence to substitute
    next: usize,
    /// Byte offset of the first template byte not yet emitted
    cursor: usize,
    /// False: emit the literal up to the next occurrence; true: emit the
    /// next occurrence's value
    at_value: bool,
    done: bool,
    /// Values already pulled this pass, reused when the template repeats
    /// a placeholder
    seen: HashMap<&'a str, String>,
}

impl<'a, P> Iterator for Fill<'a, P>
where
    P: FnMut(&str) -> std::result::Result<String, PopError>,
{
    type Item = Result<Cow<'a, str>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.at_value {
            // literal slice up to the next occurrence, or the tail
            let item = match self.engine.occurrences.get(self.next) {
                Some(occ) => {
                    self.at_value = true;
                    &self.engine.text[self.cursor..occ.start]
                }
                None => {
                    self.done = true;
                    &self.engine.text[self.cursor..]
                }
            };
            return Some(Ok(Cow::Borrowed(item)));
        }

        let occ = &self.engine.occurrences[self.next];
        self.next += 1;
        self.cursor = occ.end;
        self.at_value = false;

        if let Some(value) = self.seen.get(occ.field.as_str()) {
            return Some(Ok(Cow::Owned(value.clone())));
        }

        match (self.provider)(&occ.field) {
            Ok(value) => {
                self.seen.insert(occ.field.as_str(), value.clone());
                Some(Ok(Cow::Owned(value)))
            }
            // table ran out mid-pass: keep the output well formed
            Err(PopError::Exhausted) => Some(Ok(Cow::Borrowed(""))),
            Err(PopError::MissingField { field, remaining }) => {
                self.done = true;
                Some(Err(SagomaError::MissingPlaceholder { field, remaining }))
            }
        }
    }
}
