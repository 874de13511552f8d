//! Structured output decoding for LLM responses.
//!
//! A model can hand back structured data in two shapes: as function-call
//! arguments, or as JSON somewhere inside free text (often wrapped in prose
//! or code fences). [`StructuredOutput`] names the two shapes and gives them
//! a single decode step; [`decode_response`] tries them in order.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ExtractionError;
use crate::traits::GenerateResponse;

/// The shape a model response carried its structured payload in.
#[derive(Debug, Clone, Copy)]
pub enum StructuredOutput<'a> {
    /// Arguments of a function call, already parsed by the provider.
    FunctionResult(&'a Value),
    /// Free text expected to contain JSON.
    TextJson(&'a str),
}

impl<'a> StructuredOutput<'a> {
    /// Pick the shape of a response: function-call arguments win over text.
    pub fn from_response(response: &'a GenerateResponse) -> Self {
        match &response.structured {
            Some(value) => StructuredOutput::FunctionResult(value),
            None => StructuredOutput::TextJson(&response.content),
        }
    }

    /// The payload as text, for attaching to errors.
    pub fn raw(&self) -> String {
        match self {
            StructuredOutput::FunctionResult(value) => value.to_string(),
            StructuredOutput::TextJson(text) => (*text).to_string(),
        }
    }

    /// Decode the payload as an array of `T`.
    ///
    /// For text, the first top-level JSON array of objects is located and
    /// everything around it is discarded. For function results, either a bare
    /// array or the first array-valued field of an object is used, in the
    /// order the model emitted the fields.
    pub fn decode_array<T: DeserializeOwned>(&self) -> Result<Vec<T>, ExtractionError> {
        let items = match self {
            StructuredOutput::FunctionResult(value) => match value {
                Value::Array(items) => items.clone(),
                Value::Object(map) => map
                    .values()
                    .find_map(|v| v.as_array().cloned())
                    .ok_or_else(|| ExtractionError::NoArray { raw: self.raw() })?,
                _ => return Err(ExtractionError::NoArray { raw: self.raw() }),
            },
            StructuredOutput::TextJson(text) => match find_first_array(text) {
                Some(Ok(items)) => items,
                Some(Err(e)) => {
                    return Err(ExtractionError::Malformed {
                        reason: e.to_string(),
                        raw: self.raw(),
                    })
                }
                None => return Err(ExtractionError::NoArray { raw: self.raw() }),
            },
        };

        tracing::debug!("decoded structured output with {} items", items.len());

        serde_json::from_value(Value::Array(items)).map_err(|e| ExtractionError::Schema {
            reason: e.to_string(),
            raw: self.raw(),
        })
    }
}

/// Decode a whole response as an array of `T`.
///
/// Function-call arguments are tried first. When they carry no usable array
/// and the response also has text, the text is decoded instead; if that fails
/// too, the error carries both payloads.
pub fn decode_response<T: DeserializeOwned>(
    response: &GenerateResponse,
) -> Result<Vec<T>, ExtractionError> {
    let primary = StructuredOutput::from_response(response);
    let err = match primary.decode_array() {
        Ok(items) => return Ok(items),
        Err(e) => e,
    };

    if !matches!(primary, StructuredOutput::FunctionResult(_))
        || response.content.trim().is_empty()
    {
        return Err(err);
    }

    tracing::debug!("function-call arguments unusable, falling back to response text");
    StructuredOutput::TextJson(&response.content)
        .decode_array()
        .map_err(|e| e.with_raw(format!("{}\n{}", primary.raw(), response.content)))
}

/// Locate the first JSON array of objects in free text.
///
/// Candidates are `[` characters followed (after whitespace) by `{` or `]`,
/// which skips bracketed prose such as "[see below]" and the string arrays
/// nested inside answer objects. Parsing stops at the end of the first JSON
/// value, so trailing prose and closing code fences are ignored.
///
/// Returns `None` when there is no candidate at all, and the error from the
/// first candidate when none of them parse.
pub fn find_first_array(text: &str) -> Option<Result<Vec<Value>, serde_json::Error>> {
    let mut first_error = None;

    for (start, _) in text.match_indices('[') {
        let rest = &text[start..];
        let opens_objects = rest[1..]
            .trim_start()
            .chars()
            .next()
            .is_some_and(|c| c == '{' || c == ']');
        if !opens_objects {
            continue;
        }

        match serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()
        {
            Some(Ok(Value::Array(items))) => return Some(Ok(items)),
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            None => {}
        }
    }

    first_error.map(Err)
}
