use crate::core::{DbError, Result, Value};
use crate::dac::DataRecord;
use crate::schema::JSON_COLUMN;

/// Merge include bodies into a document body as extra top-level members.
///
/// `body` must be a JSON object; each include is emitted as `"name":raw`
/// with absent includes written as `null`. The raw include text is trusted to
/// be valid JSON, it comes straight from another structure's body column.
pub fn merge_document(body: &str, includes: &[(&str, Option<&str>)]) -> Result<String> {
    let trimmed = body.trim();
    let open = trimmed
        .strip_suffix('}')
        .filter(|rest| rest.starts_with('{'))
        .ok_or_else(|| DbError::CodecError("document body is not a JSON object".to_string()))?;

    if includes.is_empty() {
        return Ok(trimmed.to_string());
    }

    let mut merged = String::with_capacity(trimmed.len() + includes.len() * 16);
    merged.push_str(open);
    let mut needs_comma = open.trim_end() != "{";

    for (name, raw) in includes {
        if needs_comma {
            merged.push(',');
        }
        merged.push_str(&serde_json::to_string(name)?);
        merged.push(':');
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => merged.push_str(raw),
            None => merged.push_str("null"),
        }
        needs_comma = true;
    }

    merged.push('}');
    Ok(merged)
}

/// Turn one listing row into a single JSON document.
///
/// The `Json` column is the body; every other column is an include. A second
/// column matching the body name is rejected rather than overwriting it.
pub fn materialize(record: &DataRecord) -> Result<String> {
    let mut body = None;
    let mut includes = Vec::new();

    for (column, value) in record.columns() {
        if column.eq_ignore_ascii_case(JSON_COLUMN) {
            if body.is_some() {
                return Err(DbError::CodecError(format!(
                    "column '{}' repeats the document body column",
                    column
                )));
            }
            body = Some(text_of(column, value)?);
        } else {
            includes.push((column, text_of(column, value)?));
        }
    }

    let body = body
        .flatten()
        .ok_or_else(|| DbError::CodecError("row has no document body".to_string()))?;
    merge_document(body, &includes)
}

fn text_of<'r>(column: &str, value: &'r Value) -> Result<Option<&'r str>> {
    match value {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(DbError::CodecError(format!(
            "column '{}' holds {} instead of a JSON body",
            column,
            other.type_name()
        ))),
    }
}
