//! Shared PDF object helpers used by the link annotation walker.

use crate::{FetchError, Result};
use lopdf::{Dictionary, Document, Object};

/// Resolve a value that might be an inline dictionary or a reference to one.
pub fn resolve_dict<'a>(document: &'a Document, value: &'a Object) -> Result<&'a Dictionary> {
    match value.as_reference() {
        Ok(id) => Ok(document.get_object(id)?.as_dict()?),
        Err(_) => Ok(value.as_dict()?),
    }
}

/// Resolve a value that might be an inline array or a reference to one.
pub fn resolve_array<'a>(document: &'a Document, value: &'a Object) -> Result<&'a Vec<Object>> {
    match value.as_reference() {
        Ok(id) => Ok(document.get_object(id)?.as_array()?),
        Err(_) => Ok(value.as_array()?),
    }
}

/// Read a string value for `key`, following an indirect reference if needed.
///
/// Returns `Ok(None)` when the key is absent and an error when the value is
/// present but not a string.
pub fn string_from_dict(
    document: &Document,
    dict: &Dictionary,
    key: &[u8],
) -> Result<Option<String>> {
    let value = match dict.get(key) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let value = match value.as_reference() {
        Ok(id) => document.get_object(id)?,
        Err(_) => value,
    };

    Ok(Some(String::from_utf8_lossy(value.as_str()?).into_owned()))
}

/// Returns `true` when `dict`'s `/Subtype` name equals `subtype`.
///
/// A missing or non-name `/Subtype` is an error.
pub fn has_subtype(dict: &Dictionary, subtype: &[u8]) -> Result<bool> {
    let name = dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .map_err(|_| FetchError::InvalidPdf("annotation without a /Subtype name".into()))?;
    Ok(name == subtype)
}
