//! Errors raised while wiring the scene into the page.
//!
//! The animation itself cannot fail; only the browser glue can (missing DOM
//! pieces, no 2d context, bad configuration).

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("document has no body")]
    NoBody,
    #[error("2d canvas context unavailable")]
    NoContext,
    #[error("javascript error: {0}")]
    Js(String),
    #[error("invalid scene config: {0}")]
    Config(String),
}

impl From<JsValue> for SetupError {
    fn from(value: JsValue) -> Self {
        SetupError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<SetupError> for JsValue {
    fn from(err: SetupError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(SetupError::NoContext.to_string(), "2d canvas context unavailable");
        assert_eq!(SetupError::Config("bad".into()).to_string(), "invalid scene config: bad");
    }
}
