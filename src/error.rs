use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Could not determine game code")]
    MissingIdentifier,
    #[error("DOM error: {0}")]
    Dom(String),
    #[error("Failed to open websocket: {0}")]
    Connect(String),
    #[error("Failed to send message: {0}")]
    Send(String),
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn describe(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        String::from(err.message())
    } else if let Some(text) = value.as_string() {
        text
    } else {
        format!("{:?}", value)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for ProbeError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ProbeError::Dom(describe(&value))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<ProbeError> for wasm_bindgen::JsValue {
    fn from(err: ProbeError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
