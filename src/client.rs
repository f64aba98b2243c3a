use log::trace;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

use crate::error::{describe, ProbeError};
use crate::session::{CloseInfo, Transport};

#[derive(Debug, Clone)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

/// Clones share the same socket and callback slots.
#[derive(Clone)]
pub struct EventClient {
    pub url: Rc<String>,
    connection: WebSocket,
    on_error: Rc<RefCell<Option<Box<dyn Fn(Option<String>)>>>>,
    on_connection: Rc<RefCell<Option<Box<dyn Fn(&EventClient)>>>>,
    on_message: Rc<RefCell<Option<Box<dyn Fn(&EventClient, Message)>>>>,
    on_close: Rc<RefCell<Option<Box<dyn Fn(CloseInfo)>>>>,
}

impl EventClient {
    pub fn new(url: &str) -> Result<Self, ProbeError> {
        let connection =
            WebSocket::new(url).map_err(|err| ProbeError::Connect(describe(&err)))?;
        // Arraybuffer keeps binary frames synchronous, no FileReader round trip
        connection.set_binary_type(web_sys::BinaryType::Arraybuffer);

        let client = Self {
            url: Rc::new(url.to_string()),
            connection,
            on_error: Rc::new(RefCell::new(None)),
            on_connection: Rc::new(RefCell::new(None)),
            on_message: Rc::new(RefCell::new(None)),
            on_close: Rc::new(RefCell::new(None)),
        };

        let client_ref = client.clone();
        let onopen_callback = Closure::wrap(Box::new(move |_: JsValue| {
            if let Some(f) = &*client_ref.on_connection.borrow() {
                f.as_ref()(&client_ref);
            }
        }) as Box<dyn FnMut(JsValue)>);
        client
            .connection
            .set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
        onopen_callback.forget();

        let client_ref = client.clone();
        let onerror_callback = Closure::wrap(Box::new(move |e: Event| {
            // Browsers usually hand over a bare Event here, not an ErrorEvent
            let description = e
                .dyn_ref::<ErrorEvent>()
                .map(|e| e.message())
                .filter(|message| !message.is_empty());
            if let Some(f) = &*client_ref.on_error.borrow() {
                f.as_ref()(description);
            }
        }) as Box<dyn FnMut(Event)>);
        client
            .connection
            .set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
        onerror_callback.forget();

        let client_ref = client.clone();
        let onclose_callback = Closure::wrap(Box::new(move |e: CloseEvent| {
            let info = CloseInfo {
                was_clean: e.was_clean(),
                code: e.code(),
                reason: e.reason(),
            };
            if let Some(f) = &*client_ref.on_close.borrow() {
                f.as_ref()(info);
            }
        }) as Box<dyn FnMut(CloseEvent)>);
        client
            .connection
            .set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
        onclose_callback.forget();

        let client_ref = client.clone();
        let onmessage_callback = Closure::wrap(Box::new(move |e: MessageEvent| {
            let message = if let Ok(abuf) = e.data().dyn_into::<js_sys::ArrayBuffer>() {
                trace!("message event, received arraybuffer: {:?}", abuf);
                Message::Binary(js_sys::Uint8Array::new(&abuf).to_vec())
            } else if let Some(txt) = e.data().as_string() {
                Message::Text(txt)
            } else {
                // Not text and not an arraybuffer, show what it looks like
                Message::Text(format!("{:?}", e.data()))
            };
            if let Some(f) = &*client_ref.on_message.borrow() {
                f.as_ref()(&client_ref, message);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        // set message event handler on WebSocket
        client
            .connection
            .set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
        // forget the callback to keep it alive
        onmessage_callback.forget();

        Ok(client)
    }

    pub fn set_on_error(&mut self, f: Option<Box<dyn Fn(Option<String>)>>) {
        *self.on_error.borrow_mut() = f;
    }
    pub fn set_on_connection(&mut self, f: Option<Box<dyn Fn(&EventClient)>>) {
        *self.on_connection.borrow_mut() = f;
    }

    pub fn set_on_message(&mut self, f: Option<Box<dyn Fn(&EventClient, Message)>>) {
        *self.on_message.borrow_mut() = f;
    }

    pub fn set_on_close(&mut self, f: Option<Box<dyn Fn(CloseInfo)>>) {
        *self.on_close.borrow_mut() = f;
    }

    pub fn send_string(&self, message: &str) -> Result<(), ProbeError> {
        self.connection
            .send_with_str(message)
            .map_err(|err| ProbeError::Send(describe(&err)))
    }
}

impl Transport for EventClient {
    fn send_text(&self, text: &str) -> Result<(), ProbeError> {
        self.send_string(text)
    }
}
