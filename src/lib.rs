//! In-page WebSocket probe.
//!
//! Loaded into a page that carries a `websocket-test-container` element, it
//! opens one socket to `/ws/game/<code>/`, sends a single `ping` and writes
//! every open/message/close/error event into a status banner and a
//! timestamped transcript inside the container.
//!
//! The session logic ([`session::ProbeSession`]) and the panel state
//! ([`panel::Panel`]) are target independent. Only [`client`] and [`view`]
//! talk to the browser.

pub mod config;
pub mod error;
pub mod message;
pub mod panel;
pub mod session;
pub mod target;

#[cfg(target_arch = "wasm32")]
pub mod client;
#[cfg(target_arch = "wasm32")]
pub mod view;


pub use config::ProbeConfig;
pub use error::ProbeError;
pub use message::{ClientMessage, Inbound, ServerMessage};
pub use panel::{Clock, Level, Panel, Timestamp};
pub use session::{CloseInfo, ProbeSession, SessionState, Transport};
pub use target::PageLocation;

#[cfg(target_arch = "wasm32")]
pub use browser::{probe_page, run_probe, start};

#[cfg(target_arch = "wasm32")]
mod browser {
    use log::{debug, error, Level};
    use std::cell::RefCell;
    use std::panic;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Event, Window};

    use crate::client::{EventClient, Message};
    use crate::view::{BrowserClock, PanelView};
    use crate::{CloseInfo, PageLocation, Panel, ProbeConfig, ProbeError, ProbeSession};

    // every event goes through `update` so the page always reflects the state
    struct LiveProbe {
        session: RefCell<ProbeSession>,
        view: PanelView,
    }

    impl LiveProbe {
        fn update<T>(&self, f: impl FnOnce(&mut ProbeSession) -> T) -> T {
            let out = f(&mut self.session.borrow_mut());
            self.view.render(self.session.borrow().panel());
            out
        }

        fn connect(
            self: &Rc<Self>,
            window: &Window,
            explicit: Option<&str>,
        ) -> Result<(), ProbeError> {
            self.update(|s| s.begin());
            let location = PageLocation::from_window(window)?;
            let address = self.update(|s| s.prepare(&location, explicit))?;

            let mut client = EventClient::new(&address)?;

            let probe = self.clone();
            client.set_on_connection(Some(Box::new(move |c: &EventClient| {
                probe.update(|s| s.on_open(c));
            })));

            let probe = self.clone();
            client.set_on_message(Some(Box::new(move |_: &EventClient, message: Message| {
                probe.update(|s| match message {
                    Message::Text(text) => s.on_text(&text),
                    Message::Binary(bytes) => s.on_binary(bytes.len()),
                });
            })));

            let probe = self.clone();
            client.set_on_close(Some(Box::new(move |info: CloseInfo| {
                probe.update(|s| s.on_close(&info));
            })));

            let probe = self.clone();
            client.set_on_error(Some(Box::new(move |description: Option<String>| {
                probe.update(|s| s.on_error(description.as_deref()));
            })));

            debug!("socket created for {}", client.url);
            Ok(())
        }
    }

    fn browser() -> Result<(Window, Document), ProbeError> {
        let window =
            web_sys::window().ok_or_else(|| ProbeError::Dom("no global window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| ProbeError::Dom("window has no document".to_string()))?;
        Ok((window, document))
    }

    /// Returns `Ok(false)` without touching the page when the container
    /// is missing.
    pub fn probe_page(config: ProbeConfig) -> Result<bool, ProbeError> {
        let (window, document) = browser()?;
        let container = match document.get_element_by_id(&config.container_id) {
            Some(container) => container,
            None => {
                debug!("no #{} on this page, probe idle", config.container_id);
                return Ok(false);
            }
        };

        let view = PanelView::attach(&document, &container)?;
        let explicit = container.get_attribute(&config.identifier_attribute);
        let probe = Rc::new(LiveProbe {
            session: RefCell::new(ProbeSession::new(config, Panel::new(Box::new(BrowserClock)))),
            view,
        });
        probe.update(|_| ());

        match probe.connect(&window, explicit.as_deref()) {
            // already on the panel
            Ok(()) | Err(ProbeError::MissingIdentifier) => {}
            Err(err) => probe.update(|s| s.fail_setup(&err)),
        }
        Ok(true)
    }

    #[wasm_bindgen]
    pub fn run_probe(container_id: Option<String>) -> Result<bool, JsValue> {
        let mut config = ProbeConfig::default();
        if let Some(id) = container_id {
            config = config.with_container_id(&id);
        }
        Ok(probe_page(config)?)
    }

    fn run_logged() {
        if let Err(err) = probe_page(ProbeConfig::default()) {
            error!("{}", err);
        }
    }

    pub(crate) fn document_is_loading(document: &Document) -> bool {
        document.ready_state() == "loading"
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        panic::set_hook(Box::new(console_error_panic_hook::hook));
        // console_log and log macros are used instead of println!
        // so that messages can be seen in the browser console
        if console_log::init_with_level(Level::Debug).is_err() {
            debug!("logger already initialized");
        }

        let (_, document) = browser()?;
        if document_is_loading(&document) {
            let onload = Closure::wrap(Box::new(move |_: Event| {
                run_logged();
            }) as Box<dyn FnMut(Event)>);
            document
                .add_event_listener_with_callback("DOMContentLoaded", onload.as_ref().unchecked_ref())?;
            onload.forget();
        } else {
            run_logged();
        }
        Ok(())
    }
}
