use web_sys::{Document, Element};

use crate::error::ProbeError;
use crate::panel::{Clock, Panel, Timestamp};

pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now(&self) -> Timestamp {
        let date = js_sys::Date::new_0();
        Timestamp {
            hours: date.get_hours(),
            minutes: date.get_minutes(),
            seconds: date.get_seconds(),
        }
    }
}

pub struct PanelView {
    status: Element,
    transcript: Element,
}

impl PanelView {
    pub fn attach(document: &Document, container: &Element) -> Result<Self, ProbeError> {
        let status = document.create_element("div")?;
        let transcript = document.create_element("pre")?;
        transcript.set_class_name("mt-3 p-3 bg-light");
        transcript.set_attribute("style", "max-height: 200px; overflow: auto")?;

        container.append_child(&status)?;
        container.append_child(&transcript)?;
        Ok(Self { status, transcript })
    }

    pub fn render(&self, panel: &Panel) {
        let status = panel.status();
        self.status.set_class_name(status.level.class_name());
        self.status.set_text_content(Some(&status.text));

        self.transcript
            .set_text_content(Some(&panel.transcript_text()));
        self.transcript
            .set_scroll_top(self.transcript.scroll_height());
    }

    pub fn status_element(&self) -> &Element {
        &self.status
    }

    pub fn transcript_element(&self) -> &Element {
        &self.transcript
    }
}
