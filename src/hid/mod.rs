//! HID output: the transport seam used by actions and a report-based
//! implementation of it.

pub mod consumer;
pub mod keyboard;
pub mod keys;
pub mod mouse;


use crate::error::Error;
use consumer::ConsumerReport;
use keyboard::KeyboardReport;
use keys::Key;
use mouse::{MouseButton, MouseReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Consumer(ConsumerReport),
}

impl HidReport {
    /// Serialise the report body. Returns bytes written, 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        match self {
            HidReport::Keyboard(report) => report.serialize(buf),
            HidReport::Mouse(report) => report.serialize(buf),
            HidReport::Consumer(report) => report.serialize(buf),
        }
    }
}

/// Keyboard and mouse primitives a button step can issue.
pub trait HidTransport {
    /// Whether a host is currently listening.
    fn is_connected(&self) -> bool;

    /// Hold a key until [`HidTransport::release_all`].
    fn press(&mut self, key: Key);

    fn release_all(&mut self);

    /// Press and immediately release a key.
    fn write(&mut self, key: Key);

    /// Type text character by character.
    fn print(&mut self, text: &str);

    fn mouse_click(&mut self, button: MouseButton);

    /// Scroll vertically (`wheel`, positive = up) and horizontally (`pan`, positive = right).
    fn mouse_scroll(&mut self, wheel: i8, pan: i8);

    fn mouse_move(&mut self, dx: i8, dy: i8);
}

impl<T: HidTransport + ?Sized> HidTransport for &mut T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
    fn press(&mut self, key: Key) {
        (**self).press(key)
    }
    fn release_all(&mut self) {
        (**self).release_all()
    }
    fn write(&mut self, key: Key) {
        (**self).write(key)
    }
    fn print(&mut self, text: &str) {
        (**self).print(text)
    }
    fn mouse_click(&mut self, button: MouseButton) {
        (**self).mouse_click(button)
    }
    fn mouse_scroll(&mut self, wheel: i8, pan: i8) {
        (**self).mouse_scroll(wheel, pan)
    }
    fn mouse_move(&mut self, dx: i8, dy: i8) {
        (**self).mouse_move(dx, dy)
    }
}

/// Endpoint that carries finished reports to the host (USB IN endpoint,
/// BLE HID service...).
pub trait ReportSink {
    fn is_connected(&self) -> bool;

    fn send(&mut self, report: &HidReport) -> Result<(), Error>;
}

/// [`HidTransport`] built on boot-protocol reports.
///
/// Keeps the held keyboard state so that every press produces a complete
/// report. Reports are dropped while the sink is disconnected.
pub struct ReportTransport<S> {
    sink: S,
    keyboard: KeyboardReport,
    media_held: bool,
}

impl<S: ReportSink> ReportTransport<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            keyboard: KeyboardReport::empty(),
            media_held: false,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Currently held keyboard state.
    pub fn keyboard(&self) -> &KeyboardReport {
        &self.keyboard
    }

    fn send(&mut self, report: HidReport) {
        if !self.sink.is_connected() {
            debug!("HID: not connected, report dropped");
            return;
        }
        if self.sink.send(&report).is_err() {
            warn!("HID: report send failed");
        }
    }

    fn send_keyboard(&mut self) {
        let report = self.keyboard;
        self.send(HidReport::Keyboard(report));
    }

    fn release(&mut self, key: Key) {
        match key {
            Key::Usage(usage) => {
                self.keyboard.release_usage(usage);
                self.send_keyboard();
            }
            Key::Modifier(modifier) => {
                self.keyboard.release_modifier(modifier);
                self.send_keyboard();
            }
            Key::Media(_) => {
                self.media_held = false;
                self.send(HidReport::Consumer(ConsumerReport::empty()));
            }
        }
    }
}

impl<S: ReportSink> HidTransport for ReportTransport<S> {
    fn is_connected(&self) -> bool {
        self.sink.is_connected()
    }

    fn press(&mut self, key: Key) {
        match key {
            Key::Usage(usage) => {
                if !self.keyboard.press_usage(usage) {
                    warn!("HID: rollover, usage {} ignored", usage);
                    return;
                }
                self.send_keyboard();
            }
            Key::Modifier(modifier) => {
                self.keyboard.press_modifier(modifier);
                self.send_keyboard();
            }
            Key::Media(usage) => {
                self.media_held = true;
                self.send(HidReport::Consumer(ConsumerReport::new(usage)));
            }
        }
    }

    fn release_all(&mut self) {
        self.keyboard = KeyboardReport::empty();
        self.send_keyboard();
        if self.media_held {
            self.media_held = false;
            self.send(HidReport::Consumer(ConsumerReport::empty()));
        }
    }

    fn write(&mut self, key: Key) {
        self.press(key);
        self.release(key);
    }

    fn print(&mut self, text: &str) {
        for c in text.chars() {
            let Some((usage, shift)) = keys::ascii(c) else {
                debug!("HID: no usage for character, skipped");
                continue;
            };
            let mut report = self.keyboard;
            if shift {
                report.press_modifier(keys::Modifier::LeftShift);
            }
            if !report.press_usage(usage) {
                continue;
            }
            self.send(HidReport::Keyboard(report));
            self.send_keyboard();
        }
    }

    fn mouse_click(&mut self, button: MouseButton) {
        self.send(HidReport::Mouse(MouseReport::pressed(button)));
        self.send(HidReport::Mouse(MouseReport::empty()));
    }

    fn mouse_scroll(&mut self, wheel: i8, pan: i8) {
        self.send(HidReport::Mouse(MouseReport::scroll(wheel, pan)));
    }

    fn mouse_move(&mut self, dx: i8, dy: i8) {
        self.send(HidReport::Mouse(MouseReport::motion(dx, dy)));
    }
}
