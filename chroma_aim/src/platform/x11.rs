// THEORY:
// X11 backends: whole-screen capture, display geometry and the F8 stop key.
//
// Capture is a `GetImage` of the root window in Z-pixmap format. Only the
// common 24/32-bit true-color layout is accepted; its BGRX pixels are repacked
// as RGB at this boundary so the rest of the crate never sees server byte
// order. The request blocks, so it goes through `BlockingGrab`.
//
// The stop key is read with `QueryKeymap` on a dedicated watcher thread. A
// stalled server can hang that thread, never the runtime.

use crate::core_modules::frame::Frame;
use crate::devices::{DisplayCapture, DisplayGeometry, StopFlag};
use crate::error::CaptureError;
use crate::platform::blocking::BlockingGrab;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, ImageFormat, ImageOrder, Keysym, Window};
use x11rb::rust_connection::RustConnection;

/// Keysym of the F8 key.
pub const XK_F8: Keysym = 0xFFC5;

/// Captures the root window of the default screen.
pub struct X11Display {
    conn: Arc<RustConnection>,
    root: Window,
    width: u16,
    height: u16,
    in_flight: BlockingGrab,
}

impl X11Display {
    pub fn connect() -> anyhow::Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("failed to connect to the X server")?;
        let screen = &conn.setup().roots[screen_num];
        let (root, width, height) = (screen.root, screen.width_in_pixels, screen.height_in_pixels);
        tracing::info!(width, height, "connected to X11 display");

        Ok(Self {
            conn: Arc::new(conn),
            root,
            width,
            height,
            in_flight: BlockingGrab::new(),
        })
    }

    /// Shares the connection, e.g. with an `X11Hotkey`.
    pub fn connection(&self) -> Arc<RustConnection> {
        Arc::clone(&self.conn)
    }

    fn grab(conn: &RustConnection, root: Window, width: u16, height: u16) -> Result<Frame, CaptureError> {
        let reply = conn
            .get_image(ImageFormat::Z_PIXMAP, root, 0, 0, width, height, u32::MAX)
            .map_err(|e| CaptureError::Backend(e.to_string()))?
            .reply()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        let setup = conn.setup();
        let bits_per_pixel = setup
            .pixmap_formats
            .iter()
            .find(|f| f.depth == reply.depth)
            .map(|f| f.bits_per_pixel)
            .unwrap_or(0);
        if bits_per_pixel != 32 || reply.depth < 24 {
            return Err(CaptureError::UnsupportedFormat {
                depth: reply.depth,
                bits_per_pixel,
            });
        }
        if setup.image_byte_order != ImageOrder::LSB_FIRST {
            return Err(CaptureError::Backend("MSB-first image byte order is not supported".into()));
        }

        // Z-pixmap, 32 bpp, LSB first: each pixel is B, G, R, X.
        let pixel_count = width as usize * height as usize;
        if reply.data.len() < pixel_count * 4 {
            return Err(CaptureError::DimensionMismatch {
                expected: pixel_count * 4,
                actual: reply.data.len(),
            });
        }

        Frame::from_rgb(width as u32, height as u32, bgrx_to_rgb(&reply.data, pixel_count))
    }
}

/// Repacks `pixel_count` BGRX pixels as tightly packed RGB.
fn bgrx_to_rgb(data: &[u8], pixel_count: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for px in data.chunks_exact(4).take(pixel_count) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    rgb
}

#[async_trait]
impl DisplayCapture for X11Display {
    async fn capture_frame(&mut self) -> Result<Frame, CaptureError> {
        let conn = Arc::clone(&self.conn);
        let (root, width, height) = (self.root, self.width, self.height);
        self.in_flight
            .run(move || Self::grab(&conn, root, width, height))
            .await
    }
}

impl DisplayGeometry for X11Display {
    fn screen_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }
}

/// A key whose presses are turned into stop requests.
pub struct X11Hotkey {
    conn: Arc<RustConnection>,
    keycode: u8,
}

impl X11Hotkey {
    pub fn new(conn: Arc<RustConnection>, keysym: Keysym) -> anyhow::Result<Self> {
        let (min, max) = (conn.setup().min_keycode, conn.setup().max_keycode);
        let mapping = conn
            .get_keyboard_mapping(min, max - min + 1)
            .context("failed to request the keyboard mapping")?
            .reply()
            .context("failed to read the keyboard mapping")?;

        let per_keycode = mapping.keysyms_per_keycode as usize;
        if per_keycode == 0 {
            return Err(anyhow!("the X server reported an empty keyboard mapping"));
        }
        let index = mapping
            .keysyms
            .iter()
            .position(|&sym| sym == keysym)
            .ok_or_else(|| anyhow!("keysym {keysym:#x} is not mapped to any key"))?;
        let keycode = min + (index / per_keycode) as u8;
        tracing::debug!(keysym, keycode, "stop hotkey resolved");

        Ok(Self { conn, keycode })
    }

    pub fn f8(conn: Arc<RustConnection>) -> anyhow::Result<Self> {
        Self::new(conn, XK_F8)
    }

    fn is_pressed(&self) -> anyhow::Result<bool> {
        let keys = self.conn.query_keymap()?.reply()?.keys;
        Ok(key_is_down(&keys, self.keycode))
    }

    /// Polls the key every `period` on its own thread and raises `stop` each
    /// time the key goes down.
    pub fn watch(self, stop: StopFlag, period: Duration) -> anyhow::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("x11-hotkey".into())
            .spawn(move || {
                let mut latch = PressLatch::default();
                let mut failing = false;
                loop {
                    match self.is_pressed() {
                        Ok(down) => {
                            failing = false;
                            if latch.update(down) {
                                tracing::debug!(keycode = self.keycode, "stop hotkey pressed");
                                stop.raise();
                            }
                        }
                        Err(e) => {
                            if !failing {
                                tracing::warn!("keymap query failed: {e:#}");
                            }
                            failing = true;
                        }
                    }
                    std::thread::sleep(period);
                }
            })
            .context("failed to start the hotkey thread")
    }
}

fn key_is_down(keys: &[u8; 32], keycode: u8) -> bool {
    keys[(keycode / 8) as usize] & (1 << (keycode % 8)) != 0
}

/// Turns a sampled key state into press events, so holding the key raises a
/// single request.
#[derive(Debug, Default)]
struct PressLatch {
    down: bool,
}

impl PressLatch {
    fn update(&mut self, down: bool) -> bool {
        let pressed = down && !self.down;
        self.down = down;
        pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::Color;

    #[test]
    fn bgrx_is_repacked_as_rgb() {
        let data = [201, 0, 141, 0xFF, 1, 2, 3, 0, 9, 9, 9, 9];
        let rgb = bgrx_to_rgb(&data, 2);
        assert_eq!(rgb, vec![141, 0, 201, 3, 2, 1]);

        let frame = Frame::from_rgb(2, 1, rgb).unwrap();
        assert_eq!(frame.pixel(0, 0), Some(Color::new(141, 0, 201)));
    }

    #[test]
    fn keymap_bits() {
        let mut keys = [0u8; 32];
        keys[9] = 0b0000_0100; // keycode 74
        assert!(key_is_down(&keys, 74));
        assert!(!key_is_down(&keys, 73));
        assert!(!key_is_down(&keys, 75));
    }

    #[test]
    fn holding_the_key_raises_once() {
        let mut latch = PressLatch::default();
        let fired: Vec<bool> = [false, true, true, true, false, true]
            .into_iter()
            .map(|down| latch.update(down))
            .collect();
        assert_eq!(fired, vec![false, true, false, false, false, true]);
    }
}
