use std::time::Duration;

use anyhow::{anyhow, Result};
use core_graphics::event::*;
use core_graphics::event_source::*;
use core_graphics::geometry::*;
use core_graphics::window::*;
use image::{Rgb, RgbImage};

use crate::logger;
use crate::types::{Point, Rect};
use super::{Platform, Pointer, Screen};

pub struct DarwinPlatform;

impl Platform for DarwinPlatform {
    fn name(&self) -> &'static str { "darwin" }

    fn screen(&self) -> Box<dyn Screen> {
        Box::new(DarwinScreen)
    }

    fn pointer(&self) -> Box<dyn Pointer> {
        Box::new(DarwinPointer)
    }
}

fn event_source() -> Result<CGEventSource> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| anyhow!("cannot create HID event source (Accessibility permission?)"))
}

struct DarwinScreen;

impl Screen for DarwinScreen {
    fn grab(&mut self, rect: &Rect) -> Result<RgbImage> {
        let cg_rect = CGRect::new(
            &CGPoint::new(rect.left() as f64, rect.top() as f64),
            &CGSize::new(rect.width() as f64, rect.height() as f64),
        );
        let image = create_image(
            cg_rect,
            kCGWindowListOptionOnScreenOnly,
            kCGNullWindowID,
            kCGWindowImageNominalResolution,
        )
        .ok_or_else(|| anyhow!("screen capture failed (Screen Recording permission?)"))?;

        let bpr = image.bytes_per_row();
        let width = image.width() as u32;
        let height = image.height() as u32;
        let data = image.data();
        let bytes = data.bytes();

        // CGImage rows are BGRA, possibly padded past width*4
        let frame = RgbImage::from_fn(width, height, |x, y| {
            let idx = y as usize * bpr + x as usize * 4;
            Rgb([bytes[idx + 2], bytes[idx + 1], bytes[idx]])
        });
        if frame.dimensions() != (rect.width() as u32, rect.height() as u32) {
            logger::warn_p("darwin", &format!(
                "capture is {}x{}, expected {}x{}",
                width, height, rect.width(), rect.height()
            ));
        }
        Ok(frame)
    }
}

struct DarwinPointer;

impl Pointer for DarwinPointer {
    fn position(&mut self) -> Result<Point> {
        let event = CGEvent::new(event_source()?).map_err(|_| anyhow!("cannot read pointer position"))?;
        let loc = event.location();
        Ok(Point::new(loc.x.round() as i32, loc.y.round() as i32))
    }

    fn move_to(&mut self, p: Point) -> Result<()> {
        let event = CGEvent::new_mouse_event(
            event_source()?,
            CGEventType::MouseMoved,
            CGPoint::new(p.x as f64, p.y as f64),
            CGMouseButton::Left,
        )
        .map_err(|_| anyhow!("cannot create move event to ({}, {})", p.x, p.y))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn click(&mut self, shift: bool) -> Result<()> {
        let here = self.position()?;
        let point = CGPoint::new(here.x as f64, here.y as f64);
        let flags = if shift { CGEventFlags::CGEventFlagShift } else { CGEventFlags::CGEventFlagNull };

        for kind in [CGEventType::LeftMouseDown, CGEventType::LeftMouseUp] {
            let event = CGEvent::new_mouse_event(event_source()?, kind, point, CGMouseButton::Left)
                .map_err(|_| anyhow!("cannot create click event at ({}, {})", here.x, here.y))?;
            event.set_flags(flags);
            event.post(CGEventTapLocation::HID);
            std::thread::sleep(Duration::from_millis(15));
        }
        Ok(())
    }
}
