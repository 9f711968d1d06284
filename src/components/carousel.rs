use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::content::CarouselItem;
use crate::error::CarouselError;
use crate::telemetry::{properties, TelemetryPort};

pub const TICK_INTERVAL: Duration = Duration::from_millis(16);
pub const TICK_DELTA: f64 = 0.5;
/// Card width plus the gap to the next card.
pub const ITEM_EXTENT: f64 = 632.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselGeometry {
    pub item_extent: f64,
    pub delta: f64,
    pub tick_interval: Duration,
}

impl Default for CarouselGeometry {
    fn default() -> Self {
        Self {
            item_extent: ITEM_EXTENT,
            delta: TICK_DELTA,
            tick_interval: TICK_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSlot {
    pub key: String,
    pub position: f64,
    pub item: CarouselItem,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarouselSnapshot {
    pub offset: f64,
    pub half_track_width: f64,
    pub ticks: u64,
    pub track: Vec<TrackSlot>,
}

/// Scroll state for the testimonial strip.
///
/// The rendered track holds the item list twice. `offset` stays in
/// `[0, half_track_width)` so the second copy always covers the visible
/// window when the first one scrolls out.
#[derive(Debug, Clone)]
pub struct CarouselEngine {
    items: &'static [CarouselItem],
    geometry: CarouselGeometry,
    offset: f64,
    ticks: u64,
}

impl CarouselEngine {
    pub fn new(items: &'static [CarouselItem], geometry: CarouselGeometry) -> Self {
        Self {
            items,
            geometry,
            offset: 0.0,
            ticks: 0,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn geometry(&self) -> CarouselGeometry {
        self.geometry
    }

    /// Width of one un-duplicated copy of the items.
    pub fn half_track_width(&self) -> f64 {
        self.items.len() as f64 * self.geometry.item_extent
    }

    pub fn tick(&mut self) {
        let half = self.half_track_width();
        if half <= 0.0 {
            return;
        }
        self.ticks += 1;
        self.offset += self.geometry.delta;
        if self.offset >= half {
            self.offset = (self.offset - half) % half;
        }
    }

    /// Jumps to the leading edge of the item at `index`.
    pub fn focus_item(&mut self, index: usize) -> Result<f64, CarouselError> {
        if index >= self.items.len() {
            return Err(CarouselError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.offset = (index as f64 * self.geometry.item_extent) % self.half_track_width();
        Ok(self.offset)
    }

    pub fn item(&self, id: u32) -> Result<&'static CarouselItem, CarouselError> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or(CarouselError::UnknownItem(id))
    }

    /// Reports a click on an item. Scrolling carries on untouched.
    pub fn click_item(
        &self,
        id: u32,
        telemetry: &dyn TelemetryPort,
    ) -> Result<&'static CarouselItem, CarouselError> {
        let item = self.item(id)?;
        telemetry.capture(
            "testimonial_click",
            properties(json!({
                "testimonial_id": item.id,
                "hashtag": item.tag,
            })),
        );
        Ok(item)
    }

    /// The 2x track, originals first, with each slot's position along the strip.
    pub fn track(&self) -> Vec<TrackSlot> {
        let half = self.half_track_width();
        let copies = [("original", 0.0), ("duplicate", half)];
        copies
            .iter()
            .flat_map(|(copy, base)| {
                self.items.iter().enumerate().map(move |(i, item)| TrackSlot {
                    key: format!("{}-{}", copy, item.id),
                    position: base + i as f64 * self.geometry.item_extent,
                    item: item.clone(),
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> CarouselSnapshot {
        CarouselSnapshot {
            offset: self.offset,
            half_track_width: self.half_track_width(),
            ticks: self.ticks,
            track: self.track(),
        }
    }
}

/// Owns the periodic tick task of a mounted carousel.
pub struct CarouselTicker {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CarouselTicker {
    /// Starts ticking `engine` on its configured cadence. Must run inside a tokio runtime.
    pub fn mount(engine: Arc<Mutex<CarouselEngine>>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => engine.lock().await.tick(),
                }
            }
            tracing::debug!("Carousel ticker stopped");
        });
        Self {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Stops the tick task and waits for it to finish. No tick runs after this returns.
    pub async fn unmount(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for CarouselTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
