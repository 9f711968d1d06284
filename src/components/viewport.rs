use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::telemetry::{now_millis, properties, Properties, TelemetryPort};

/// Fraction of a region's area that must be on screen to count as viewed.
pub const VIEW_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationHandle(pub u64);

/// Runtime primitive that reports how much of a region intersects the viewport.
#[cfg_attr(test, mockall::automock)]
pub trait RegionObserver: Send + Sync {
    fn observe(&self, region: &str) -> ObservationHandle;
    fn unobserve(&self, handle: ObservationHandle);
}

/// Keys that already fired their one-shot event during this page lifetime.
#[derive(Debug, Default, Clone)]
pub struct ViewedSet {
    keys: HashSet<String>,
}

impl ViewedSet {
    /// True the first time `key` is seen.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Emits `<region>_section_view` at most once per region per page.
///
/// Intersection reports from the observer and component-local "seen" hooks
/// both go through the same [`ViewedSet`], so a section never reports twice.
pub struct ViewportTracker {
    observer: Option<Arc<dyn RegionObserver>>,
    subscriptions: HashMap<String, ObservationHandle>,
    viewed: ViewedSet,
    threshold: f64,
    telemetry: Arc<dyn TelemetryPort>,
}

impl ViewportTracker {
    /// Subscribes every region. With no observer the tracker stays passive and the page works as usual.
    pub fn attach(
        regions: &[&str],
        observer: Option<Arc<dyn RegionObserver>>,
        telemetry: Arc<dyn TelemetryPort>,
    ) -> Self {
        let mut subscriptions = HashMap::new();
        match &observer {
            Some(observer) => {
                for region in regions {
                    if subscriptions.contains_key(*region) {
                        continue;
                    }
                    subscriptions.insert(region.to_string(), observer.observe(region));
                }
            }
            None => {
                tracing::warn!("Viewport observation unsupported, section view tracking disabled");
            }
        }
        Self {
            observer,
            subscriptions,
            viewed: ViewedSet::default(),
            threshold: VIEW_THRESHOLD,
            telemetry,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_some()
    }

    pub fn is_observing(&self, region: &str) -> bool {
        self.subscriptions.contains_key(region)
    }

    pub fn has_viewed(&self, key: &str) -> bool {
        self.viewed.contains(key)
    }

    /// Handles an intersection report. Returns whether a view event fired.
    pub fn on_intersection(&mut self, region: &str, ratio: f64) -> bool {
        if !self.subscriptions.contains_key(region) {
            return false;
        }
        if ratio.is_nan() || ratio < self.threshold {
            return false;
        }
        self.record_view(region)
    }

    /// Marks a section as viewed from any source. Returns whether the event fired.
    pub fn record_view(&mut self, region: &str) -> bool {
        self.unsubscribe(region);
        let fired = self.record_once(
            region,
            &format!("{}_section_view", region),
            properties(json!({
                "section": region,
                "timestamp": now_millis(),
            })),
        );
        if !fired {
            tracing::debug!("Section {} already reported, skipping", region);
        }
        fired
    }

    /// Captures `event` the first time `key` is recorded during this page lifetime.
    pub fn record_once(&mut self, key: &str, event: &str, props: Properties) -> bool {
        if !self.viewed.insert(key) {
            return false;
        }
        self.telemetry.capture(event, props);
        true
    }

    /// Drops every remaining subscription, for page teardown.
    pub fn detach(&mut self) {
        let regions: Vec<String> = self.subscriptions.keys().cloned().collect();
        for region in regions {
            self.unsubscribe(&region);
        }
    }

    fn unsubscribe(&mut self, region: &str) {
        if let Some(handle) = self.subscriptions.remove(region) {
            if let Some(observer) = &self.observer {
                observer.unobserve(handle);
            }
        }
    }
}

/// Observation primitive for a remote renderer: the browser does the
/// intersection math and reports ratios back, this keeps the live handles.
#[derive(Default)]
pub struct RendererObserver {
    next: AtomicU64,
    live: Mutex<HashMap<ObservationHandle, String>>,
}

impl RendererObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observed(&self) -> Vec<String> {
        let live = match self.live.lock() {
            Ok(live) => live,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut regions: Vec<String> = live.values().cloned().collect();
        regions.sort();
        regions
    }
}

impl RegionObserver for RendererObserver {
    fn observe(&self, region: &str) -> ObservationHandle {
        let handle = ObservationHandle(self.next.fetch_add(1, Ordering::Relaxed));
        match self.live.lock() {
            Ok(mut live) => live.insert(handle, region.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(handle, region.to_string()),
        };
        handle
    }

    fn unobserve(&self, handle: ObservationHandle) {
        match self.live.lock() {
            Ok(mut live) => live.remove(&handle),
            Err(poisoned) => poisoned.into_inner().remove(&handle),
        };
    }
}
