//! Event dispatch module
//!
//! This module provides the [`EventBus`], the one cross-cutting mechanism of the
//! pre-system: widgets publish named notifications and other widgets subscribe to
//! react, without either side holding a reference to the other.
//!
//! The bus is deliberately small:
//! - A fixed, closed vocabulary of event-type names ([`EVENT_TYPES`]), validated
//!   at subscribe time.
//! - Three dispatch tiers ([`Tier`]): before, normal, after. A publish runs all
//!   before-tier subscribers, then normal, then after. Within a tier, dispatch
//!   follows registration order.
//! - Replace-on-resubscribe: registering a subscriber id again for the same event
//!   type drops the previous registration from every tier first, so one publish
//!   never invokes the same subscriber twice.
//!
//! There is no queuing, no threading, and no isolation between subscribers: a
//! failing callback aborts the rest of that publish and the error propagates to
//! the caller of [`EventBus::publish`].

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The closed vocabulary of event-type names.
///
/// Enumerated once at startup and never extended at runtime; subscribing to a
/// name outside this list is a usage error caught during development.
pub const EVENT_TYPES: [&str; 27] = [
    "select_instrument",
    "select_station",
    "return_position",
    "confirm_sensors",
    "change_config_path",
    "change_data_path_local",
    "change_data_path_server",
    "button_svepa",
    "button_seasave",
    "focus_out_series",
    "focus_out_station",
    "focus_out_depth",
    "focus_out_cruise",
    "set_next_series",
    "series_step",
    "load_svepa",
    "missing_input",
    "input_ok",
    "select_default_user",
    "add_components",
    "update_components",
    "toggle_tail",
    "update_server_info",
    "set_water_depth",
    "close_seasave",
    "button_goto_processing_simple",
    "button_goto_processing_advanced",
];

/// Check whether `name` belongs to the event-type vocabulary.
pub fn is_known_event(name: &str) -> bool {
    EVENT_TYPES.contains(&name)
}

/// Errors raised by [`EventBus`] registration.
#[derive(Debug, Error)]
pub enum EventError {
    /// The event-type name is not in [`EVENT_TYPES`].
    #[error("unknown event type: {0}")]
    InvalidEventType(String),
}

/// Dispatch tier of a subscription.
///
/// A single publish runs `Before` subscribers first, then `Normal`, then
/// `After`. Diagnostic counting ([`EventBus::subscriber_count`]) covers the
/// `Normal` tier only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Before,
    Normal,
    After,
}

impl Tier {
    /// All tiers in dispatch order.
    pub const DISPATCH_ORDER: [Tier; 3] = [Tier::Before, Tier::Normal, Tier::After];

    fn index(self) -> usize {
        match self {
            Tier::Before => 0,
            Tier::Normal => 1,
            Tier::After => 2,
        }
    }
}

/// Payload handed to every subscriber of a publish.
///
/// `payload` is the positional datum of the notification (a station name, an
/// instrument id, a depth...); `extra` carries optional named values, preserving
/// the order the publisher added them in.
#[derive(Debug, Clone, Default)]
pub struct EventData {
    pub payload: Value,
    pub extra: IndexMap<String, Value>,
}

impl EventData {
    /// Create event data with the given payload and no extras.
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
            extra: IndexMap::new(),
        }
    }

    /// Attach a named extra value (builder style).
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The payload as a string slice, if it is a JSON string.
    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_str()
    }
}

/// Subscriber callback signature.
///
/// An `Err` aborts the remaining callbacks of the current publish.
pub type Callback = Box<dyn Fn(&EventData) -> Result<()>>;

struct Subscription {
    id: String,
    callback: Callback,
}

/// Registry mapping event type to subscriptions, in three dispatch tiers.
///
/// Construct one bus at application start and pass it to every component that
/// publishes or subscribes; there is no global instance, so each test gets a
/// fresh bus.
///
/// # Usage
///
/// ```
/// use ctd_pre_system::events::{EventBus, EventData, Tier};
///
/// let mut bus = EventBus::new();
/// bus.subscribe("select_instrument", "instrument_frame", Tier::Normal, |data| {
///     tracing::info!("instrument selected: {:?}", data.payload);
///     Ok(())
/// })
/// .unwrap();
///
/// bus.publish("select_instrument", &EventData::new("SBE09")).unwrap();
/// ```
pub struct EventBus {
    // One registry per tier, indexed by Tier::index. Vec keeps registration
    // order within a tier.
    tiers: [IndexMap<String, Vec<Subscription>>; 3],
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            tiers: [IndexMap::new(), IndexMap::new(), IndexMap::new()],
        }
    }

    /// Register `callback` under `subscriber_id` for `event_type` in `tier`.
    ///
    /// Any previous registration of `subscriber_id` for this event type, in any
    /// tier, is removed first, so one publish invokes the subscriber at most
    /// once. Registration order within the tier is dispatch order.
    ///
    /// # Errors
    ///
    /// [`EventError::InvalidEventType`] if `event_type` is not in
    /// [`EVENT_TYPES`]; nothing is registered or removed in that case.
    pub fn subscribe<F>(
        &mut self,
        event_type: &str,
        subscriber_id: impl Into<String>,
        tier: Tier,
        callback: F,
    ) -> Result<(), EventError>
    where
        F: Fn(&EventData) -> Result<()> + 'static,
    {
        if !is_known_event(event_type) {
            return Err(EventError::InvalidEventType(event_type.to_string()));
        }

        let subscriber_id = subscriber_id.into();
        self.remove_existing(event_type, &subscriber_id);

        tracing::debug!(
            event_type,
            subscriber = %subscriber_id,
            ?tier,
            "registering subscriber"
        );

        self.tiers[tier.index()]
            .entry(event_type.to_string())
            .or_default()
            .push(Subscription {
                id: subscriber_id,
                callback: Box::new(callback),
            });

        Ok(())
    }

    /// Invoke every subscriber registered for `event_type`, tier by tier.
    ///
    /// Publishing a type with zero subscribers is a no-op. The first callback
    /// error aborts the remaining callbacks and propagates to the caller; the
    /// bus performs no isolation between subscribers.
    pub fn publish(&self, event_type: &str, data: &EventData) -> Result<()> {
        for tier in Tier::DISPATCH_ORDER {
            let Some(subscriptions) = self.tiers[tier.index()].get(event_type) else {
                continue;
            };
            for sub in subscriptions {
                (sub.callback)(data).with_context(|| {
                    format!("subscriber '{}' failed handling '{}'", sub.id, event_type)
                })?;
            }
        }
        Ok(())
    }

    /// Number of normal-tier subscribers for `event_type`. Diagnostics only.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.tiers[Tier::Normal.index()]
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Drop any registration of `subscriber_id` for `event_type`, in all tiers.
    fn remove_existing(&mut self, event_type: &str, subscriber_id: &str) {
        for registry in &mut self.tiers {
            if let Some(subscriptions) = registry.get_mut(event_type) {
                subscriptions.retain(|sub| {
                    if sub.id == subscriber_id {
                        tracing::debug!(
                            event_type,
                            subscriber = %subscriber_id,
                            "removing previous registration"
                        );
                        false
                    } else {
                        true
                    }
                });
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Callbacks are not Debug; list event types and subscriber ids per tier instead.
impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("EventBus");
        for tier in Tier::DISPATCH_ORDER {
            let registry: IndexMap<&str, Vec<&str>> = self.tiers[tier.index()]
                .iter()
                .map(|(event, subs)| {
                    (event.as_str(), subs.iter().map(|s| s.id.as_str()).collect())
                })
                .collect();
            match tier {
                Tier::Before => dbg.field("before", &registry),
                Tier::Normal => dbg.field("normal", &registry),
                Tier::After => dbg.field("after", &registry),
            };
        }
        dbg.finish()
    }
}
