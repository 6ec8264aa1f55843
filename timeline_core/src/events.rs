//! Outgoing event channels
//!
//! The canvas only emits: hover, click, playback intents and overlay
//! commands go to collaborators through explicitly created channels. The
//! host keeps the receivers; the canvas owns the senders and drops them on
//! detach, after which every receiver reports the stream as finished.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError, TrySendError};

use log::warn;

use crate::item::MediaSource;

/// Identifies an item of a lane
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub lane: String,
    pub title: String,
    /// Position in the lane's date-sorted item list
    pub index: usize,
}

/// The pointer settled over an item
#[derive(Debug, Clone, PartialEq)]
pub struct HoverEvent {
    pub world_x: f64,
    pub world_y: f64,
    pub item: ItemRef,
}

/// What the popup collaborator should do
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    /// Show details for `item` with its anchor at screen `(x, y)`
    Show { item: ItemRef, x: f64, y: f64 },
    /// Keep showing, anchor moved to screen `(x, y)`
    Move { x: f64, y: f64 },
    Hide,
}

/// Play/pause request for the player collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackIntent {
    /// Start the item's media if paused, pause it if playing
    Toggle { item: ItemRef, media: MediaSource },
}

/// Buffering policy of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Keep at most this many undelivered events, dropping newer ones
    Bounded(usize),
    Unbounded,
}

#[derive(Debug)]
enum Tx<T> {
    Bounded(SyncSender<T>),
    Unbounded(Sender<T>),
}

/// Sending half, owned by the canvas
#[derive(Debug)]
pub struct EventSender<T> {
    name: &'static str,
    tx: Tx<T>,
}

impl<T> EventSender<T> {
    /// Returns false when the event was not delivered
    pub fn emit(&self, event: T) -> bool {
        match &self.tx {
            Tx::Bounded(tx) => match tx.try_send(event) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!("{} channel full, event dropped", self.name);
                    false
                }
                Err(TrySendError::Disconnected(_)) => false,
            },
            Tx::Unbounded(tx) => tx.send(event).is_ok(),
        }
    }
}

/// The sending side is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event channel closed")]
pub struct ChannelClosed;

/// Receiving half, kept by the host
#[derive(Debug)]
pub struct EventReceiver<T> {
    rx: Receiver<T>,
}

impl<T> EventReceiver<T> {
    /// Pending events, consumed as they are iterated
    pub fn drain(&self) -> impl Iterator<Item = T> + '_ {
        self.rx.try_iter()
    }

    /// Next pending event; `Err` once the canvas detached and the queue is empty
    pub fn try_next(&self) -> Result<Option<T>, ChannelClosed> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelClosed),
        }
    }
}

pub fn event_channel<T>(name: &'static str, delivery: Delivery) -> (EventSender<T>, EventReceiver<T>) {
    match delivery {
        Delivery::Bounded(capacity) => {
            let (tx, rx) = mpsc::sync_channel(capacity.max(1));
            (EventSender { name, tx: Tx::Bounded(tx) }, EventReceiver { rx })
        }
        Delivery::Unbounded => {
            let (tx, rx) = mpsc::channel();
            (EventSender { name, tx: Tx::Unbounded(tx) }, EventReceiver { rx })
        }
    }
}

/// Senders handed to the canvas at construction
#[derive(Debug)]
pub struct CanvasEmitters {
    pub hover: EventSender<HoverEvent>,
    pub click: EventSender<ItemRef>,
    pub playback: EventSender<PlaybackIntent>,
    pub overlay: EventSender<OverlayCommand>,
}

/// Receivers kept by the host
#[derive(Debug)]
pub struct CanvasEvents {
    pub hover: EventReceiver<HoverEvent>,
    pub click: EventReceiver<ItemRef>,
    pub playback: EventReceiver<PlaybackIntent>,
    pub overlay: EventReceiver<OverlayCommand>,
}

/// Create the canvas channel set
///
/// Hover and overlay traffic is high-frequency and bounded; clicks and
/// playback intents are never dropped.
pub fn canvas_channels(capacity: usize) -> (CanvasEmitters, CanvasEvents) {
    let (hover_tx, hover_rx) = event_channel("hover", Delivery::Bounded(capacity));
    let (click_tx, click_rx) = event_channel("click", Delivery::Unbounded);
    let (playback_tx, playback_rx) = event_channel("playback", Delivery::Unbounded);
    let (overlay_tx, overlay_rx) = event_channel("overlay", Delivery::Bounded(capacity));
    (
        CanvasEmitters {
            hover: hover_tx,
            click: click_tx,
            playback: playback_tx,
            overlay: overlay_tx,
        },
        CanvasEvents {
            hover: hover_rx,
            click: click_rx,
            playback: playback_rx,
            overlay: overlay_rx,
        },
    )
}
