//! Publish/subscribe bus decoupling data mutation from UI refresh.
//!
//! One `EventBus` instance exists per running viewer and is handed around as
//! `Rc<RefCell<EventBus>>`; there is no ambient global state.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    LoadProgress,
    RowRejected,
    LoadFailed,
    LoadFinished,
    TableReplaced,
    ViewChanged,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// Periodic load progress carrying the cumulative input line count.
    LoadProgress { lines: u64 },
    /// A malformed row was skipped; `line` is 1-based.
    RowRejected { line: u64 },
    /// The load aborted; `line` is the failing input line.
    LoadFailed { line: u64 },
    LoadFinished { rows: usize },
    TableReplaced,
    ViewChanged,
}

impl ViewerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ViewerEvent::LoadProgress { .. } => EventKind::LoadProgress,
            ViewerEvent::RowRejected { .. } => EventKind::RowRejected,
            ViewerEvent::LoadFailed { .. } => EventKind::LoadFailed,
            ViewerEvent::LoadFinished { .. } => EventKind::LoadFinished,
            ViewerEvent::TableReplaced => EventKind::TableReplaced,
            ViewerEvent::ViewChanged => EventKind::ViewChanged,
        }
    }
}

type Listener = Box<dyn FnMut(&ViewerEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(EventKind, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedBus {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn subscribe(&mut self, kind: EventKind, listener: impl FnMut(&ViewerEvent) + 'static) {
        self.listeners.push((kind, Box::new(listener)));
    }

    pub fn publish(&mut self, event: &ViewerEvent) {
        let kind = event.kind();
        for (k, listener) in &mut self.listeners {
            if *k == kind {
                listener(event);
            }
        }
    }
}

pub type SharedBus = Rc<RefCell<EventBus>>;
