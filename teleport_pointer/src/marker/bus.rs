use std::collections::{BTreeMap, VecDeque};

use super::{DestinationEvent, MarkerEvent, MarkerEventKind, MarkerKinds};
use crate::{marker_log, pointer::PointerId, zones::ZoneId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmitterId(u32);

/// What sits behind an emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmitterOwner {
    Pointer(PointerId),
    Zone(ZoneId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subscriber {
    Zone(ZoneId),
    TeleportRouter,
}

/// Entries kept in a delivery history before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Push onto a bounded history, dropping the oldest entries past `limit`.
pub(crate) fn push_bounded<T>(history: &mut VecDeque<T>, entry: T, limit: usize) {
    if limit == 0 {
        return;
    }
    while history.len() >= limit {
        history.pop_front();
    }
    history.push_back(entry);
}

/// Publish/subscribe hub for destination marker events.
///
/// Events are queued on `publish` and delivered FIFO by whoever drains the bus
/// with `next_event`. Subscriptions are per (subscriber, emitter) and filtered
/// by event kind. Delivered events are kept in a bounded history for observers;
/// a limit of 0 turns the history off.
#[derive(Debug)]
pub struct MarkerBus {
    next_emitter: u32,
    emitters: BTreeMap<EmitterId, EmitterOwner>,
    subscriptions: BTreeMap<Subscriber, BTreeMap<EmitterId, MarkerKinds>>,
    queue: VecDeque<MarkerEvent>,
    dispatched: VecDeque<MarkerEvent>,
    history_limit: usize,
}

impl Default for MarkerBus {
    fn default() -> Self {
        Self {
            next_emitter: 0,
            emitters: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            queue: VecDeque::new(),
            dispatched: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MarkerBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit;
        while self.dispatched.len() > limit {
            self.dispatched.pop_front();
        }
    }

    pub fn register_emitter(&mut self, owner: EmitterOwner) -> EmitterId {
        let id = EmitterId(self.next_emitter);
        self.next_emitter += 1;
        self.emitters.insert(id, owner);
        marker_log!(DEBUG, "registered emitter {:?} for {:?}", id, owner);
        id
    }

    /// Drop the emitter and every subscription to it. Already queued events stay queued.
    pub fn remove_emitter(&mut self, emitter: EmitterId) -> bool {
        for subscriptions in self.subscriptions.values_mut() {
            subscriptions.remove(&emitter);
        }
        self.emitters.remove(&emitter).is_some()
    }

    pub fn owner(&self, emitter: EmitterId) -> Option<EmitterOwner> {
        self.emitters.get(&emitter).copied()
    }

    pub fn emitters(&self) -> impl Iterator<Item = (EmitterId, EmitterOwner)> + '_ {
        self.emitters.iter().map(|(id, owner)| (*id, *owner))
    }

    /// Returns false when the emitter is unknown.
    pub fn subscribe(&mut self, subscriber: Subscriber, emitter: EmitterId, kinds: MarkerKinds) -> bool {
        if !self.emitters.contains_key(&emitter) {
            return false;
        }
        *self
            .subscriptions
            .entry(subscriber)
            .or_default()
            .entry(emitter)
            .or_insert_with(MarkerKinds::empty) |= kinds;
        true
    }

    /// Unsubscribing something that was never subscribed is a no-op.
    pub fn unsubscribe(&mut self, subscriber: Subscriber, emitter: EmitterId) -> bool {
        let removed = self
            .subscriptions
            .get_mut(&subscriber)
            .map_or(false, |subscriptions| subscriptions.remove(&emitter).is_some());
        if self
            .subscriptions
            .get(&subscriber)
            .map_or(false, |subscriptions| subscriptions.is_empty())
        {
            self.subscriptions.remove(&subscriber);
        }
        removed
    }

    pub fn unsubscribe_all(&mut self, subscriber: Subscriber) -> usize {
        self.subscriptions
            .remove(&subscriber)
            .map_or(0, |subscriptions| subscriptions.len())
    }

    pub fn is_subscribed(&self, subscriber: Subscriber, emitter: EmitterId, kind: MarkerEventKind) -> bool {
        self.subscriptions
            .get(&subscriber)
            .and_then(|subscriptions| subscriptions.get(&emitter))
            .map_or(false, |kinds| kinds.contains(kind.into()))
    }

    pub fn subscription_count(&self, subscriber: Subscriber) -> usize {
        self.subscriptions
            .get(&subscriber)
            .map_or(0, |subscriptions| subscriptions.len())
    }

    pub fn publish(&mut self, emitter: EmitterId, kind: MarkerEventKind, payload: DestinationEvent) {
        marker_log!(
            TRACE,
            "{:?} {:?} target={:?} allow={}",
            emitter,
            kind,
            payload.target,
            payload.allow_teleport
        );
        self.queue.push_back(MarkerEvent {
            emitter,
            kind,
            payload,
        });
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Pop the oldest queued event and the subscribers that should receive it.
    pub fn next_event(&mut self) -> Option<(MarkerEvent, Vec<Subscriber>)> {
        let event = self.queue.pop_front()?;
        let subscribers = self.subscribers_for(&event);
        push_bounded(&mut self.dispatched, event, self.history_limit);
        Some((event, subscribers))
    }

    fn subscribers_for(&self, event: &MarkerEvent) -> Vec<Subscriber> {
        let kind = MarkerKinds::from(event.kind);
        self.subscriptions
            .iter()
            .filter(|(_, subscriptions)| {
                subscriptions
                    .get(&event.emitter)
                    .map_or(false, |kinds| kinds.contains(kind))
            })
            .map(|(subscriber, _)| *subscriber)
            .collect()
    }

    /// Events delivered since the last call, in delivery order, at most
    /// `history_limit` of the most recent.
    pub fn take_dispatched(&mut self) -> Vec<MarkerEvent> {
        self.dispatched.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{marker::SourceIndex, scene::TargetHandle};
    use cgmath::vec3;

    fn payload(target: u64) -> DestinationEvent {
        DestinationEvent::from_hit(
            &crate::scene::RaycastHit {
                point: vec3(0.0, 0.0, -2.0),
                normal: vec3(0.0, 1.0, 0.0),
                target: TargetHandle(target),
                distance: 2.0,
            },
            vec3(0.0, 0.0, -2.0),
            SourceIndex(0),
            true,
        )
    }

    #[test]
    fn test_dispatched_history_keeps_most_recent_events() {
        let mut bus = MarkerBus::new();
        bus.set_history_limit(4);
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        for target in 0..10 {
            bus.publish(pointer, MarkerEventKind::Enter, payload(target));
            while bus.next_event().is_some() {}
        }

        let targets: Vec<_> = bus
            .take_dispatched()
            .iter()
            .filter_map(|event| event.payload.target)
            .collect();
        assert_eq!(
            targets,
            vec![TargetHandle(6), TargetHandle(7), TargetHandle(8), TargetHandle(9)]
        );

        bus.set_history_limit(0);
        bus.publish(pointer, MarkerEventKind::Exit, payload(9));
        assert!(bus.next_event().is_some());
        assert!(bus.take_dispatched().is_empty());
    }

    #[test]
    fn test_events_reach_only_matching_subscriptions() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let zone_a = Subscriber::Zone(ZoneId(0));
        let zone_b = Subscriber::Zone(ZoneId(1));

        assert!(bus.subscribe(zone_a, pointer, MarkerKinds::all()));
        assert!(bus.subscribe(Subscriber::TeleportRouter, pointer, MarkerKinds::SET));
        bus.publish(pointer, MarkerEventKind::Enter, payload(1));
        bus.publish(pointer, MarkerEventKind::Set, payload(1));

        let (_, enter_subscribers) = bus.next_event().unwrap();
        assert_eq!(enter_subscribers, vec![zone_a]);
        let (_, set_subscribers) = bus.next_event().unwrap();
        assert_eq!(set_subscribers, vec![zone_a, Subscriber::TeleportRouter]);
        assert!(!bus.is_subscribed(zone_b, pointer, MarkerEventKind::Set));
        assert!(bus.next_event().is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let zone = Subscriber::Zone(ZoneId(3));

        assert!(!bus.unsubscribe(zone, pointer));
        bus.subscribe(zone, pointer, MarkerKinds::ENTER);
        assert!(bus.unsubscribe(zone, pointer));
        assert!(!bus.unsubscribe(zone, pointer));
        assert_eq!(bus.unsubscribe_all(zone), 0);
        assert_eq!(bus.subscription_count(zone), 0);
    }

    #[test]
    fn test_removing_emitter_drops_its_subscriptions() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let zone = Subscriber::Zone(ZoneId(0));
        bus.subscribe(zone, pointer, MarkerKinds::all());

        assert!(bus.remove_emitter(pointer));
        assert!(!bus.remove_emitter(pointer));
        assert_eq!(bus.subscription_count(zone), 0);
        assert!(!bus.subscribe(zone, pointer, MarkerKinds::all()));
    }

    #[test]
    fn test_dispatch_history_is_fifo() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        bus.publish(pointer, MarkerEventKind::Exit, payload(1));
        bus.publish(pointer, MarkerEventKind::Enter, payload(2));
        while bus.next_event().is_some() {}

        let kinds: Vec<_> = bus.take_dispatched().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MarkerEventKind::Exit, MarkerEventKind::Enter]);
        assert!(bus.take_dispatched().is_empty());
    }
}
