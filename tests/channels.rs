use std::time::Duration;

use kestrel::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[macro_use]
extern crate riker_testkit;

#[derive(Clone, Debug)]
pub struct Event(pub String);

struct Subscriber {
    probe: Option<ChannelProbe<(), String>>,
}

impl ActorFactory for Subscriber {
    fn create() -> Self {
        Subscriber { probe: None }
    }
}

#[derive(Clone, Debug)]
enum SubscriberMsg {
    Probe(ChannelProbe<(), String>),
    Event(Event),
}

impl From<ChannelProbe<(), String>> for SubscriberMsg {
    fn from(p: ChannelProbe<(), String>) -> Self {
        SubscriberMsg::Probe(p)
    }
}

impl From<Event> for SubscriberMsg {
    fn from(e: Event) -> Self {
        SubscriberMsg::Event(e)
    }
}

impl Actor for Subscriber {
    type Msg = SubscriberMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            SubscriberMsg::Probe(p) => self.probe = Some(p),
            SubscriberMsg::Event(Event(text)) => {
                self.probe.as_ref().unwrap().event(text);
            }
        }
    }
}

#[test]
fn publish_to_subscriber() {
    let sys = ActorSystem::new().unwrap();

    let chan: ChannelRef<Event> = channel("events", &sys).unwrap();
    let sub = sys.actor_of::<Subscriber>("subscriber").unwrap();

    let (probe, mut listen) = probe();
    sub.tell(probe, None);

    chan.tell(
        Subscribe {
            topic: "topic-a".into(),
            actor: Box::new(sub.clone()),
        },
        None,
    );

    chan.tell(
        Publish {
            topic: "topic-a".into(),
            msg: Event("hello".to_string()),
        },
        None,
    );

    p_assert_eq!(listen, "hello".to_string());
}

#[test]
fn unsubscribed_actor_receives_nothing() {
    let sys = ActorSystem::new().unwrap();

    let chan: ChannelRef<Event> = channel("events-unsub", &sys).unwrap();
    let sub = sys.actor_of::<Subscriber>("subscriber-unsub").unwrap();

    chan.tell(
        Subscribe {
            topic: "topic-a".into(),
            actor: Box::new(sub.clone()),
        },
        None,
    );
    chan.tell(
        Unsubscribe {
            topic: "topic-a".into(),
            actor: Box::new(sub.clone()),
        },
        None,
    );
    chan.tell(
        Publish {
            topic: "topic-a".into(),
            msg: Event("should not arrive".to_string()),
        },
        None,
    );

    // No probe registered means a delivery would panic on unwrap; a short
    // wait with no panic confirms the unsubscribe took effect.
    std::thread::sleep(Duration::from_millis(50));
}

struct DeadLetterListener {
    probe: Option<ChannelProbe<(), ()>>,
}

impl ActorFactory for DeadLetterListener {
    fn create() -> Self {
        DeadLetterListener { probe: None }
    }
}

#[derive(Clone, Debug)]
enum DeadLetterListenerMsg {
    Probe(ChannelProbe<(), ()>),
    DeadLetter(DeadLetter),
}

impl From<ChannelProbe<(), ()>> for DeadLetterListenerMsg {
    fn from(p: ChannelProbe<(), ()>) -> Self {
        DeadLetterListenerMsg::Probe(p)
    }
}

impl From<DeadLetter> for DeadLetterListenerMsg {
    fn from(dl: DeadLetter) -> Self {
        DeadLetterListenerMsg::DeadLetter(dl)
    }
}

impl Actor for DeadLetterListener {
    type Msg = DeadLetterListenerMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            DeadLetterListenerMsg::Probe(p) => self.probe = Some(p),
            DeadLetterListenerMsg::DeadLetter(_) => {
                self.probe.as_ref().unwrap().event(());
            }
        }
    }
}

#[test]
fn tell_after_system_shutdown_does_not_crash() {
    let sys = ActorSystem::new().unwrap();

    let target = sys.actor_of::<Subscriber>("post-shutdown-target").unwrap();

    sys.shutdown();

    // The dispatcher backing `target` stopped accepting work as the last
    // step of shutdown; sending into the stale ref must be absorbed
    // silently rather than panic or block.
    target.tell(Event("too late".to_string()), None);

    std::thread::sleep(Duration::from_millis(20));
}

#[test]
fn dead_letters_receives_undelivered_messages() {
    let sys = ActorSystem::new().unwrap();

    let listener = sys.actor_of::<DeadLetterListener>("dl-listener").unwrap();
    let (probe, mut listen) = probe();
    listener.tell(probe, None);

    sys.dead_letters().tell(
        Subscribe {
            topic: All.into(),
            actor: Box::new(listener.clone()),
        },
        None,
    );

    let target = sys.actor_of::<Subscriber>("target").unwrap();
    sys.stop(&target);
    std::thread::sleep(Duration::from_millis(20));

    // Telling a stopped actor's stale reference routes through dead letters
    // rather than panicking.
    target.tell(Event("too late".to_string()), None);

    p_assert_eq!(listen, ());
}
