use std::time::Duration;

use kestrel::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[macro_use]
extern crate riker_testkit;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[derive(Clone, Debug)]
pub struct Ping;

#[actor(TestProbe, Ping)]
struct Responder {
    probe: Option<TestProbe>,
}

impl ActorFactory for Responder {
    fn create() -> Self {
        Responder { probe: None }
    }
}

impl Actor for Responder {
    type Msg = ResponderMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        self.receive(ctx, msg, sender);
    }
}

impl Receive<TestProbe> for Responder {
    type Msg = ResponderMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        self.probe = Some(msg);
    }
}

impl Receive<Ping> for Responder {
    type Msg = ResponderMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Ping, _sender: Sender) {
        self.probe.as_mut().unwrap().0.event(());
    }
}

struct Parent;

impl ActorFactory for Parent {
    fn create() -> Self {
        Parent
    }
}

impl Actor for Parent {
    type Msg = ();

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        ctx.actor_of::<Responder>("child_a").unwrap();
        ctx.actor_of::<Responder>("child_b").unwrap();
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

#[test]
fn select_named_child() {
    let sys = ActorSystem::new().unwrap();
    let parent = sys.actor_of::<Parent>("select-parent").unwrap();
    std::thread::sleep(Duration::from_millis(10));

    let child_a: BasicActorRef = parent.children().find(|c| c.name() == "child_a").unwrap();
    let (probe, mut listen) = probe();
    child_a.try_tell(ResponderMsg::TestProbe(TestProbe(probe)), None).unwrap();

    let sel = sys.select("/user/select-parent/child_a").unwrap();
    sel.try_tell(ResponderMsg::Ping(Ping), None);

    p_assert_eq!(listen, ());
}

#[test]
fn select_all_children_broadcasts() {
    let sys = ActorSystem::new().unwrap();
    let parent = sys.actor_of::<Parent>("broadcast-parent").unwrap();
    std::thread::sleep(Duration::from_millis(10));

    let (probe_a, mut listen_a) = probe();
    let (probe_b, mut listen_b) = probe();
    for child in parent.children() {
        let msg = if child.name() == "child_a" {
            TestProbe(probe_a.clone())
        } else {
            TestProbe(probe_b.clone())
        };
        child.try_tell(ResponderMsg::TestProbe(msg), None).unwrap();
    }

    let sel = sys.select("/user/broadcast-parent/*").unwrap();
    sel.try_tell(ResponderMsg::Ping(Ping), None);

    p_assert_eq!(listen_a, ());
    p_assert_eq!(listen_b, ());
}

#[test]
fn select_invalid_path_is_rejected() {
    let sys = ActorSystem::new().unwrap();
    assert!(sys.select("/user/@@@").is_err());
}
