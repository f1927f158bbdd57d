#[macro_use]
extern crate riker_testkit;

use std::time::Duration;

use kestrel::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct Panic;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[actor(TestProbe, Panic)]
struct PanicActor;

impl ActorFactory for PanicActor {
    fn create() -> Self {
        PanicActor
    }
}

impl Actor for PanicActor {
    type Msg = PanicActorMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        self.receive(ctx, msg, sender);
    }
}

impl Receive<TestProbe> for PanicActor {
    type Msg = PanicActorMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        msg.0.event(());
    }
}

impl Receive<Panic> for PanicActor {
    type Msg = PanicActorMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Panic, _sender: Sender) {
        panic!("test panic");
    }
}

// Test restart strategy: the supervisor restarts its failed child with no
// backoff, so a message sent right after the panic still reaches a live
// actor at the same path.
#[actor(TestProbe, Panic)]
struct RestartSup {
    actor_to_fail: Option<ActorRef<PanicActorMsg>>,
}

impl ActorFactory for RestartSup {
    fn create() -> Self {
        RestartSup {
            actor_to_fail: None,
        }
    }
}

impl Actor for RestartSup {
    type Msg = RestartSupMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.actor_to_fail = ctx.actor_of::<PanicActor>("actor-to-fail").ok();
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        self.receive(ctx, msg, sender);
    }

    fn supervisor_strategy(&self) -> Strategy {
        Strategy::Restart(Vec::new())
    }
}

impl Receive<TestProbe> for RestartSup {
    type Msg = RestartSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(msg, sender);
    }
}

impl Receive<Panic> for RestartSup {
    type Msg = RestartSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: Panic, sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(msg, sender);
    }
}

#[test]
fn restart_strategy() {
    let system = ActorSystem::new().unwrap();

    let sup = system.actor_of::<RestartSup>("supervisor").unwrap();

    sup.tell(Panic, None);

    let (probe, mut listen) = probe();
    sup.tell(TestProbe(probe), None);

    p_assert_eq!(listen, ());
}

// Test stop strategy: the supervisor stops its failed child instead of
// restarting it, so a second message to the same path is never delivered.
#[actor(Panic)]
struct StopSup {
    actor_to_fail: Option<ActorRef<PanicActorMsg>>,
}

impl ActorFactory for StopSup {
    fn create() -> Self {
        StopSup {
            actor_to_fail: None,
        }
    }
}

impl Actor for StopSup {
    type Msg = StopSupMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.actor_to_fail = ctx.actor_of::<PanicActor>("actor-to-fail").ok();
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        self.receive(ctx, msg, sender);
    }

    fn supervisor_strategy(&self) -> Strategy {
        Strategy::Stop
    }
}

impl Receive<Panic> for StopSup {
    type Msg = StopSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: Panic, sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(msg, sender);
    }
}

#[test]
fn stop_strategy() {
    let system = ActorSystem::new().unwrap();

    let sup = system.actor_of::<StopSup>("stop-supervisor").unwrap();
    sup.tell(Panic, None);

    std::thread::sleep(Duration::from_millis(50));

    assert!(!sup.has_children());
}
