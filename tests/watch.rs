#[macro_use]
extern crate riker_testkit;

use kestrel::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

struct Target;

impl ActorFactory for Target {
    fn create() -> Self {
        Target
    }
}

impl Actor for Target {
    type Msg = ();

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

struct Watcher {
    watched: BasicActorRef,
    probe: ChannelProbe<(), ()>,
}

impl ActorFactoryArgs<(BasicActorRef, ChannelProbe<(), ()>)> for Watcher {
    fn create_args((watched, probe): (BasicActorRef, ChannelProbe<(), ()>)) -> Self {
        Watcher { watched, probe }
    }
}

impl Actor for Watcher {
    type Msg = ();

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        ctx.myself().watch(&self.watched);
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}

    fn sys_recv(&mut self, _ctx: &Context<Self::Msg>, msg: SystemMsg, _sender: Sender) {
        if let SystemMsg::Event(SystemEvent::ActorTerminated(terminated)) = msg {
            if terminated.actor.path() == self.watched.path() {
                self.probe.event(());
            }
        }
    }
}

#[test]
fn watch_delivers_terminated_to_the_watcher_directly() {
    let sys = ActorSystem::new().unwrap();

    let target = sys.actor_of::<Target>("watched").unwrap();
    let target_ref: BasicActorRef = target.clone().into();

    let (probe, mut listen) = probe();
    let _watcher = sys
        .actor_of_args::<Watcher, _>("watcher", (target_ref, probe))
        .unwrap();

    sys.stop(&target);

    p_assert_eq!(listen, ());
}
