#[macro_use]
extern crate riker_testkit;

use kestrel::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct Add;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[actor(TestProbe, Add)]
struct Counter {
    probe: Option<TestProbe>,
    count: u32,
}

impl ActorFactory for Counter {
    fn create() -> Self {
        Counter {
            probe: None,
            count: 0,
        }
    }
}

impl Actor for Counter {
    type Msg = CounterMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        self.receive(ctx, msg, sender);
    }
}

impl Receive<TestProbe> for Counter {
    type Msg = CounterMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        self.probe = Some(msg);
    }
}

impl Receive<Add> for Counter {
    type Msg = CounterMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Add, _sender: Sender) {
        self.count += 1;
        if self.count == 1_000 {
            self.probe.as_mut().unwrap().0.event(());
        }
    }
}

#[test]
fn actor_create() {
    let sys = ActorSystem::new().unwrap();

    assert!(sys.actor_of::<Counter>("valid-name").is_ok());

    assert!(sys.actor_of::<Counter>("/").is_err());
    assert!(sys.actor_of::<Counter>("*").is_err());
    assert!(sys.actor_of::<Counter>("/a/b/c").is_err());
    assert!(sys.actor_of::<Counter>("@").is_err());
    assert!(sys.actor_of::<Counter>("#").is_err());
    assert!(sys.actor_of::<Counter>("abc*").is_err());
    assert!(sys.actor_of::<Counter>("!").is_err());
}

#[test]
fn actor_create_duplicate_name() {
    let sys = ActorSystem::new().unwrap();

    assert!(sys.actor_of::<Counter>("dup").is_ok());
    assert!(sys.actor_of::<Counter>("dup").is_err());
}

#[test]
fn actor_create_duplicate_name_under_concurrent_contention() {
    let sys = ActorSystem::new().unwrap();

    let oks = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let sys = sys.clone();
                scope.spawn(move || sys.actor_of::<Counter>("dup-concurrent").is_ok())
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(oks, 1);
}

#[test]
fn actor_tell() {
    let sys = ActorSystem::new().unwrap();

    let actor = sys.actor_of::<Counter>("me").unwrap();

    let (probe, mut listen) = probe();
    actor.tell(TestProbe(probe), None);

    for _ in 0..1_000 {
        actor.tell(Add, None);
    }

    p_assert_eq!(listen, ());
}

#[test]
fn actor_try_tell() {
    let sys = ActorSystem::new().unwrap();

    let actor = sys.actor_of::<Counter>("me").unwrap();
    let actor: BasicActorRef = actor.into();

    let (probe, mut listen) = probe();
    actor
        .try_tell(CounterMsg::TestProbe(TestProbe(probe)), None)
        .unwrap();

    assert!(actor.try_tell(CounterMsg::Add(Add), None).is_ok());

    for _ in 0..1_000 {
        actor.try_tell(CounterMsg::Add(Add), None).unwrap();
    }

    p_assert_eq!(listen, ());
}

struct Parent {
    probe: Option<TestProbe>,
}

impl ActorFactory for Parent {
    fn create() -> Self {
        Parent { probe: None }
    }
}

impl Actor for Parent {
    type Msg = TestProbe;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        ctx.actor_of::<Child>("child_a").unwrap();
        ctx.actor_of::<Child>("child_b").unwrap();
        ctx.actor_of::<Child>("child_c").unwrap();
        ctx.actor_of::<Child>("child_d").unwrap();
    }

    fn post_stop(&mut self) {
        // All children have been terminated by the time this runs.
        self.probe.as_mut().unwrap().0.event(());
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        self.probe = Some(msg);
    }
}

struct Child;

impl ActorFactory for Child {
    fn create() -> Self {
        Child
    }
}

impl Actor for Child {
    type Msg = ();

    fn recv(&mut self, _: &Context<Self::Msg>, _: Self::Msg, _: Sender) {}
}

#[test]
fn actor_stop() {
    let system = ActorSystem::new().unwrap();

    let parent = system.actor_of::<Parent>("parent").unwrap();

    let (probe, mut listen) = probe();
    parent.tell(TestProbe(probe), None);

    system.stop(&parent);
    p_assert_eq!(listen, ());
}

#[derive(Clone, Debug)]
pub struct Ping(u32);

#[derive(Clone, Debug)]
pub struct Pong(u32);

struct Ponger;

impl ActorFactory for Ponger {
    fn create() -> Self {
        Ponger
    }
}

impl Actor for Ponger {
    type Msg = Ping;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        sender.unwrap().try_tell(Pong(msg.0), None).unwrap();
    }
}

#[derive(Clone, Debug)]
enum PingerMsg {
    Probe(TestProbe),
    Pong(Pong),
}

impl From<TestProbe> for PingerMsg {
    fn from(p: TestProbe) -> Self {
        PingerMsg::Probe(p)
    }
}

impl From<Pong> for PingerMsg {
    fn from(p: Pong) -> Self {
        PingerMsg::Pong(p)
    }
}

struct Pinger {
    ponger: ActorRef<Ping>,
    probe: Option<TestProbe>,
    rounds: u32,
}

impl ActorFactoryArgs<ActorRef<Ping>> for Pinger {
    fn create_args(ponger: ActorRef<Ping>) -> Self {
        Pinger {
            ponger,
            probe: None,
            rounds: 0,
        }
    }
}

impl Actor for Pinger {
    type Msg = PingerMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.ponger.tell(Ping(0), Some(ctx.myself().into()));
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            PingerMsg::Probe(p) => self.probe = Some(p),
            PingerMsg::Pong(Pong(n)) => {
                self.rounds += 1;
                if self.rounds == 10 {
                    self.probe.as_mut().unwrap().0.event(());
                } else {
                    self.ponger.tell(Ping(n + 1), Some(ctx.myself().into()));
                }
            }
        }
    }
}

#[test]
fn ping_pong_ten_round_trips() {
    let sys = ActorSystem::new().unwrap();

    let ponger = sys.actor_of::<Ponger>("ponger").unwrap();
    let pinger = sys.actor_of_args::<Pinger, _>("pinger", ponger).unwrap();

    let (probe, mut listen) = probe();
    pinger.tell(TestProbe(probe), None);

    p_assert_eq!(listen, ());
}

struct DeferredRecorder {
    probe: ChannelProbe<(), String>,
}

#[derive(Clone, Debug)]
pub struct Stamp(pub String);

impl ActorFactoryArgs<ChannelProbe<(), String>> for DeferredRecorder {
    fn create_args(probe: ChannelProbe<(), String>) -> Self {
        DeferredRecorder { probe }
    }
}

impl Actor for DeferredRecorder {
    type Msg = Stamp;

    fn post_start(&mut self, _ctx: &Context<Self::Msg>) {
        self.probe.event("start".to_string());
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        self.probe.event(msg.0);
    }
}

#[test]
fn deferred_start_queues_messages_until_woken() {
    let sys = ActorSystem::new().unwrap();

    let (probe, mut listen) = probe();
    let props = Props::<DeferredRecorder>::new_args(probe).start_immediately(false);
    let actor = sys
        .actor_of_props::<DeferredRecorder>(props, "deferred")
        .unwrap();

    actor.tell(Stamp("one".into()), None);
    actor.tell(Stamp("two".into()), None);
    actor.tell(Stamp("three".into()), None);

    // Give the dispatcher a chance to run something, so the assertions
    // below actually exercise the deferred-start gate rather than just
    // racing ahead of a scheduler that hadn't gotten to it yet.
    std::thread::sleep(std::time::Duration::from_millis(20));

    assert!(actor.wake());
    assert!(!actor.wake());

    p_assert_eq!(listen, "start".to_string());
    p_assert_eq!(listen, "one".to_string());
    p_assert_eq!(listen, "two".to_string());
    p_assert_eq!(listen, "three".to_string());
}
