use std::time::Duration;

use kestrel::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[macro_use]
extern crate riker_testkit;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[derive(Clone, Debug)]
pub struct Tick;

struct Ticker {
    probe: Option<TestProbe>,
    count: u32,
}

impl ActorFactory for Ticker {
    fn create() -> Self {
        Ticker {
            probe: None,
            count: 0,
        }
    }
}

#[derive(Clone, Debug)]
enum TickerMsg {
    TestProbe(TestProbe),
    Tick(Tick),
}

impl From<TestProbe> for TickerMsg {
    fn from(msg: TestProbe) -> Self {
        TickerMsg::TestProbe(msg)
    }
}

impl From<Tick> for TickerMsg {
    fn from(msg: Tick) -> Self {
        TickerMsg::Tick(msg)
    }
}

impl Actor for Ticker {
    type Msg = TickerMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            TickerMsg::TestProbe(probe) => self.probe = Some(probe),
            TickerMsg::Tick(_) => {
                self.count += 1;
                if self.count == 3 {
                    self.probe.as_mut().unwrap().0.event(());
                }
            }
        }
    }
}

#[test]
fn schedule_repeat() {
    let sys = ActorSystem::new().unwrap();
    let ticker = sys.actor_of::<Ticker>("ticker").unwrap();

    let (probe, mut listen) = probe();
    ticker.tell(TestProbe(probe), None);

    let id = sys.schedule(
        Duration::from_millis(10),
        Duration::from_millis(10),
        ticker.clone(),
        None,
        Tick,
    );

    p_assert_eq!(listen, ());
    sys.cancel_schedule(id);
}

#[test]
fn schedule_once_then_cancel() {
    let sys = ActorSystem::new().unwrap();
    let ticker = sys.actor_of::<Ticker>("ticker-once").unwrap();

    let id = sys.schedule_once(Duration::from_secs(5), ticker.clone(), None, Tick);
    sys.cancel_schedule(id);

    // The job was cancelled before its delay elapsed, so a short wait
    // confirms nothing was delivered.
    std::thread::sleep(Duration::from_millis(50));
}
