pub(crate) mod logger;
pub(crate) mod timer;

use std::fmt;

use crate::actor::BasicActorRef;

// Public API (plus the pub data types in this file)
pub use self::logger::LoggerConfig;
pub use self::timer::{BasicTimer, BasicTimerConfig, ScheduleId, Timer};

#[derive(Clone, Debug)]
pub enum SystemMsg {
    ActorInit,
    Command(SystemCmd),
    Event(SystemEvent),
    Failed(BasicActorRef),
}

#[derive(Clone, Debug)]
pub enum SystemCmd {
    Stop,
    Restart,
}

impl Into<SystemMsg> for SystemCmd {
    fn into(self) -> SystemMsg {
        SystemMsg::Command(self)
    }
}

#[derive(Clone, Debug)]
pub enum SystemEvent {
    /// An actor was terminated
    ActorCreated(ActorCreated),

    /// An actor was restarted
    ActorRestarted(ActorRestarted),

    /// An actor was started
    ActorTerminated(ActorTerminated),
}

impl Into<SystemMsg> for SystemEvent {
    fn into(self) -> SystemMsg {
        SystemMsg::Event(self)
    }
}

#[derive(Clone, Debug)]
pub struct ActorCreated {
    pub actor: BasicActorRef,
}

#[derive(Clone, Debug)]
pub struct ActorRestarted {
    pub actor: BasicActorRef,
}

#[derive(Clone, Debug)]
pub struct ActorTerminated {
    pub actor: BasicActorRef,
}

impl Into<SystemEvent> for ActorCreated {
    fn into(self) -> SystemEvent {
        SystemEvent::ActorCreated(self)
    }
}

impl Into<SystemEvent> for ActorRestarted {
    fn into(self) -> SystemEvent {
        SystemEvent::ActorRestarted(self)
    }
}

impl Into<SystemEvent> for ActorTerminated {
    fn into(self) -> SystemEvent {
        SystemEvent::ActorTerminated(self)
    }
}

impl Into<SystemMsg> for ActorCreated {
    fn into(self) -> SystemMsg {
        SystemMsg::Event(SystemEvent::ActorCreated(self))
    }
}

impl Into<SystemMsg> for ActorRestarted {
    fn into(self) -> SystemMsg {
        SystemMsg::Event(SystemEvent::ActorRestarted(self))
    }
}

impl Into<SystemMsg> for ActorTerminated {
    fn into(self) -> SystemMsg {
        SystemMsg::Event(SystemEvent::ActorTerminated(self))
    }
}

#[derive(Clone, Debug)]
pub enum SystemEventType {
    ActorTerminated,
    ActorRestarted,
    ActorCreated,
}

pub enum SystemError {
    ModuleFailed(String),
    InvalidName(String),
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SystemError::ModuleFailed(ref m) => f.write_str(&format!(
                "Failed to create actor system. Cause: Sub module failed to start ({})",
                m
            )),
            SystemError::InvalidName(ref name) => f.write_str(&format!(
                "Failed to create actor system. Cause: Invalid actor system name ({})",
                name
            )),
        }
    }
}

impl fmt::Debug for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_string())
    }
}

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant, SystemTime},
};

use uuid::Uuid;

use crate::{
    actor::*,
    kernel::dispatcher::Dispatcher,
    kernel::provider::{create_root, Provider},
    system::logger::{default_log, DeadLetterLogger},
    system::timer::{BasicTimer as Timers, Job, OnceJob, RepeatJob, TimerRef},
    validate::{validate_name, InvalidPath},
    AnyMessage, Config, Message,
};
use slog::Logger;

pub struct ProtoSystem {
    id: Uuid,
    name: String,
    pub host: Arc<str>,
    config: Config,
    pub(crate) sys_settings: SystemSettings,
    dispatcher: Dispatcher,
    started_at: SystemTime,
    started_at_moment: Instant,
}

#[derive(Default)]
pub struct SystemBuilder {
    name: Option<String>,
    cfg: Option<Config>,
    log: Option<Logger>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        SystemBuilder::default()
    }

    pub fn create(self) -> Result<ActorSystem, SystemError> {
        let name = self.name.unwrap_or_else(|| "kestrel".to_string());
        let cfg = self.cfg.unwrap_or_else(crate::config::load_config);
        let log = self.log.unwrap_or_else(|| default_log(&cfg.log));

        ActorSystem::create(name.as_ref(), log, cfg)
    }

    pub fn name(self, name: &str) -> Self {
        SystemBuilder {
            name: Some(name.to_string()),
            ..self
        }
    }

    pub fn cfg(self, cfg: Config) -> Self {
        SystemBuilder {
            cfg: Some(cfg),
            ..self
        }
    }

    pub fn log(self, log: Logger) -> Self {
        SystemBuilder {
            log: Some(log),
            ..self
        }
    }
}

/// The actor runtime and common services coordinator.
///
/// `ActorSystem` owns the actor tree, the default dispatcher pool
/// and the system's scheduler and logger. Create one instance per
/// application.
#[derive(Clone)]
pub struct ActorSystem {
    proto: Arc<ProtoSystem>,
    sys_actors: Option<SysActors>,
    log: Logger,
    debug: bool,
    pub timer: Arc<TimerRef>,
    sys_channels: Option<SysChannels>,
    provider: Provider,
}

impl ActorSystem {
    /// Create a new `ActorSystem` instance with the default name, reading
    /// config from `KESTREL_CONF`/`config/kestrel.toml`.
    pub fn new() -> Result<ActorSystem, SystemError> {
        let cfg = crate::config::load_config();
        let log = default_log(&cfg.log);

        ActorSystem::create("kestrel", log, cfg)
    }

    /// Create a new `ActorSystem` instance with the given name.
    pub fn with_name(name: &str) -> Result<ActorSystem, SystemError> {
        let cfg = crate::config::load_config();
        let log = default_log(&cfg.log);

        ActorSystem::create(name, log, cfg)
    }

    /// Create a new `ActorSystem` instance bypassing default config loading.
    pub fn with_config(name: &str, cfg: Config) -> Result<ActorSystem, SystemError> {
        let log = default_log(&cfg.log);

        ActorSystem::create(name, log, cfg)
    }

    fn create(name: &str, log: Logger, cfg: Config) -> Result<ActorSystem, SystemError> {
        validate_name(name).map_err(|_| SystemError::InvalidName(name.into()))?;
        let debug = cfg.debug;

        if debug {
            slog::debug!(log, "Starting actor system: System[{}]", name);
        }

        let prov = Provider::new(log.clone());
        let timer = Timers::start(&cfg.scheduler);
        let dispatcher = Dispatcher::fixed_thread_pool(cfg.dispatcher.pool_size, cfg.dispatcher.stack_size);

        let proto = ProtoSystem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            host: Arc::from("localhost"),
            sys_settings: SystemSettings {
                msg_process_limit: cfg.mailbox.msg_process_limit,
            },
            config: cfg,
            dispatcher,
            started_at: SystemTime::now(),
            started_at_moment: Instant::now(),
        };

        let mut sys = ActorSystem {
            proto: Arc::new(proto),
            debug,
            log,
            timer: Arc::new(timer),
            sys_channels: None,
            sys_actors: None,
            provider: prov.clone(),
        };

        // 1. bootstrap the fixed /root, /root/user, /root/system, /root/temp
        //    hierarchy.
        let sys_actors = create_root(&sys);
        sys.sys_actors = Some(sys_actors);

        // 2. start the system event/dead-letter channels.
        let sys_channels = sys_channels(&prov, &sys)?;
        sys.sys_channels = Some(sys_channels);

        // 3. start the dead letter logger, subscribed to the dead letters
        //    channel.
        let _dl_logger = sys_actor_of_args::<DeadLetterLogger, _>(
            &prov,
            &sys,
            "dl_logger",
            (sys.dead_letters().clone(), sys.log()),
        )?;

        slog::debug!(sys.log, "Actor system [{}] [{}] started", sys.id(), name);

        Ok(sys)
    }

    /// Returns the system start moment
    pub fn start_date(&self) -> SystemTime {
        self.proto.started_at
    }

    /// Returns the number of seconds since the system started
    pub fn uptime(&self) -> u64 {
        let now = Instant::now();
        now.duration_since(self.proto.started_at_moment).as_secs() as u64
    }

    /// Returns the hostname used when the system started
    ///
    /// The host is used in actor addressing.
    pub fn host(&self) -> Arc<str> {
        self.proto.host.clone()
    }

    /// Returns the UUID assigned to the system
    pub fn id(&self) -> Uuid {
        self.proto.id
    }

    /// Returns the name of the system
    pub fn name(&self) -> String {
        self.proto.name.clone()
    }

    /// The dispatcher newly created actors run on when their `Props` don't
    /// pin one explicitly.
    pub(crate) fn default_dispatcher(&self) -> Dispatcher {
        self.proto.dispatcher.clone()
    }

    pub(crate) fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn print_tree(&self) -> Vec<String> {
        fn print_node(
            sys: &ActorSystem,
            node: &BasicActorRef,
            indent: &str,
            log: &mut Vec<String>,
        ) {
            if node.is_root() {
                log.push(sys.name());

                for actor in node.children() {
                    print_node(sys, &actor, "", log);
                }
            } else {
                log.push(format!("{}└─ {}", indent, node.name()));

                for actor in node.children() {
                    print_node(sys, &actor, &(indent.to_string() + "   "), log);
                }
            }
        }

        let mut log: Vec<String> = Vec::new();
        let root = self.root();
        print_node(self, root, "", &mut log);
        log
    }

    /// Returns the system root's actor reference
    fn root(&self) -> &BasicActorRef {
        &self.sys_actors.as_ref().unwrap().root
    }

    /// Returns the user root actor reference
    pub fn user_root(&self) -> &BasicActorRef {
        &self.sys_actors.as_ref().unwrap().user
    }

    /// Returns the system root actor reference
    pub fn sys_root(&self) -> &BasicActorRef {
        &self.sys_actors.as_ref().unwrap().sysm
    }

    /// Returns the temp guardian actor reference (ask-pattern parking).
    pub fn temp_root(&self) -> &BasicActorRef {
        &self.sys_actors.as_ref().unwrap().temp
    }

    /// Returns a reference to the system events channel
    pub fn sys_events(&self) -> &ActorRef<ChannelMsg<SystemEvent>> {
        &self.sys_channels.as_ref().unwrap().sys_events
    }

    /// Returns a reference to the dead letters channel
    pub fn dead_letters(&self) -> &ActorRef<DLChannelMsg> {
        &self.sys_channels.as_ref().unwrap().dead_letters
    }

    pub fn publish_event(&self, evt: SystemEvent) {
        let topic = Topic::from(&evt);
        self.sys_events().tell(Publish { topic, msg: evt }, None);
    }

    /// Returns the `Config` used by the system
    pub fn config(&self) -> &Config {
        &self.proto.config
    }

    pub(crate) fn sys_settings(&self) -> &SystemSettings {
        &self.proto.sys_settings
    }

    #[inline]
    pub fn log(&self) -> Logger {
        self.log.clone()
    }

    /// Shuts the system down.
    ///
    /// Stops the user tree bottom-up, waits up to
    /// `Config::shutdown.unbind_deadline_millis` for it to drain, then
    /// stops the system and temp guardians and closes the dispatcher pool.
    /// Actors receive `post_stop` as usual along the way.
    pub fn shutdown(&self) {
        if thread::current().name() == Some("kestrel-worker") {
            slog::warn!(
                self.log(),
                "shutdown() called from a dispatcher worker thread; it will block \
                 that worker until the drain deadline, risking a self-deadlock if \
                 every worker ends up blocked the same way"
            );
        }

        fn stop_subtree(sys: &ActorSystem, node: &BasicActorRef) {
            for child in node.children() {
                stop_subtree(sys, &child);
            }
            sys.stop(node);
        }

        stop_subtree(self, self.user_root());

        let deadline =
            Instant::now() + Duration::from_millis(self.proto.config.shutdown.unbind_deadline_millis);
        while self.user_root().has_children() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        if self.user_root().has_children() {
            slog::warn!(
                self.log(),
                "user tree did not drain within {}ms; stopping system/temp guardians anyway",
                self.proto.config.shutdown.unbind_deadline_millis
            );
        }

        self.stop(self.sys_root());
        self.stop(self.temp_root());
        self.proto.dispatcher.shutdown();
    }
}

impl ActorRefFactory for ActorSystem {
    fn actor_of_props<A>(&self, props: Props<A>, name: &str) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor,
    {
        self.provider
            .create_actor(props, name, self.user_root(), self)
    }

    fn actor_of<A>(&self, name: &str) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactory + Actor,
    {
        self.actor_of_props(Props::<A>::new(), name)
    }

    fn actor_of_args<A, Args>(&self, name: &str, args: Args) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactoryArgs<Args>,
        Args: Clone + Send + Sync + 'static,
    {
        self.actor_of_props(Props::<A>::new_args(args), name)
    }

    fn stop(&self, actor: impl ActorReference) {
        actor.sys_tell(SystemCmd::Stop.into());
    }
}

impl ActorRefFactory for &ActorSystem {
    fn actor_of_props<A>(&self, props: Props<A>, name: &str) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor,
    {
        self.provider
            .create_actor(props, name, self.user_root(), self)
    }

    fn actor_of<A>(&self, name: &str) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactory + Actor,
    {
        self.actor_of_props(Props::<A>::new(), name)
    }

    fn actor_of_args<A, Args>(&self, name: &str, args: Args) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactoryArgs<Args>,
        Args: Clone + Send + Sync + 'static,
    {
        self.actor_of_props(Props::<A>::new_args(args), name)
    }

    fn stop(&self, actor: impl ActorReference) {
        actor.sys_tell(SystemCmd::Stop.into());
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ActorSystem[Name: {}, Start Time: {:?}, Uptime: {} seconds]",
            self.name(),
            self.start_date(),
            self.uptime()
        )
    }
}

impl Timer for ActorSystem {
    fn schedule<T, M>(
        &self,
        initial_delay: Duration,
        interval: Duration,
        receiver: ActorRef<M>,
        sender: Sender,
        msg: T,
    ) -> ScheduleId
    where
        T: Message + Into<M>,
        M: Message,
    {
        let id = Uuid::new_v4();
        let msg: M = msg.into();

        let job = RepeatJob {
            id,
            send_at: SystemTime::now() + initial_delay,
            interval,
            receiver: receiver.into(),
            sender,
            msg: AnyMessage::new(msg, false),
        };

        self.timer.send(Job::Repeat(job));
        id
    }

    fn schedule_once<T, M>(
        &self,
        delay: Duration,
        receiver: ActorRef<M>,
        sender: Sender,
        msg: T,
    ) -> ScheduleId
    where
        T: Message + Into<M>,
        M: Message,
    {
        let id = Uuid::new_v4();
        let msg: M = msg.into();

        let job = OnceJob {
            id,
            send_at: SystemTime::now() + delay,
            receiver: receiver.into(),
            sender,
            msg: AnyMessage::new(msg, true),
        };

        self.timer.send(Job::Once(job));
        id
    }

    fn cancel_schedule(&self, id: ScheduleId) {
        self.timer.send(Job::Cancel(id));
    }
}

impl ActorSelectionFactory for ActorSystem {
    fn select(&self, path: &str) -> Result<ActorSelection, InvalidPath> {
        ActorSelection::new(self.root().clone(), path.to_string())
    }
}

fn sys_actor_of<A>(
    prov: &Provider,
    sys: &ActorSystem,
    name: &str,
) -> Result<ActorRef<<A as Actor>::Msg>, SystemError>
where
    A: ActorFactory,
{
    prov.create_actor(Props::<A>::new(), name, sys.sys_root(), sys)
        .map_err(|_| SystemError::ModuleFailed(name.into()))
}

fn sys_actor_of_args<A, Args>(
    prov: &Provider,
    sys: &ActorSystem,
    name: &str,
    args: Args,
) -> Result<ActorRef<<A as Actor>::Msg>, SystemError>
where
    A: ActorFactoryArgs<Args>,
    Args: Clone + Send + Sync + 'static,
{
    prov.create_actor(Props::<A>::new_args(args), name, sys.sys_root(), sys)
        .map_err(|_| SystemError::ModuleFailed(name.into()))
}

fn sys_channels(prov: &Provider, sys: &ActorSystem) -> Result<SysChannels, SystemError> {
    let sys_events = sys_actor_of::<EventsChannel>(prov, sys, "sys_events")?;
    let dead_letters = sys_actor_of::<Channel<DeadLetter>>(prov, sys, "dead_letters")?;

    Ok(SysChannels {
        sys_events,
        dead_letters,
    })
}

pub struct SystemSettings {
    pub msg_process_limit: u32,
}

#[derive(Clone)]
pub struct SysActors {
    pub root: BasicActorRef,
    pub user: BasicActorRef,
    pub sysm: BasicActorRef,
    pub temp: BasicActorRef,
}

#[derive(Clone)]
pub struct SysChannels {
    sys_events: ActorRef<ChannelMsg<SystemEvent>>,
    dead_letters: ActorRef<DLChannelMsg>,
}
