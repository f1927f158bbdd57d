use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use slog::{trace, Logger};

use crate::{
    actor::actor_cell::{ActorCell, ExtendedCell},
    actor::*,
    kernel::kernel,
    kernel::mailbox::mailbox,
    system::{ActorSystem, SysActors, SystemMsg},
    validate::validate_name,
};

/// Tracks which paths are live, and creates/parks actors into the tree
/// Both the system tree (`/root/system/...`) and the user
/// tree (`/root/user/...`) are created through this one instance.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
    log: Logger,
}

struct ProviderInner {
    paths: Mutex<HashSet<ActorPath>>,
}

impl Provider {
    pub fn new(log: Logger) -> Self {
        Provider {
            inner: Arc::new(ProviderInner {
                paths: Mutex::new(HashSet::new()),
            }),
            log,
        }
    }

    pub fn create_actor<A>(
        &self,
        props: Props<A>,
        name: &str,
        parent: &BasicActorRef,
        sys: &ActorSystem,
    ) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor + 'static,
    {
        validate_name(name)?;

        let uri = parent.cell.uri().child(name, props.well_known);
        trace!(sys.log(), "Attempting to create actor at: {}", uri.path);

        self.register(&uri.path)?;

        let (sender, sys_sender, mb) = mailbox::<A::Msg>(
            sys.sys_settings().msg_process_limit,
            props.mailbox_capacity,
        );

        let cell = ExtendedCell::new(
            uri,
            Some(parent.clone()),
            Arc::new(sender.clone()),
            sys_sender,
            sender,
            props.mailbox_capacity,
            props.start_immediately,
        );

        let dispatcher = props
            .dispatcher
            .clone()
            .unwrap_or_else(|| sys.default_dispatcher());

        let k = kernel(props.producer.clone(), dispatcher, cell.clone(), mb, sys)?;
        let cell = cell.init(&k);

        let actor = ActorRef::new(cell);
        let child = BasicActorRef::from(actor.clone());
        parent.cell.add_child(child);
        if props.start_immediately {
            actor.sys_tell(SystemMsg::ActorInit);
        }

        Ok(actor)
    }

    fn register(&self, path: &ActorPath) -> Result<(), CreateError> {
        let mut paths = self.inner.paths.lock().unwrap();
        if paths.contains(path) {
            Err(CreateError::AlreadyExists(path.clone()))
        } else {
            paths.insert(path.clone());
            Ok(())
        }
    }

    pub fn unregister(&self, path: &ActorPath) {
        self.inner.paths.lock().unwrap().remove(path);
    }
}

/// Builds the fixed `/root`, `/root/user`, `/root/system`, `/root/temp`
/// hierarchy every `ActorSystem` starts with.
pub fn create_root(sys: &ActorSystem) -> SysActors {
    let root = root(sys);

    SysActors {
        user: guardian("user", &root, sys),
        sysm: guardian("system", &root, sys),
        temp: guardian("temp", &root, sys),
        root,
    }
}

fn root(sys: &ActorSystem) -> BasicActorRef {
    let uri = ActorUri::root(sys.host(), "root");

    // The root has no parent of its own, but every `ActorCell` needs one to
    // walk `parent()`/`user_root()` without special-casing — this is the
    // "big bang" stand-in, never addressed by name.
    let bigbang = BasicActorRef::new(ActorCell::new(uri.clone(), None));

    let props: Props<Guardian> = Props::new_args(("root".to_string(), sys.log()));
    let (sender, sys_sender, mb) = mailbox::<SystemMsg>(100, MailboxCapacity::Unbounded);

    let cell = ExtendedCell::new(
        uri,
        Some(bigbang),
        Arc::new(sender.clone()),
        sys_sender,
        sender,
        MailboxCapacity::Unbounded,
        true,
    );

    let k = kernel(
        props.producer.clone(),
        sys.default_dispatcher(),
        cell.clone(),
        mb,
        sys,
    )
    .expect("root actor failed to start");
    let cell = cell.init(&k);
    let actor_ref = ActorRef::new(cell);

    BasicActorRef::from(actor_ref)
}

fn guardian(name: &str, root: &BasicActorRef, sys: &ActorSystem) -> BasicActorRef {
    let uri = root.cell.uri().child(name, true);

    let props: Props<Guardian> = Props::new_args((name.to_string(), sys.log()));
    let (sender, sys_sender, mb) = mailbox::<SystemMsg>(100, MailboxCapacity::Unbounded);

    let cell = ExtendedCell::new(
        uri,
        Some(root.clone()),
        Arc::new(sender.clone()),
        sys_sender,
        sender,
        MailboxCapacity::Unbounded,
        true,
    );

    let k = kernel(
        props.producer.clone(),
        sys.default_dispatcher(),
        cell.clone(),
        mb,
        sys,
    )
    .expect("guardian actor failed to start");
    let cell = cell.init(&k);
    let actor_ref = ActorRef::new(cell);

    let actor = BasicActorRef::from(actor_ref);
    root.cell.add_child(actor.clone());
    actor
}

struct Guardian {
    name: String,
    log: Logger,
}

impl ActorFactoryArgs<(String, Logger)> for Guardian {
    fn create_args((name, log): (String, Logger)) -> Self {
        Guardian { name, log }
    }
}

impl Actor for Guardian {
    type Msg = SystemMsg;

    fn recv(&mut self, _: &Context<Self::Msg>, _: Self::Msg, _: Option<BasicActorRef>) {}

    fn post_stop(&mut self) {
        trace!(self.log, "{} guardian stopped", self.name);
    }
}
