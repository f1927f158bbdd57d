use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::actor::actor_ref::{ActorReference, BasicActorRef, Sender};
use crate::actor::props::MailboxCapacity;
use crate::actor::uri::ActorPath;
use crate::actor::{ActorRef, ActorRefFactory, ActorSelection, ActorSelectionFactory, ActorUri};
use crate::kernel::kernel_ref::{dispatch, dispatch_any, AnyEnqueueError, KernelRef};
use crate::kernel::mailbox::{AnySender, MailboxSender};
use crate::system::{ActorSystem, SystemCmd, SystemMsg};
use crate::validate::InvalidPath;
use crate::{AnyMessage, Envelope, Message, MsgResult};

/// The set of an actor's children, keyed by name. Cheap to clone (shared
/// `Arc`); every mutation takes the single lock once.
#[derive(Clone, Default)]
pub(crate) struct Children {
    inner: Arc<RwLock<HashMap<String, BasicActorRef>>>,
}

impl Children {
    fn add(&self, child: BasicActorRef) {
        let name = child.name().to_string();
        self.inner.write().unwrap().insert(name, child);
    }

    fn remove(&self, name: &str) {
        self.inner.write().unwrap().remove(name);
    }

    fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    fn contains(&self, actor: &BasicActorRef) -> bool {
        self.inner.read().unwrap().contains_key(actor.name())
    }

    fn all(&self) -> Vec<BasicActorRef> {
        self.inner.read().unwrap().values().cloned().collect()
    }
}

/// The set of actors watching this cell for termination, keyed by path so
/// a given watcher can only be registered once.
#[derive(Clone, Default)]
struct Watchers {
    inner: Arc<RwLock<HashMap<ActorPath, BasicActorRef>>>,
}

impl Watchers {
    fn add(&self, watcher: BasicActorRef) {
        self.inner
            .write()
            .unwrap()
            .insert(watcher.path().clone(), watcher);
    }

    fn remove(&self, watcher: &BasicActorRef) {
        self.inner.write().unwrap().remove(watcher.path());
    }

    fn all(&self) -> Vec<BasicActorRef> {
        self.inner.read().unwrap().values().cloned().collect()
    }
}

struct CellInner {
    uri: ActorUri,
    parent: Option<BasicActorRef>,
    children: Children,
    watchers: Watchers,
    is_user: bool,
    kernel: RwLock<Option<KernelRef>>,
    restart_attempts: Mutex<HashMap<ActorPath, usize>>,
}

/// The non-generic half of an actor's identity: address, parent/child
/// links, and the installed kernel handle. Shared by every `ActorRef<Msg>`
/// and `BasicActorRef` pointing at the same actor.
#[derive(Clone)]
pub struct ActorCell {
    inner: Arc<CellInner>,
}

impl ActorCell {
    pub(crate) fn new(uri: ActorUri, parent: Option<BasicActorRef>) -> ActorCell {
        let is_user =
            uri.path.as_str().starts_with("/root/user/") || uri.path.as_str() == "/root/user";
        ActorCell {
            inner: Arc::new(CellInner {
                uri,
                parent,
                children: Children::default(),
                watchers: Watchers::default(),
                is_user,
                kernel: RwLock::new(None),
                restart_attempts: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn uri(&self) -> &ActorUri {
        &self.inner.uri
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn is_user(&self) -> bool {
        self.inner.is_user
    }

    pub fn parent(&self) -> BasicActorRef {
        self.inner
            .parent
            .clone()
            .unwrap_or_else(|| BasicActorRef::new(self.clone()))
    }

    pub fn user_root(&self) -> BasicActorRef {
        let mut cur = BasicActorRef::new(self.clone());
        while cur.path().as_str() != "/root/user" && !cur.is_root() {
            cur = cur.parent();
        }
        cur
    }

    pub fn has_children(&self) -> bool {
        !self.inner.children.is_empty()
    }

    pub fn is_child(&self, actor: &BasicActorRef) -> bool {
        self.inner.children.contains(actor)
    }

    pub fn children<'a>(&'a self) -> Box<dyn Iterator<Item = BasicActorRef> + 'a> {
        Box::new(self.inner.children.all().into_iter())
    }

    pub(crate) fn add_child(&self, child: BasicActorRef) {
        self.inner.children.add(child);
    }

    pub(crate) fn remove_child(&self, name: &str) {
        self.inner.children.remove(name);
    }

    /// Registers `watcher` to receive a `Terminated` notification when this
    /// cell's actor stops, in addition to whatever it already observes on
    /// the system events channel.
    pub(crate) fn watch(&self, watcher: BasicActorRef) {
        self.inner.watchers.add(watcher);
    }

    pub(crate) fn unwatch(&self, watcher: &BasicActorRef) {
        self.inner.watchers.remove(watcher);
    }

    pub(crate) fn watchers(&self) -> Vec<BasicActorRef> {
        self.inner.watchers.all()
    }

    pub(crate) fn kernel(&self) -> KernelRef {
        self.inner
            .kernel
            .read()
            .unwrap()
            .clone()
            .expect("actor cell used before kernel installed")
    }

    pub(crate) fn set_kernel(&self, kernel: KernelRef) {
        *self.inner.kernel.write().unwrap() = Some(kernel);
    }

    pub fn send_sys_msg(
        &self,
        sys_sender: &MailboxSender<SystemMsg>,
        msg: Envelope<SystemMsg>,
    ) -> MsgResult<SystemMsg> {
        dispatch(msg, sys_sender, &self.kernel())
    }

    pub fn send_any_msg(
        &self,
        any_sender: &Arc<dyn AnySender>,
        msg: &mut AnyMessage,
        sender: Sender,
    ) -> Result<(), AnyEnqueueError> {
        dispatch_any(msg, sender, any_sender, &self.kernel())
    }

    /// Applies a supervision decision made by this cell's actor about a
    /// failed child. `strategy` is computed by the caller (who has
    /// access to the live, generic actor instance); this method only needs
    /// the closed `Strategy` value and the failed child's reference.
    pub(crate) fn handle_failure(&self, failed: BasicActorRef, strategy: crate::actor::Strategy) {
        use crate::actor::Strategy;
        match strategy {
            Strategy::Stop => {
                failed.sys_tell(SystemMsg::Command(SystemCmd::Stop));
            }
            Strategy::Restart(backoff) => {
                let attempt = {
                    let mut attempts = self.inner.restart_attempts.lock().unwrap();
                    let n = attempts.entry(failed.path().clone()).or_insert(0);
                    let this_attempt = *n;
                    *n += 1;
                    this_attempt
                };
                let delay = backoff.get(attempt).copied();
                match delay {
                    Some(d) if !d.is_zero() => {
                        std::thread::spawn(move || {
                            std::thread::sleep(d);
                            failed.sys_tell(SystemMsg::Command(SystemCmd::Restart));
                        });
                    }
                    _ => failed.sys_tell(SystemMsg::Command(SystemCmd::Restart)),
                }
            }
            Strategy::Escalate => {
                if !self.is_root() {
                    self.parent().sys_tell(SystemMsg::Failed(failed));
                }
            }
        }
    }
}

impl<Msg: Message> From<ExtendedCell<Msg>> for ActorCell {
    fn from(cell: ExtendedCell<Msg>) -> ActorCell {
        cell.cell
    }
}

/// The generic half of an actor's identity: the typed sender into its own
/// mailbox, layered on top of the shared, untyped `ActorCell`.
pub struct ExtendedCell<Msg: Message> {
    pub(crate) cell: ActorCell,
    sender: MailboxSender<Msg>,
    sys_sender: MailboxSender<SystemMsg>,
    any_sender: Arc<dyn AnySender>,
    pub(crate) mailbox_capacity: MailboxCapacity,
    started: Arc<AtomicBool>,
}

impl<Msg: Message> Clone for ExtendedCell<Msg> {
    fn clone(&self) -> Self {
        ExtendedCell {
            cell: self.cell.clone(),
            sender: self.sender.clone(),
            sys_sender: self.sys_sender.clone(),
            any_sender: self.any_sender.clone(),
            mailbox_capacity: self.mailbox_capacity,
            started: self.started.clone(),
        }
    }
}

impl<Msg: Message> ExtendedCell<Msg> {
    pub(crate) fn new(
        uri: ActorUri,
        parent: Option<BasicActorRef>,
        any_sender: Arc<dyn AnySender>,
        sys_sender: MailboxSender<SystemMsg>,
        sender: MailboxSender<Msg>,
        mailbox_capacity: MailboxCapacity,
        start_immediately: bool,
    ) -> ExtendedCell<Msg> {
        ExtendedCell {
            cell: ActorCell::new(uri, parent),
            sender,
            sys_sender,
            any_sender,
            mailbox_capacity,
            started: Arc::new(AtomicBool::new(start_immediately)),
        }
    }

    /// Installs the kernel handle this cell dispatches through. Must be
    /// called exactly once, before the actor's mailbox is scheduled for
    /// the first time.
    pub(crate) fn init(self, kernel: &KernelRef) -> ExtendedCell<Msg> {
        self.cell.set_kernel(kernel.clone());
        self
    }

    pub fn myself(&self) -> BasicActorRef {
        BasicActorRef::new(self.cell.clone())
    }

    pub fn uri(&self) -> &ActorUri {
        self.cell.uri()
    }

    pub fn is_root(&self) -> bool {
        self.cell.is_root()
    }

    pub fn parent(&self) -> BasicActorRef {
        self.cell.parent()
    }

    pub fn user_root(&self) -> BasicActorRef {
        self.cell.user_root()
    }

    pub fn has_children(&self) -> bool {
        self.cell.has_children()
    }

    pub fn is_child(&self, actor: &BasicActorRef) -> bool {
        self.cell.is_child(actor)
    }

    pub fn children<'a>(&'a self) -> Box<dyn Iterator<Item = BasicActorRef> + 'a> {
        self.cell.children()
    }

    pub fn send_msg(&self, msg: Envelope<Msg>) -> MsgResult<Msg> {
        dispatch(msg, &self.sender, &self.cell.kernel())
    }

    pub fn send_sys_msg(&self, msg: Envelope<SystemMsg>) -> MsgResult<SystemMsg> {
        self.cell.send_sys_msg(&self.sys_sender, msg)
    }

    /// Releases an actor spawned with `start_immediately(false)`: sends
    /// `Start` so `pre_start`/`post_start` and every message queued since
    /// spawn run, in that order. Returns `false` if already started, so a
    /// racing second caller can't double-deliver `Start`.
    pub(crate) fn wake(&self) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let _ = self.send_sys_msg(Envelope {
                msg: SystemMsg::ActorInit,
                sender: None,
            });
            true
        } else {
            false
        }
    }

    /// Acts on a `SystemCmd` routed through this actor's own mailbox
    /// `actor` is taken and `post_stop`-ed here, synchronously,
    /// before the actual restart/terminate work is handed to the kernel's
    /// dispatcher job — by the time that job runs the dock's slot is already
    /// empty.
    pub(crate) fn receive_cmd<A>(&self, cmd: SystemCmd, actor: &mut Option<A>)
    where
        A: crate::actor::Actor<Msg = Msg>,
    {
        if let Some(mut a) = actor.take() {
            a.post_stop();
        }
        match cmd {
            SystemCmd::Restart => self.cell.kernel().restart(),
            SystemCmd::Stop => self.cell.kernel().terminate(),
        }
    }

    /// Evicts a terminated child from this cell's children set. The
    /// watching actor itself already saw the raw event via `sys_recv` before
    /// this runs; there is no separate subscriber list to notify.
    pub(crate) fn death_watch<A>(&self, terminated: &BasicActorRef, _actor: &mut Option<A>)
    where
        A: crate::actor::Actor<Msg = Msg>,
    {
        self.cell.remove_child(terminated.name());
    }
}

/// The per-invocation handle passed to `Actor::recv`/`sys_recv`. Carries
/// only what behaviors need to act — their own typed ref and the system —
/// scheduling/dispatch stays inside `ActorCell`.
pub struct Context<Msg: Message> {
    pub myself: ActorRef<Msg>,
    pub system: ActorSystem,
}

impl<Msg: Message> Context<Msg> {
    pub fn myself(&self) -> ActorRef<Msg> {
        self.myself.clone()
    }
}

impl<Msg: Message> ActorRefFactory for Context<Msg> {
    fn actor_of_props<A>(
        &self,
        props: crate::actor::Props<A>,
        name: &str,
    ) -> Result<ActorRef<A::Msg>, crate::actor::CreateError>
    where
        A: crate::actor::Actor,
    {
        self.system
            .provider()
            .create_actor(props, name, &self.myself.clone().into(), &self.system)
    }

    fn actor_of<A>(&self, name: &str) -> Result<ActorRef<A::Msg>, crate::actor::CreateError>
    where
        A: crate::actor::props::ActorFactory + crate::actor::Actor,
    {
        self.actor_of_props(crate::actor::Props::<A>::new(), name)
    }

    fn actor_of_args<A, Args>(
        &self,
        name: &str,
        args: Args,
    ) -> Result<ActorRef<A::Msg>, crate::actor::CreateError>
    where
        A: crate::actor::props::ActorFactoryArgs<Args>,
        Args: Clone + Send + Sync + 'static,
    {
        self.actor_of_props(crate::actor::Props::<A>::new_args(args), name)
    }

    fn stop(&self, actor: impl ActorReference) {
        actor.sys_tell(SystemMsg::Command(SystemCmd::Stop));
    }
}

impl<Msg: Message> ActorSelectionFactory for Context<Msg> {
    fn select(&self, path: &str) -> Result<ActorSelection, InvalidPath> {
        let anchor = BasicActorRef::new(self.myself.cell.cell.clone());
        ActorSelection::new(anchor, path.to_string())
    }
}
