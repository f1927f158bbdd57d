use std::sync::Arc;

use crate::actor::Actor;
use crate::kernel::dispatcher::Dispatcher;

/// Constructs a fresh actor instance. Implemented by the `#[actor]` macro
/// or by hand for actors with no constructor arguments.
pub trait ActorFactory: Actor {
    fn create() -> Self;
}

/// Constructs a fresh actor instance from a fixed set of arguments, cloned
/// once per (re)start out of `Props`.
pub trait ActorFactoryArgs<Args>: Actor {
    fn create_args(args: Args) -> Self;
}

/// Type-erased actor constructor, stored behind `Props` so the kernel can
/// call it again on restart without knowing the concrete argument type.
pub trait ActorProducer: Send + Sync {
    type Actor: Actor;

    fn produce(&self) -> Self::Actor;
}

struct NoArgs<A> {
    _marker: std::marker::PhantomData<fn() -> A>,
}

unsafe impl<A> Send for NoArgs<A> {}
unsafe impl<A> Sync for NoArgs<A> {}

impl<A: ActorFactory> ActorProducer for NoArgs<A> {
    type Actor = A;

    fn produce(&self) -> A {
        A::create()
    }
}

struct WithArgs<A, Args> {
    args: Args,
    _marker: std::marker::PhantomData<fn() -> A>,
}

impl<A, Args> ActorProducer for WithArgs<A, Args>
where
    A: ActorFactoryArgs<Args>,
    Args: Clone + Send + Sync,
{
    type Actor = A;

    fn produce(&self) -> A {
        A::create_args(self.args.clone())
    }
}

pub type BoxActorProd<A> = Arc<dyn ActorProducer<Actor = A>>;

/// Bound on how many messages may wait in an actor's mailbox before
/// `try_tell` starts reporting backpressure.
#[derive(Clone, Copy, Debug)]
pub enum MailboxCapacity {
    Bounded(usize),
    Unbounded,
}

/// Everything the provider needs to spawn and, later, respawn an actor
/// producer, dispatcher, mailbox capacity and well-known flag.
/// `dispatcher: None` means "use the system's configured default
/// `FixedThreadPool`" — `Provider::create_actor` resolves it at spawn time,
/// since `Props::new` is called with no system in scope to ask.
pub struct Props<A: Actor> {
    pub producer: BoxActorProd<A>,
    pub dispatcher: Option<Dispatcher>,
    pub mailbox_capacity: MailboxCapacity,
    pub well_known: bool,
    pub start_immediately: bool,
}

impl<A: Actor> Clone for Props<A> {
    fn clone(&self) -> Self {
        Props {
            producer: self.producer.clone(),
            dispatcher: self.dispatcher.clone(),
            mailbox_capacity: self.mailbox_capacity,
            well_known: self.well_known,
            start_immediately: self.start_immediately,
        }
    }
}

impl<A: ActorFactory> Props<A> {
    pub fn new() -> Props<A> {
        Props {
            producer: Arc::new(NoArgs {
                _marker: std::marker::PhantomData,
            }),
            dispatcher: None,
            mailbox_capacity: MailboxCapacity::Unbounded,
            well_known: false,
            start_immediately: true,
        }
    }
}

impl<A: Actor> Props<A> {
    pub fn new_args<Args>(args: Args) -> Props<A>
    where
        A: ActorFactoryArgs<Args>,
        Args: Clone + Send + Sync + 'static,
    {
        Props {
            producer: Arc::new(WithArgs {
                args,
                _marker: std::marker::PhantomData,
            }),
            dispatcher: None,
            mailbox_capacity: MailboxCapacity::Unbounded,
            well_known: false,
            start_immediately: true,
        }
    }

    /// Selects the dispatcher this actor runs on, one of the three
    /// closed variants. Left unset, the actor runs on the system's default
    /// `FixedThreadPool`.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: MailboxCapacity) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Marks the actor well-known: its address carries the perpetual
    /// incarnation sentinel instead of a fresh tag.
    pub fn well_known(mut self, well_known: bool) -> Self {
        self.well_known = well_known;
        self
    }

    /// When `false`, the actor is parked right after its mailbox exists:
    /// `pre_start`/`post_start` do not run and no queued message is drained
    /// until the returned `ActorRef::wake` is called. Messages sent in the
    /// meantime still queue in FIFO order and are processed after `Start`
    /// once woken.
    pub fn start_immediately(mut self, start_immediately: bool) -> Self {
        self.start_immediately = start_immediately;
        self
    }
}
