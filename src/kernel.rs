pub(crate) mod dispatcher;
pub(crate) mod kernel_ref;
pub(crate) mod mailbox;
pub(crate) mod provider;
pub(crate) mod queue;

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
};

use slog::warn;

use crate::{
    actor::actor_cell::ExtendedCell,
    actor::*,
    kernel::{
        dispatcher::Dispatcher,
        kernel_ref::KernelRef,
        mailbox::{flush_to_deadletters, run_mailbox, Mailbox},
    },
    system::{ActorRestarted, ActorTerminated, SystemMsg},
    Message,
};

pub struct Dock<A: Actor> {
    pub actor: Arc<Mutex<Option<A>>>,
    pub cell: ExtendedCell<A::Msg>,
}

impl<A: Actor> Clone for Dock<A> {
    fn clone(&self) -> Dock<A> {
        Dock {
            actor: self.actor.clone(),
            cell: self.cell.clone(),
        }
    }
}

/// Wires an actor's `Dock` to a `KernelRef`. Scheduling,
/// restarting and terminating are jobs submitted to `dispatcher`; there is
/// no background task driving this actor besides those jobs.
///
/// Construction order matters: the `run`/`restart`/`terminate` closures all
/// capture `actor_ref`, but `actor_ref` can't exist until `cell` already has
/// a kernel handle installed (`ActorRef` derefs to `BasicActorRef` via the
/// cell). So `KernelRef::new` comes first, then `cell.init`, then the
/// closures, then `kr.install`.
pub fn kernel<A>(
    producer: BoxActorProd<A>,
    dispatcher: Dispatcher,
    cell: ExtendedCell<A::Msg>,
    mailbox: Mailbox<A::Msg>,
    sys: &ActorSystem,
) -> Result<KernelRef, CreateError>
where
    A: Actor + 'static,
{
    let kr = KernelRef::new(dispatcher);

    let actor = start_actor(&producer)?;
    let cell = cell.init(&kr);
    let dock = Dock {
        actor: Arc::new(Mutex::new(Some(actor))),
        cell: cell.clone(),
    };
    let actor_ref = ActorRef::new(cell);
    let asys = sys.clone();

    let run = {
        let dock = dock.clone();
        let actor_ref = actor_ref.clone();
        let asys = asys.clone();
        let kr = kr.clone();
        let mailbox = mailbox.clone();
        move || {
            let ctx = Context {
                myself: actor_ref.clone(),
                system: asys.clone(),
            };
            let mut dock = dock.clone();
            let _ = catch_unwind(AssertUnwindSafe(|| {
                run_mailbox(&mailbox, ctx, &mut dock, &kr)
            }));
        }
    };

    let restart = {
        let dock = dock.clone();
        let actor_ref = actor_ref.clone();
        let asys = asys.clone();
        let producer = producer.clone();
        move || restart_actor(&dock, actor_ref.clone().into(), &producer, &asys)
    };

    let terminate = {
        let actor_ref = actor_ref.clone();
        let asys = asys.clone();
        let mailbox = mailbox.clone();
        move || terminate_actor(&mailbox, actor_ref.clone().into(), &asys)
    };

    kr.install(run, restart, terminate);

    Ok(kr)
}

fn restart_actor<A>(
    dock: &Dock<A>,
    actor_ref: BasicActorRef,
    producer: &BoxActorProd<A>,
    sys: &ActorSystem,
) where
    A: Actor,
{
    let mut a = dock.actor.lock().unwrap();
    match start_actor(producer) {
        Ok(actor) => {
            *a = Some(actor);
            actor_ref.sys_tell(SystemMsg::ActorInit);
            sys.publish_event(ActorRestarted { actor: actor_ref }.into());
        }
        Err(_) => {
            warn!(sys.log(), "Actor failed to restart: {:?}", actor_ref);
        }
    }
}

fn terminate_actor<Msg>(mbox: &Mailbox<Msg>, actor_ref: BasicActorRef, sys: &ActorSystem)
where
    Msg: Message,
{
    sys.provider().unregister(actor_ref.path());
    flush_to_deadletters(mbox, &actor_ref, sys);
    sys.publish_event(
        ActorTerminated {
            actor: actor_ref.clone(),
        }
        .into(),
    );

    // Targeted delivery to whoever called `watch(&actor_ref)` — distinct
    // from the broadcast above, which every events-channel subscriber sees.
    for watcher in actor_ref.cell.watchers() {
        watcher.sys_tell(
            ActorTerminated {
                actor: actor_ref.clone(),
            }
            .into(),
        );
    }

    let parent = actor_ref.parent();
    if !parent.is_root() {
        parent.sys_tell(ActorTerminated { actor: actor_ref }.into());
    }
}

fn start_actor<A>(producer: &BoxActorProd<A>) -> Result<A, CreateError>
where
    A: Actor,
{
    catch_unwind(|| producer.produce()).map_err(|_| CreateError::Panicked)
}
