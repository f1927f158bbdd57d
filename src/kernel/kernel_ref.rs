use std::sync::{Arc, OnceLock};

use crate::{
    actor::{MsgError, MsgResult},
    kernel::{
        dispatcher::Dispatcher,
        mailbox::{AnySender, MailboxSchedule, MailboxSender},
    },
    AnyMessage, Envelope, Message,
};

type Job = Box<dyn Fn() + Send + Sync>;

struct KernelOps {
    run: Job,
    restart: Job,
    terminate: Job,
}

struct KernelInner {
    dispatcher: Dispatcher,
    ops: OnceLock<KernelOps>,
}

/// An actor's handle onto its own dispatcher. Scheduling a mailbox run,
/// restarting, or terminating all reduce to "submit a job to this actor's
/// `Dispatcher`" — there is no separate control-message channel.
#[derive(Clone)]
pub struct KernelRef {
    inner: Arc<KernelInner>,
}

impl KernelRef {
    pub(crate) fn new(dispatcher: Dispatcher) -> KernelRef {
        KernelRef {
            inner: Arc::new(KernelInner {
                dispatcher,
                ops: OnceLock::new(),
            }),
        }
    }

    /// Attaches the run/restart/terminate bodies. Called once, right after
    /// construction, by `kernel::kernel` — the bodies close over the
    /// actor's `Dock`, which isn't available until the cell and mailbox
    /// exist, so this can't happen inside `new`.
    pub(crate) fn install(
        &self,
        run: impl Fn() + Send + Sync + 'static,
        restart: impl Fn() + Send + Sync + 'static,
        terminate: impl Fn() + Send + Sync + 'static,
    ) {
        let _ = self.inner.ops.set(KernelOps {
            run: Box::new(run),
            restart: Box::new(restart),
            terminate: Box::new(terminate),
        });
    }

    pub(crate) fn schedule(&self) {
        self.submit(|ops| (ops.run)());
    }

    pub(crate) fn restart(&self) {
        self.submit(|ops| (ops.restart)());
    }

    pub(crate) fn terminate(&self) {
        self.submit(|ops| (ops.terminate)());
    }

    fn submit(&self, call: fn(&KernelOps)) {
        let inner = self.inner.clone();
        let job = Box::pin(async move {
            if let Some(ops) = inner.ops.get() {
                call(ops);
            }
        });
        let _ = self.inner.dispatcher.execute(job);
    }
}

unsafe impl Send for KernelRef {}
unsafe impl Sync for KernelRef {}

pub fn dispatch<Msg>(
    msg: Envelope<Msg>,
    mbox: &MailboxSender<Msg>,
    kernel: &KernelRef,
) -> MsgResult<Msg>
where
    Msg: Message,
{
    match mbox.try_enqueue(msg) {
        Ok(_) => {
            if mbox.try_acquire_schedule() {
                kernel.schedule();
            }
            Ok(())
        }
        Err(e) => Err(MsgError::new(e.msg)),
    }
}

pub use crate::kernel::mailbox::AnyEnqueueError;

pub fn dispatch_any(
    msg: &mut AnyMessage,
    sender: crate::actor::Sender,
    mbox: &Arc<dyn AnySender>,
    kernel: &KernelRef,
) -> Result<(), AnyEnqueueError> {
    mbox.try_any_enqueue(msg, sender).map(|_| {
        if mbox.try_acquire_sched() {
            kernel.schedule();
        }
    })
}
