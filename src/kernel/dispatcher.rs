use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll, RawWaker, RawWakerVTable, Waker};

/// A unit of work submitted to a dispatcher. Always a synchronous body
/// wrapped in `async move { ... }` — actors never suspend mid-activation
/// so every job here is expected to resolve on first poll.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Raised when a dispatcher can no longer accept work.
#[derive(Debug, Clone)]
pub struct DispatcherUnavailable;

impl std::fmt::Display for DispatcherUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("dispatcher is not accepting work")
    }
}

impl std::error::Error for DispatcherUnavailable {}

/// The three dispatcher kinds. Closed on purpose: there is no
/// catch-all arm, an unnamed fourth kind simply cannot be constructed.
#[derive(Clone)]
pub enum Dispatcher {
    FixedThreadPool(Arc<FixedThreadPool>),
    CallingThread(Arc<AtomicBool>),
    ExternalEventLoop(Arc<ExternalEventLoop>),
}

pub struct FixedThreadPool {
    runtime: tokio::runtime::Runtime,
    open: AtomicBool,
}

pub struct ExternalEventLoop {
    handle: tokio::runtime::Handle,
    open: AtomicBool,
}

impl Dispatcher {
    pub fn fixed_thread_pool(pool_size: usize, stack_size: usize) -> Self {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.worker_threads(pool_size.max(1));
        if stack_size > 0 {
            builder.thread_stack_size(stack_size);
        }
        let runtime = builder
            .enable_time()
            .thread_name("kestrel-worker")
            .build()
            .expect("failed to build dispatcher thread pool");

        Dispatcher::FixedThreadPool(Arc::new(FixedThreadPool {
            runtime,
            open: AtomicBool::new(true),
        }))
    }

    pub fn calling_thread() -> Self {
        Dispatcher::CallingThread(Arc::new(AtomicBool::new(true)))
    }

    pub fn external_event_loop(handle: tokio::runtime::Handle) -> Self {
        Dispatcher::ExternalEventLoop(Arc::new(ExternalEventLoop {
            handle,
            open: AtomicBool::new(true),
        }))
    }

    /// Submits `job` for execution. Non-blocking, bounded (a
    /// dispatcher never blocks the caller waiting for capacity).
    pub fn execute(&self, job: Job) -> Result<(), DispatcherUnavailable> {
        match self {
            Dispatcher::FixedThreadPool(pool) => {
                if !pool.open.load(Ordering::Acquire) {
                    return Err(DispatcherUnavailable);
                }
                pool.runtime.spawn(job);
                Ok(())
            }
            Dispatcher::ExternalEventLoop(ev) => {
                if !ev.open.load(Ordering::Acquire) {
                    return Err(DispatcherUnavailable);
                }
                ev.handle.spawn(job);
                Ok(())
            }
            Dispatcher::CallingThread(open) => {
                if !open.load(Ordering::Acquire) {
                    return Err(DispatcherUnavailable);
                }
                block_on_now(job);
                Ok(())
            }
        }
    }

    /// Stops accepting new work. Does not forcibly interrupt jobs already
    /// running; bounded drain is approximated by the caller's own deadline
    /// .
    pub fn shutdown(&self) {
        match self {
            Dispatcher::FixedThreadPool(pool) => pool.open.store(false, Ordering::Release),
            Dispatcher::ExternalEventLoop(ev) => ev.open.store(false, Ordering::Release),
            Dispatcher::CallingThread(open) => open.store(false, Ordering::Release),
        }
    }
}

/// Polls `job` to completion on the calling thread without a real
/// executor. Every job this crate submits is synchronous work wrapped in
/// an `async move` block with no genuine await point, so a single poll
/// always returns `Ready`; this exists only so `CallingThread` does not
/// need to pull in a second runtime just to drive one poll.
/// Sizing for the system's default `FixedThreadPool`. `stack_size`
/// of `0` leaves tokio's own default in place.
#[derive(Clone, Debug)]
pub struct ThreadPoolConfig {
    pub pool_size: usize,
    pub stack_size: usize,
}

/// Default worker count for the system's `FixedThreadPool`, independent of
/// the host's core count so behavior doesn't shift between machines.
const DEFAULT_POOL_SIZE: usize = 4;

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        ThreadPoolConfig {
            pool_size: DEFAULT_POOL_SIZE,
            stack_size: 0,
        }
    }
}

impl ThreadPoolConfig {
    pub(crate) fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let t = v.get("dispatcher")?;
        if let Some(n) = t.get("pool_size").and_then(toml::Value::as_integer) {
            self.pool_size = n as usize;
        }
        if let Some(n) = t.get("stack_size").and_then(toml::Value::as_integer) {
            self.stack_size = n as usize;
        }
        Some(())
    }
}

fn block_on_now(mut job: Job) {
    fn noop(_: *const ()) {}
    fn clone(_: *const ()) -> RawWaker {
        raw_waker()
    }
    fn raw_waker() -> RawWaker {
        const VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }
    let waker = unsafe { Waker::from_raw(raw_waker()) };
    let mut cx = TaskContext::from_waker(&waker);
    loop {
        match job.as_mut().poll(&mut cx) {
            Poll::Ready(()) => return,
            Poll::Pending => continue,
        }
    }
}
