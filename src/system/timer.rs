use std::sync::mpsc::{channel, Sender as StdSender};
use std::thread;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::{
    actor::{ActorRef, BasicActorRef, Sender},
    AnyMessage, Message,
};

/// Opaque handle returned by `Timer::schedule`/`schedule_once`, used to
/// cancel a pending job.
pub type ScheduleId = Uuid;

#[derive(Clone)]
pub struct TimerRef(StdSender<Job>);

impl TimerRef {
    pub fn send(&self, job: Job) {
        // The background thread only ever stops when the `ActorSystem` (and
        // this sender along with it) is dropped, so a disconnected channel
        // means there is nothing left to schedule against anyway.
        let _ = self.0.send(job);
    }
}

pub trait Timer {
    /// Sends `msg` to `receiver` every `interval`, starting `initial_delay`
    /// from now.
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
        M: Message;

    /// Sends `msg` to `receiver` once, after `delay`.
    fn schedule_once<T, M>(
        &self,
        delay: Duration,
        receiver: ActorRef<M>,
        sender: Sender,
        msg: T,
    ) -> ScheduleId
    where
        T: Message + Into<M>,
        M: Message;

    /// Cancels a pending job scheduled by `schedule`/`schedule_once`. A
    /// no-op if `id` already fired or was never valid.
    fn cancel_schedule(&self, id: ScheduleId);
}

pub enum Job {
    Once(OnceJob),
    Repeat(RepeatJob),
    Cancel(Uuid),
}

pub struct OnceJob {
    pub id: Uuid,
    pub send_at: SystemTime,
    pub receiver: BasicActorRef,
    pub sender: Sender,
    pub msg: AnyMessage,
}

impl OnceJob {
    pub fn send(mut self) {
        let _ = self.receiver.try_tell_any(&mut self.msg, self.sender);
    }
}

pub struct RepeatJob {
    pub id: Uuid,
    pub send_at: SystemTime,
    pub interval: Duration,
    pub receiver: BasicActorRef,
    pub sender: Sender,
    pub msg: AnyMessage,
}

impl RepeatJob {
    pub fn send(&mut self) {
        let _ = self.receiver.try_tell_any(&mut self.msg, self.sender.clone());
    }
}

/// Default `Timer` implementation. Jobs are kept on a single
/// background thread and polled on `BasicTimerConfig::frequency_millis` —
/// there is no actor involved in scheduling itself, so it doesn't need the
/// dispatcher pool.
pub struct BasicTimer {
    once_jobs: Vec<OnceJob>,
    repeat_jobs: Vec<RepeatJob>,
}

impl BasicTimer {
    pub fn start(cfg: &BasicTimerConfig) -> TimerRef {
        let frequency = Duration::from_millis(cfg.frequency_millis);
        let mut process = BasicTimer {
            once_jobs: Vec::new(),
            repeat_jobs: Vec::new(),
        };

        let (tx, rx) = channel::<Job>();
        thread::Builder::new()
            .name("kestrel-timer".into())
            .spawn(move || loop {
                process.execute_once_jobs();
                process.execute_repeat_jobs();

                while let Ok(job) = rx.try_recv() {
                    match job {
                        Job::Cancel(id) => process.cancel(&id),
                        Job::Once(job) => process.schedule_once(job),
                        Job::Repeat(job) => process.schedule_repeat(job),
                    }
                }

                thread::sleep(frequency);
            })
            .expect("failed to start timer thread");

        TimerRef(tx)
    }

    pub fn execute_once_jobs(&mut self) {
        let (send, keep): (Vec<OnceJob>, Vec<OnceJob>) = self
            .once_jobs
            .drain(..)
            .partition(|j| SystemTime::now() >= j.send_at);

        for job in send.into_iter() {
            job.send();
        }

        for job in keep.into_iter() {
            self.once_jobs.push(job);
        }
    }

    pub fn execute_repeat_jobs(&mut self) {
        for job in self.repeat_jobs.iter_mut() {
            if SystemTime::now() >= job.send_at {
                job.send_at = SystemTime::now() + job.interval;
                job.send();
            }
        }
    }

    pub fn cancel(&mut self, id: &Uuid) {
        // Don't know which vec the job landed in, so check both.
        if let Some(pos) = self.once_jobs.iter().position(|job| &job.id == id) {
            self.once_jobs.remove(pos);
        }

        if let Some(pos) = self.repeat_jobs.iter().position(|job| &job.id == id) {
            self.repeat_jobs.remove(pos);
        }
    }

    pub fn schedule_once(&mut self, job: OnceJob) {
        if SystemTime::now() >= job.send_at {
            job.send();
        } else {
            self.once_jobs.push(job);
        }
    }

    pub fn schedule_repeat(&mut self, mut job: RepeatJob) {
        if SystemTime::now() >= job.send_at {
            job.send();
        }
        self.repeat_jobs.push(job);
    }
}

/// Polling interval for the background timer thread.
#[derive(Clone, Debug)]
pub struct BasicTimerConfig {
    pub frequency_millis: u64,
}

impl Default for BasicTimerConfig {
    fn default() -> Self {
        BasicTimerConfig {
            frequency_millis: 50,
        }
    }
}

impl BasicTimerConfig {
    pub(crate) fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let t = v.as_table()?;
        if let Some(n) = t.get("frequency_millis").and_then(toml::Value::as_integer) {
            self.frequency_millis = n as u64;
        }
        Some(())
    }
}
