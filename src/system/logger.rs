use slog::{o, Drain};

use crate::actor::{
    Actor, ActorFactoryArgs, ActorRef, ActorReference, All, BasicActorRef, ChannelMsg, Context,
    DeadLetter, Props, Subscribe,
};

/// Builds the system's default `slog::Logger`. Async-drained so actors
/// logging from inside `recv` never block on the terminal/file sink.
pub fn default_log(cfg: &LoggerConfig) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, cfg.level).fuse();
    slog::Logger::root(drain, o!())
}

/// Logging verbosity and dead-letter reporting knobs.
#[derive(Clone)]
pub struct LoggerConfig {
    pub level: slog::Level,
    pub log_dead_letters: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: slog::Level::Info,
            log_dead_letters: true,
        }
    }
}

impl LoggerConfig {
    pub(crate) fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let t = v.as_table()?;
        if let Some(level) = t.get("level").and_then(toml::Value::as_str) {
            if let Some(level) = level.parse::<slog::Level>().ok() {
                self.level = level;
            }
        }
        if let Some(b) = t
            .get("log_dead_letters")
            .and_then(toml::Value::as_bool)
        {
            self.log_dead_letters = b;
        }
        Some(())
    }
}

/// Subscribes to the dead letters channel and logs each one through
/// the system's `slog::Logger`.
pub struct DeadLetterLogger {
    dl_chan: ActorRef<ChannelMsg<DeadLetter>>,
    log: slog::Logger,
}

impl ActorFactoryArgs<(ActorRef<ChannelMsg<DeadLetter>>, slog::Logger)> for DeadLetterLogger {
    fn create_args((dl_chan, log): (ActorRef<ChannelMsg<DeadLetter>>, slog::Logger)) -> Self {
        DeadLetterLogger { dl_chan, log }
    }
}

impl DeadLetterLogger {
    pub fn props(
        dl_chan: &ActorRef<ChannelMsg<DeadLetter>>,
        log: slog::Logger,
    ) -> Props<DeadLetterLogger> {
        Props::new_args((dl_chan.clone(), log))
    }
}

impl Actor for DeadLetterLogger {
    type Msg = DeadLetter;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        let sub = Box::new(ctx.myself());
        self.dl_chan.tell(
            Subscribe {
                topic: All.into(),
                actor: sub,
            },
            None,
        );
    }

    fn recv(&mut self, _: &Context<Self::Msg>, msg: Self::Msg, _: Option<BasicActorRef>) {
        slog::info!(
            self.log,
            "dead letter";
            "sender" => ?msg.sender,
            "recipient" => %msg.recipient.path(),
            "msg" => ?msg.msg,
        );
    }
}
