use crate::{
    kernel::dispatcher::ThreadPoolConfig, kernel::mailbox::MailboxConfig,
    system::logger::LoggerConfig, system::timer::BasicTimerConfig,
};

#[derive(Clone)]
pub struct Config {
    pub debug: bool,
    pub log: LoggerConfig,
    pub mailbox: MailboxConfig,
    pub dispatcher: ThreadPoolConfig,
    pub scheduler: BasicTimerConfig,
    pub shutdown: ShutdownConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: true,
            log: LoggerConfig::default(),
            mailbox: MailboxConfig::default(),
            dispatcher: ThreadPoolConfig::default(),
            scheduler: BasicTimerConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl Config {
    // Option<()> allow to use ? for parsing toml value, ignore it
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(debug) = v.get("debug").and_then(toml::Value::as_bool) {
            self.debug = debug;
        }
        if let Some(log) = v.get("log") {
            self.log.merge(log);
        }
        if let Some(mailbox) = v.get("mailbox") {
            self.mailbox.merge(mailbox);
        }
        if let Some(dispatcher) = v.get("dispatcher") {
            self.dispatcher.merge(dispatcher);
        }
        if let Some(scheduler) = v.get("scheduler") {
            self.scheduler.merge(scheduler);
        }
        if let Some(shutdown) = v.get("shutdown") {
            self.shutdown.merge(shutdown);
        }
        None
    }
}

/// How long `ActorSystem::shutdown` waits for the user tree to drain before
/// giving up on an orderly unbind.
#[derive(Clone, Debug)]
pub struct ShutdownConfig {
    pub unbind_deadline_millis: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        ShutdownConfig {
            unbind_deadline_millis: 300,
        }
    }
}

impl ShutdownConfig {
    pub(crate) fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let t = v.as_table()?;
        if let Some(n) = t
            .get("unbind_deadline_millis")
            .and_then(toml::Value::as_integer)
        {
            self.unbind_deadline_millis = n as u64;
        }
        Some(())
    }
}

pub fn load_config() -> Config {
    use std::{
        env,
        fs::File,
        io::{self, Read},
    };

    let mut cfg = Config::default();

    // kestrel.toml contains settings for anything related to the actor
    // runtime and its modules.
    let path = env::var("KESTREL_CONF").unwrap_or_else(|_| "config/kestrel.toml".into());
    let cfg_amendment = File::open(path)
        .and_then(|mut f| {
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            Ok(s)
        })
        .and_then(|s| {
            toml::from_str::<toml::Value>(&s).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        });
    if let Ok(cfg_amendment) = cfg_amendment {
        cfg.merge(&cfg_amendment);
    }

    cfg
}
