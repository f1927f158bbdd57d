use std::time::Duration;

use kestrel::actors::*;

struct Noop;

impl ActorFactory for Noop {
    fn create() -> Self {
        Noop
    }
}

impl Actor for Noop {
    type Msg = ();

    fn recv(&mut self, _: &Context<Self::Msg>, _: Self::Msg, _: Sender) {}
}

#[test]
fn system_name_and_identity() {
    let sys = ActorSystem::with_name("my-system").unwrap();
    assert_eq!(sys.name(), "my-system");
    assert!(!sys.host().is_empty());
}

#[test]
fn system_rejects_invalid_name() {
    assert!(ActorSystem::with_name("not a valid name!").is_err());
}

#[test]
fn uptime_is_monotonic_nondecreasing() {
    let sys = ActorSystem::new().unwrap();
    let first = sys.uptime();
    std::thread::sleep(Duration::from_millis(10));
    let second = sys.uptime();
    assert!(second >= first);
}

#[test]
fn print_tree_lists_bootstrapped_guardians() {
    let sys = ActorSystem::new().unwrap();
    sys.actor_of::<Noop>("leaf").unwrap();

    let tree = sys.print_tree();
    assert!(tree.iter().any(|line| line.contains("user")));
    assert!(tree.iter().any(|line| line.contains("system")));
    assert!(tree.iter().any(|line| line.contains("leaf")));
}

#[test]
fn shutdown_drains_the_user_tree() {
    let sys = ActorSystem::new().unwrap();
    sys.actor_of::<Noop>("leaf").unwrap();
    assert!(sys.user_root().has_children());

    sys.shutdown();

    assert!(!sys.user_root().has_children());
}
