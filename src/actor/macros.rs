pub use kestrel_macros::actor;
