// Adapters layer: concrete implementations of the domain ports (storage, transport, notices).

pub mod notifier;
pub mod prefs;
pub mod xmlrpc;
