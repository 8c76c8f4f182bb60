//! Integration tests for bucketsync-sync
//!
//! Drives the engine and the runner end to end over in-memory
//! implementations of every port: a scripted metadata subscription, a
//! filer holding the configuration directory, and a recording remote store.


mod test_engine;
mod test_runner;
