//! Shared test fakes for the rayext workspace.
//!
//! Lifecycle tests run against these instead of the network, a terminal or
//! a real package manager. It is a dev-dependency only, never published.
//!
//! - [`remote`]: in-memory [`FakeRemote`] that counts calls
//! - [`decider`]: [`ScriptedDecider`] replaying canned answers
//! - [`runner`]: [`RecordingRunner`] that records install and build calls
//! - [`zipball`]: builders for host-style zip archives

pub mod decider;
pub mod remote;
pub mod runner;
pub mod zipball;

pub use decider::{Answer, Prompt, ScriptedDecider};
pub use remote::{FakeRemote, RemoteCall};
pub use runner::{RecordingRunner, RunnerCall};
pub use zipball::{extension_zipball, monorepo_zipball, zipball};
