//! End-to-end pipeline tests: source text through the scanner, the
//! single-pass compiler, the VM, and the subsystem boundary API.

mod fixtures;

mod arithmetic;
mod diagnostics;
mod events;
mod scenario;
mod timers;
mod transitions;
