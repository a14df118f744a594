//! A minimal progress-reporting trait, modeled on the teacher's
//! `git_features::progress::Progress` (seen driving the pack index writer in
//! `git-odb/src/pack/index/write/mod.rs`). Kept deliberately small: callers
//! who don't care about progress use [`Discard`] and pay nothing but a
//! vtable call.

pub trait Progress: Send {
    type SubProgress: Progress;

    fn init(&mut self, max: Option<usize>, unit: Option<&'static str>);
    fn inc(&mut self);
    fn inc_by(&mut self, amount: usize);
    fn add_child(&mut self, name: impl Into<String>) -> Self::SubProgress;
    fn show_throughput(&mut self, start: std::time::Instant, amount: u32, unit: &str);
}

/// A `Progress` implementation that does nothing; the default for callers
/// who only want the resulting value, not a percentage.
#[derive(Default, Clone, Copy)]
pub struct Discard;

impl Progress for Discard {
    type SubProgress = Discard;

    fn init(&mut self, _max: Option<usize>, _unit: Option<&'static str>) {}
    fn inc(&mut self) {}
    fn inc_by(&mut self, _amount: usize) {}
    fn add_child(&mut self, _name: impl Into<String>) -> Self::SubProgress {
        Discard
    }
    fn show_throughput(&mut self, _start: std::time::Instant, _amount: u32, _unit: &str) {}
}
