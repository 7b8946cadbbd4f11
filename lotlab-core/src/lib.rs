//! lotlab core: domain types, signal execution, martingale lot state machine,
//! trade extraction.
//!
//! This crate is pure, synchronous computation over an in-memory bar series:
//! - Domain types (bars, sides, position state, per-bar output, fills, trades)
//! - Ingestion of raw rows into validated bars
//! - Plain signal executor (fixed size)
//! - Martingale engine as a pure per-bar transition
//! - Trade extraction from per-bar output

pub mod domain;
pub mod engine;

pub use domain::{
    Bar, BarOutput, Direction, Fill, FillAction, FillNote, PositionState, RawBar, Side, Trade,
};
pub use engine::{
    extract_trades, run_martingale, run_signals, Engine, EngineError, EngineRun, ExecutionConfig,
    MartingaleConfig, MartingaleEngine, SignalExecutor,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core types are Send + Sync, so independent runs
    /// can be spread across worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<BarOutput>();
        require_sync::<BarOutput>();
        require_send::<Fill>();
        require_sync::<Fill>();
        require_send::<Trade>();
        require_sync::<Trade>();
        require_send::<PositionState>();
        require_sync::<PositionState>();
        require_send::<EngineRun>();
        require_sync::<EngineRun>();
        require_send::<MartingaleConfig>();
        require_sync::<MartingaleConfig>();
        require_send::<ExecutionConfig>();
        require_sync::<ExecutionConfig>();
        require_send::<EngineError>();
        require_sync::<EngineError>();
    }

    /// The engine trait is object safe and usable across threads.
    #[test]
    fn engine_trait_objects_are_shareable() {
        let engines: Vec<Box<dyn Engine>> = vec![
            Box::new(SignalExecutor::default()),
            Box::new(MartingaleEngine::default()),
        ];
        let names: Vec<&str> = engines.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["signals", "martingale"]);

        fn require_send_sync<T: Send + Sync + ?Sized>(_: &T) {}
        for engine in &engines {
            require_send_sync(engine.as_ref());
        }
    }
}
