//! Builders that assemble the queue and coordinator from configuration.

pub mod coordinator_builder;

pub use coordinator_builder::{
    build_coordinator, build_finviz_coordinator, build_queue, FinvizCoordinator,
};
