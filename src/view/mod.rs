pub mod pipeline;
pub mod selection;
pub mod state;
pub mod suggest;
pub mod tooltip;
