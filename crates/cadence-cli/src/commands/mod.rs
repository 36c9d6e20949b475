pub mod apply;
pub mod plan;
pub mod preview;
pub mod split;
