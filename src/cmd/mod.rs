pub mod command_tree;
pub mod execute;
pub mod pipeline;
pub mod redirect;
pub mod sequence;
