pub mod stage0_clean;
pub mod stage1_consensus;
pub mod stage2_assemble;

pub use stage0_clean::*;
pub use stage1_consensus::*;
pub use stage2_assemble::*;
