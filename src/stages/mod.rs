pub mod stage0_normalize;
pub mod stage1_entities;
pub mod stage2_generate;
pub mod stage3_render;

pub use stage0_normalize::*;
pub use stage1_entities::*;
pub use stage2_generate::*;
pub use stage3_render::*;
