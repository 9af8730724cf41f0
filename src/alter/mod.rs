//! Conv2d layout alteration for texture-memory GPU targets.

pub mod blocking;
pub mod error;
pub mod flags;
pub mod strategy;
pub mod texture;
pub mod winograd;

pub use blocking::{BlockedFamily, CHANNEL_BLOCK, ChannelBlocks, derive_block};
pub use error::AlterError;
pub use flags::{AlterFlags, tuning_log_path};
pub use strategy::{
    AlterKind, AlterStrategy, Altered, ConvAlterPass, ConvRequest, StrategyRegistry,
};
pub use texture::{Rewrite, TemplateFamily, TextureConvAlter};
pub use winograd::{DefaultTileSize, TileSizeOracle, workload_name};
