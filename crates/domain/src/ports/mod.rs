//! 外部协作方的抽象接口
//!
//! 远程回复提供方与投递通道都只返回成功或带分类的失败，
//! 具体实现位于 infrastructure crate。

pub mod delivery;
pub mod provider;

pub use delivery::*;
pub use provider::*;
