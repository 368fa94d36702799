//! 分发层核心
//!
//! 包含远程端点故障转移解析、本地兜底回复、门控扇出通知，
//! 以及把聊天与联系表单请求接到上述组件上的编排器。

pub mod fallback;
pub mod fanout;
pub mod notifications;
pub mod orchestrator;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use fallback::*;
pub use fanout::*;
pub use notifications::*;
pub use orchestrator::*;
pub use resolver::*;
