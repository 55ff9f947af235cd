//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `run_manager` - 运行管理器
//! - 校验请求、登记运行、在后台任务中执行
//! - 状态查询 / 下载 / 取消
//!
//! ### `run_processor` - 单次运行处理器
//! - 获取并释放浏览器会话
//! - 按导航模式创建策略，遍历输入列表
//! - 写行、计数、节奏控制
//!
//! ### `registry` - 运行登记表
//!
//! ## 层次关系
//!
//! ```text
//! run_manager (处理 RunRequest)
//!     ↓
//! run_processor (处理 Vec<input>)
//!     ↓
//! workflow::NavigationFlow (处理单条输入)
//!     ↓
//! services (能力层：extract / csv / pacing)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod registry;
pub mod run_manager;
pub mod run_processor;

pub use registry::{CancelFlag, CancelOutcome, RunRegistry};
pub use run_manager::{RunManager, RunTicket};
pub use run_processor::{execute_run, RunJob};
