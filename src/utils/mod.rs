// 通用工具：时钟、防抖、请求序号

pub mod clock;
pub mod debounce;
pub mod sequence;

// 重新导出常用类型
pub use clock::{Clock, ManualClock, SystemClock};
pub use debounce::Debouncer;
pub use sequence::{RequestSequence, Ticket};
