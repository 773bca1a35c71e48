use tracing::error;

use crate::error::AppError;
use crate::notify::Notifier;

/// 记录错误并弹出提示。过期响应和重复提交静默丢弃
pub fn report_error(notifier: &dyn Notifier, context: &str, err: &AppError) {
    if err.is_silent() {
        tracing::debug!(context, error = %err, "suppressed error");
        return;
    }

    error!("{} failed: {}", context, err);
    notifier.error(&err.user_message());
}
