//! 授权链路指标

use std::time::Duration;

use ::metrics::{counter, histogram};

use crate::guard::AuthzStage;
use crate::principal::Action;

/// 记录一次授权结论
pub fn record_decision(action: Action, stage: AuthzStage, allowed: bool) {
    let labels = [
        ("action", action.as_str().to_string()),
        ("outcome", if allowed { "allow" } else { "deny" }.to_string()),
        ("stage", stage.as_str().to_string()),
    ];
    counter!("authorization_decisions_total", &labels).increment(1);
}

/// 记录决策点 check 耗时
pub fn record_check_duration(action: Action, elapsed: Duration) {
    let labels = [("action", action.as_str().to_string())];
    histogram!("authorization_check_duration_ms", &labels).record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录 sync 失败
pub fn record_sync_failure() {
    counter!("policy_sync_failures_total").increment(1);
}
