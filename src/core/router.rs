//! 修订路由：根据审核结果决定通过、回到哪个阶段重做，或升级人工处理
//!
//! 上限检查先于决策分支：当前已是最后一次允许的尝试（`revision_count == limit - 1`）时，
//! 任何非 APPROVED 的结果都直接升级，不再消耗修订额度。

use crate::agents::{ReviewReport, RoutingDecision};

/// 路由结果
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAction {
    /// 审核通过
    Accept,
    /// 重做大纲，再带着新大纲重写
    ReviseOutline { feedback: String },
    /// 沿用当前大纲，带着审核意见重写
    Redraft { feedback: String },
    /// 终止修订循环，交给人工
    Escalate { reason: String },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RevisionRouter;

impl RevisionRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, review: &ReviewReport, revision_count: u32, limit: u32) -> RouteAction {
        if review.routing_decision == RoutingDecision::Approved {
            return RouteAction::Accept;
        }
        if revision_count + 1 >= limit {
            return RouteAction::Escalate {
                reason: format!(
                    "revision limit {} reached with decision {}",
                    limit, review.routing_decision
                ),
            };
        }
        match review.routing_decision {
            RoutingDecision::ReviseStructure => RouteAction::ReviseOutline {
                feedback: review.feedback(),
            },
            RoutingDecision::ReviseContent | RoutingDecision::AdjustTone => RouteAction::Redraft {
                feedback: review.feedback(),
            },
            other => RouteAction::Escalate {
                reason: format!("review requested {}: {}", other, review.reason),
            },
        }
    }
}
