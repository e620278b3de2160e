//! 装配诊断
//!
//! 一次启动过程中按顺序记录能力绑定、实例构造、字段赋值和钩子调用，
//! 启动结束时整体输出到日志后丢弃。

use chrono::{DateTime, Utc};
use infrastructure_common::Scope;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use uuid::Uuid;

/// 装配事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum WiringEvent {
    /// 能力到实现的绑定
    Binding {
        capability: String,
        qualifier: String,
        implementation: String,
    },
    /// 实例构造完成
    Constructed {
        component: String,
        scope: Scope,
        arity: usize,
    },
    /// 字段赋值
    FieldAssigned {
        component: String,
        field: String,
        required: String,
        resolved: String,
        /// 赋值时被注入的实例仍处于装配中
        partial: bool,
    },
    /// 初始化钩子调用
    HookInvoked { component: String, hook: String },
}

impl fmt::Display for WiringEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding {
                capability,
                qualifier,
                implementation,
            } => write!(f, "binding {capability} [{qualifier}] -> {implementation}"),
            Self::Constructed {
                component,
                scope,
                arity,
            } => write!(f, "construct {component} ({scope}, {arity} args)"),
            Self::FieldAssigned {
                component,
                field,
                required,
                resolved,
                partial,
            } => {
                write!(f, "inject {component}.{field}: {required} <- {resolved}")?;
                if *partial {
                    write!(f, " (partial)")?;
                }
                Ok(())
            }
            Self::HookInvoked { component, hook } => write!(f, "hook {component}::{hook}"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    /// 递增序号，从 1 开始
    pub seq: u64,
    /// 记录时间
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: WiringEvent,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:04} {}", self.seq, self.event)
    }
}

/// 装配报告快照
#[derive(Debug, Clone, Serialize)]
pub struct WiringReport {
    /// 本次启动的标识
    pub run_id: Uuid,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 按顺序排列的条目
    pub entries: Vec<DiagnosticEntry>,
}

impl WiringReport {
    /// 每个事件一行的可读文本
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// 字段赋值事件
    pub fn field_assignments(&self) -> impl Iterator<Item = &DiagnosticEntry> + '_ {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.event, WiringEvent::FieldAssigned { .. }))
    }

    /// 钩子调用事件
    pub fn hook_invocations(&self) -> impl Iterator<Item = &DiagnosticEntry> + '_ {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.event, WiringEvent::HookInvoked { .. }))
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 装配诊断日志
#[derive(Debug)]
pub struct WiringDiagnostics {
    run_id: Mutex<Uuid>,
    started_at: Mutex<DateTime<Utc>>,
    counter: AtomicU64,
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl Default for WiringDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl WiringDiagnostics {
    /// 开始新的诊断日志
    pub fn new() -> Self {
        Self {
            run_id: Mutex::new(Uuid::new_v4()),
            started_at: Mutex::new(Utc::now()),
            counter: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// 追加事件，返回其序号
    pub fn record(&self, event: WiringEvent) -> u64 {
        let mut entries = self.entries.lock();
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        entries.push(DiagnosticEntry {
            seq,
            at: Utc::now(),
            event,
        });
        seq
    }

    /// 当前条目快照
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries.lock().clone()
    }

    /// 生成报告快照，不清空日志
    pub fn report(&self) -> WiringReport {
        WiringReport {
            run_id: *self.run_id.lock(),
            started_at: *self.started_at.lock(),
            entries: self.entries(),
        }
    }

    /// 取出报告并丢弃已记录的条目
    ///
    /// 序号计数不会重置，同一次运行中后续的动态解析继续编号。
    pub fn take(&self) -> WiringReport {
        WiringReport {
            run_id: *self.run_id.lock(),
            started_at: *self.started_at.lock(),
            entries: std::mem::take(&mut *self.entries.lock()),
        }
    }

    /// 把报告逐行输出到日志并丢弃已记录的条目
    pub fn flush(&self) -> WiringReport {
        let report = self.take();

        info!(
            target: "wiring",
            run_id = %report.run_id,
            "装配报告: {} 条记录",
            report.len()
        );
        for entry in &report.entries {
            info!(target: "wiring", "{}", entry);
        }
        report
    }

    /// 开始新一轮记录：新的运行标识，序号从头开始
    pub fn restart(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.counter.store(0, Ordering::SeqCst);
        *self.run_id.lock() = Uuid::new_v4();
        *self.started_at.lock() = Utc::now();
    }
}
