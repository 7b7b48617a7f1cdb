//! 请求级 Server-Timing 计时
//!
//! 每个请求独占一张计时表，由计时中间件创建并在响应前渲染为
//! `Server-Timing` 响应头。计时只用于观测，任何失败都被静默吸收。

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// 隐式总耗时计时器名称
pub const TOTAL: &str = "total";

/// 单个计时器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingMetric {
    /// 开始时间（毫秒）
    pub start_time: i64,
    /// 结束时间（毫秒），0 表示未结束
    pub end_time: i64,
    pub description: Option<String>,
}

impl TimingMetric {
    fn is_closed(&self) -> bool {
        self.end_time > 0
    }
}

#[derive(Debug, Default)]
struct TimerMap {
    begin_ms: i64,
    /// 按首次创建顺序保存，名称唯一
    timers: Vec<(String, TimingMetric)>,
}

impl TimerMap {
    fn get_mut(&mut self, name: &str) -> Option<&mut TimingMetric> {
        self.timers
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, metric)| metric)
    }

    fn upsert(&mut self, name: &str, metric: TimingMetric) {
        match self.get_mut(name) {
            Some(existing) => *existing = metric,
            None => self.timers.push((name.to_string(), metric)),
        }
    }
}

/// 请求级计时表句柄
///
/// 克隆只复制句柄，同一请求内共享同一张表
#[derive(Debug, Clone, Default)]
pub struct ServerTiming {
    inner: Arc<Mutex<TimerMap>>,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl ServerTiming {
    /// 创建空计时表并记录请求开始时间
    pub fn begin() -> Self {
        Self::begin_at(now_ms())
    }

    fn begin_at(begin_ms: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimerMap {
                begin_ms,
                timers: Vec::new(),
            })),
        }
    }

    /// 开始（或重新开始）一个计时器
    pub fn start(&self, name: &str, description: Option<&str>) {
        self.start_at(name, description, now_ms());
    }

    fn start_at(&self, name: &str, description: Option<&str>, at_ms: i64) {
        let description = description
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        self.inner.lock().upsert(
            name,
            TimingMetric {
                start_time: at_ms,
                end_time: 0,
                description,
            },
        );
    }

    /// 结束计时器；不存在或已结束时忽略
    pub fn stop(&self, name: &str) {
        self.stop_at(name, now_ms());
    }

    fn stop_at(&self, name: &str, at_ms: i64) {
        let mut map = self.inner.lock();
        if let Some(metric) = map.get_mut(name) {
            if !metric.is_closed() {
                metric.end_time = at_ms.max(metric.start_time);
            }
        }
    }

    /// 补齐 total 并渲染响应头；没有已结束的计时器时返回 None
    pub fn finalize(&self) -> Option<String> {
        self.finalize_at(now_ms())
    }

    fn finalize_at(&self, at_ms: i64) -> Option<String> {
        let mut map = self.inner.lock();

        if !map.timers.is_empty() {
            let begin_ms = map.begin_ms;
            let pending_total = match map.get_mut(TOTAL) {
                Some(total) if total.is_closed() => None,
                Some(total) => Some(total.description.clone()),
                None => Some(None),
            };
            if let Some(description) = pending_total {
                map.upsert(
                    TOTAL,
                    TimingMetric {
                        start_time: begin_ms,
                        end_time: at_ms.max(begin_ms),
                        description,
                    },
                );
            }
        }

        let closed = closed_timers(&map.timers);
        if closed.is_empty() {
            None
        } else {
            Some(format_server_timing(&closed))
        }
    }
}

/// 只保留已结束的计时器，total 排在最后
fn closed_timers(timers: &[(String, TimingMetric)]) -> Vec<(&str, &TimingMetric)> {
    let mut closed: Vec<(&str, &TimingMetric)> = timers
        .iter()
        .filter(|(name, metric)| name != TOTAL && metric.is_closed())
        .map(|(name, metric)| (name.as_str(), metric))
        .collect();
    if let Some((name, total)) = timers
        .iter()
        .find(|(name, metric)| name == TOTAL && metric.is_closed())
    {
        closed.push((name.as_str(), total));
    }
    closed
}

/// 将计时器名称转换为合法的 token
pub fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '"')
        .map(|c| match c {
            ' ' | ';' | ',' | '=' => '-',
            other => other,
        })
        .collect()
}

fn escape_description(description: &str) -> String {
    description.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 渲染 `Server-Timing` 头的值
pub fn format_server_timing(timers: &[(&str, &TimingMetric)]) -> String {
    timers
        .iter()
        .filter(|(_, metric)| metric.is_closed())
        .map(|(name, metric)| {
            let mut entry = format!(
                "{};dur={}",
                sanitize_metric_name(name),
                metric.end_time - metric.start_time
            );
            match metric.description.as_deref().filter(|d| !d.is_empty()) {
                Some(desc) => {
                    entry.push_str(&format!(";desc=\"{}\"", escape_description(desc)));
                }
                None if *name == TOTAL => entry.push_str(";desc=\"Total\""),
                None => {}
            }
            entry
        })
        .collect::<Vec<_>>()
        .join(", ")
}
