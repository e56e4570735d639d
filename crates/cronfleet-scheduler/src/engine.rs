//! Cron trigger engine.
//!
//! A trigger engine registers named callbacks that fire according to cron
//! expressions. Triggers are addressed by `(group, name)` so that several
//! schedulers can share one engine without colliding.
//!
//! [`CronTriggerEngine`] runs every trigger as a tokio task that sleeps
//! until the next cron time point. Each firing is spawned as its own task:
//! cancelling a trigger stops future firings but never interrupts a firing
//! that has already started.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;

/// Work run on every firing of a trigger.
pub type FireTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Late firings beyond this threshold are skipped instead of caught up.
const MISFIRE_THRESHOLD_SECS: i64 = 60;

/// Address of a trigger within an engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    pub group: String,
    pub name: String,
}

impl TriggerKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// A registered trigger.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    pub key: TriggerKey,
    pub expression: String,
    pub next_fire_time: DateTime<Utc>,
}

/// Cron-expression-driven callback scheduling.
pub trait TriggerEngine: Send + Sync {
    /// Register `task` to run whenever `expression` fires.
    fn schedule(
        &self,
        key: TriggerKey,
        expression: &str,
        task: FireTask,
    ) -> Result<TriggerHandle, EngineError>;

    /// Remove a trigger. Returns `false` if no such trigger was registered.
    fn unschedule(&self, key: &TriggerKey) -> bool;

    /// Names of every trigger registered in `group`, sorted.
    fn job_names(&self, group: &str) -> Vec<String>;

    /// Cancel every trigger in `group` and refuse new ones there.
    /// Other groups are untouched.
    fn shutdown_group(&self, group: &str);

    /// Cancel every trigger and refuse new ones.
    fn shutdown(&self);
}

/// Bring an expression into the 6/7-field form understood by the `cron` crate.
///
/// Standard 5-field expressions get a leading seconds field of `0`, and the
/// `?` placeholder used by some cron dialects becomes `*`. Numeric
/// day-of-week values in 5-field expressions count from `0` (or `7`) for
/// Sunday; they are rewritten to the `cron` crate's `1` = Sunday numbering.
pub fn normalize_expression(expression: &str) -> String {
    let mut fields: Vec<String> = expression
        .split_whitespace()
        .map(|field| if field == "?" { "*".to_string() } else { field.to_string() })
        .collect();

    if fields.len() == 5 {
        fields[4] = remap_day_of_week(&fields[4]);
        format!("0 {}", fields.join(" "))
    } else {
        fields.join(" ")
    }
}

/// Rewrite a standard day-of-week field (0-7, Sunday = 0 or 7) into
/// `cron` crate ordinals (1-7, Sunday = 1). Names and wildcards are kept.
fn remap_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|item| remap_day_of_week_item(item).unwrap_or_else(|| item.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

fn remap_day_of_week_item(item: &str) -> Option<String> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step.parse::<u32>().ok().filter(|s| *s > 0)?)),
        None => (item, None),
    };
    if range == "*" {
        return None;
    }

    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start.parse::<u32>().ok()?, end.parse::<u32>().ok()?),
        None => {
            let start = range.parse::<u32>().ok()?;
            // `n/step` runs to the end of the week.
            (start, if step.is_some() { 6 } else { start })
        }
    };
    if start > 7 || end > 7 || start > end {
        return None;
    }

    let mut days: Vec<u32> = (start..=end)
        .step_by(step.unwrap_or(1) as usize)
        .map(|day| day % 7 + 1)
        .collect();
    days.sort_unstable();
    days.dedup();

    Some(collapse_days(&days))
}

/// Render sorted ordinals, folding contiguous runs into ranges.
fn collapse_days(days: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut index = 0;
    while index < days.len() {
        let start = days[index];
        let mut end = start;
        while index + 1 < days.len() && days[index + 1] == end + 1 {
            index += 1;
            end = days[index];
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{}-{}", start, end)
        });
        index += 1;
    }
    parts.join(",")
}

/// Parse a cron expression, normalizing it first.
pub fn parse_expression(expression: &str) -> Result<Schedule, EngineError> {
    Schedule::from_str(&normalize_expression(expression)).map_err(|e| {
        EngineError::InvalidExpression {
            expression: expression.to_string(),
            reason: e.to_string(),
        }
    })
}

struct ActiveTrigger {
    id: Uuid,
    cancel: CancellationToken,
}

type TriggerTable = Arc<Mutex<HashMap<TriggerKey, ActiveTrigger>>>;

/// Trigger engine backed by the `cron` crate and tokio timers.
pub struct CronTriggerEngine {
    triggers: TriggerTable,
    closed_groups: Mutex<HashSet<String>>,
    root: CancellationToken,
    fire_count: Arc<AtomicU64>,
}

impl CronTriggerEngine {
    pub fn new() -> Self {
        Self {
            triggers: Arc::new(Mutex::new(HashMap::new())),
            closed_groups: Mutex::new(HashSet::new()),
            root: CancellationToken::new(),
            fire_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total number of firings across all triggers.
    pub fn fire_count(&self) -> u64 {
        self.fire_count.load(Ordering::Relaxed)
    }

    /// Number of registered triggers.
    pub fn len(&self) -> usize {
        self.triggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shutdown(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Whether `group` was shut down on its own.
    pub fn is_group_shutdown(&self, group: &str) -> bool {
        self.closed_groups.lock().contains(group)
    }
}

impl Default for CronTriggerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CronTriggerEngine {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl TriggerEngine for CronTriggerEngine {
    fn schedule(
        &self,
        key: TriggerKey,
        expression: &str,
        task: FireTask,
    ) -> Result<TriggerHandle, EngineError> {
        if self.root.is_cancelled() || self.is_group_shutdown(&key.group) {
            return Err(EngineError::Shutdown);
        }

        let schedule = parse_expression(expression)?;
        let next_fire_time = schedule
            .upcoming(Utc)
            .next()
            .ok_or_else(|| EngineError::NeverFires(expression.to_string()))?;

        let id = Uuid::new_v4();
        let cancel = self.root.child_token();
        {
            let mut triggers = self.triggers.lock();
            if triggers.contains_key(&key) {
                return Err(EngineError::AlreadyScheduled(key.to_string()));
            }
            triggers.insert(
                key.clone(),
                ActiveTrigger {
                    id,
                    cancel: cancel.clone(),
                },
            );
        }

        tokio::spawn(run_trigger(
            key.clone(),
            id,
            schedule,
            task,
            cancel,
            self.triggers.clone(),
            self.fire_count.clone(),
        ));

        debug!("Trigger {} registered, next fire at {}", key, next_fire_time.to_rfc3339());

        Ok(TriggerHandle {
            key,
            expression: expression.to_string(),
            next_fire_time,
        })
    }

    fn unschedule(&self, key: &TriggerKey) -> bool {
        match self.triggers.lock().remove(key) {
            Some(trigger) => {
                trigger.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn job_names(&self, group: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .triggers
            .lock()
            .keys()
            .filter(|key| key.group == group)
            .map(|key| key.name.clone())
            .collect();
        names.sort();
        names
    }

    fn shutdown_group(&self, group: &str) {
        self.closed_groups.lock().insert(group.to_string());
        let cancelled = {
            let mut triggers = self.triggers.lock();
            let keys: Vec<TriggerKey> = triggers
                .keys()
                .filter(|key| key.group == group)
                .cloned()
                .collect();
            for key in &keys {
                if let Some(trigger) = triggers.remove(key) {
                    trigger.cancel.cancel();
                }
            }
            keys.len()
        };
        info!("Trigger group {} shut down, {} triggers cancelled", group, cancelled);
    }

    fn shutdown(&self) {
        self.root.cancel();
        let cancelled = {
            let mut triggers = self.triggers.lock();
            let count = triggers.len();
            triggers.clear();
            count
        };
        info!("Trigger engine shut down, {} triggers cancelled", cancelled);
    }
}

/// Timing loop of a single trigger.
async fn run_trigger(
    key: TriggerKey,
    id: Uuid,
    schedule: Schedule,
    task: FireTask,
    cancel: CancellationToken,
    triggers: TriggerTable,
    fire_count: Arc<AtomicU64>,
) {
    let mut cursor = Utc::now();

    loop {
        let Some(next) = schedule.after(&cursor).next() else {
            debug!("Trigger {} has no upcoming fire time", key);
            break;
        };

        let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Trigger {} cancelled", key);
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        fire_count.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(task());

        let now = Utc::now();
        cursor = if (now - next).num_seconds() > MISFIRE_THRESHOLD_SECS {
            warn!("Trigger {} misfired at {}, skipping to now", key, next.to_rfc3339());
            now
        } else {
            next
        };
    }

    // Exhausted schedules drop out of the table unless replaced meanwhile.
    let mut triggers = triggers.lock();
    if triggers.get(&key).is_some_and(|t| t.id == id) {
        triggers.remove(&key);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
