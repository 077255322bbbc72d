//! Resource limits carried by a sandbox.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Resource limits for a sandbox. Only `time` and `memory_mb` are enforced
/// by this crate; `cpu_count` and `disk_space_mb` are advisory metadata
/// carried forward to the container engine and to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(deserialize_with = "deserialize_duration", default = "default_time")]
    pub time: Duration,
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u64,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default)]
    pub disk_space_mb: Option<u64>,
}

fn default_time() -> Duration {
    Duration::from_secs(1)
}

fn default_memory_mb() -> u64 {
    64
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            time: default_time(),
            memory_mb: default_memory_mb(),
            cpu_count: None,
            disk_space_mb: None,
        }
    }
}

impl Limits {
    pub fn memory_bytes(&self) -> u64 {
        self.memory_mb * (1 << 20)
    }
}

/// Accepts a plain integer (seconds), an ISO-8601-ish duration string such
/// as `"PT3S"`/`"PT1M30S"` (spec's own example format), or the teacher's
/// hand-rolled suffix form (`"30s"`, `"5m"`, `"1h"`) — see
/// `oj-engine::monitor::parse_duration`, which this mirrors, extended to
/// also accept the `PT...` form.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(s) => parse_duration(&s).map_err(de::Error::custom),
    }
}

/// Parses a duration string like `"PT3S"`, `"PT1M30S"`, `"30s"`, `"5m"`,
/// or `"1h"` into a [`Duration`].
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    if let Some(rest) = s.strip_prefix("PT").or_else(|| s.strip_prefix("pt")) {
        return parse_iso8601_time(rest);
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

/// Parses the portion of an ISO-8601 duration after `PT` — hours, minutes,
/// seconds components such as `1M30S`, `3S`, `2H`.
fn parse_iso8601_time(rest: &str) -> Result<Duration, String> {
    let mut total_secs: u64 = 0;
    let mut num = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            num.push(c);
            continue;
        }
        let n: u64 = num
            .parse()
            .map_err(|_| format!("invalid ISO-8601 duration: PT{}", rest))?;
        num.clear();
        match c.to_ascii_uppercase() {
            'H' => total_secs += n * 3600,
            'M' => total_secs += n * 60,
            'S' => total_secs += n,
            other => return Err(format!("unknown ISO-8601 duration unit: {}", other)),
        }
    }
    if !num.is_empty() {
        return Err(format!("trailing digits with no unit: PT{}", rest));
    }
    Ok(Duration::from_secs(total_secs))
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
