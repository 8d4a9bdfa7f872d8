//! Normalized process records — raw listing text into typed per-category records.
//!
//! Normalization is a pure transform. Malformed or short lines are skipped;
//! an unparseable metric degrades to a zero sentinel. A line whose pid column
//! does not parse is treated as malformed, since the pid is the record's
//! identity rather than a metric.

use serde::Serialize;

use crate::error::ToolError;

/// A metric category with its own field set and primary metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Cpu,
    Memory,
    Network,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cpu, Category::Memory, Category::Network];

    /// Parse a category label, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ToolError> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Category::Cpu),
            "memory" => Ok(Category::Memory),
            "network" => Ok(Category::Network),
            other => Err(ToolError::InvalidParameter(format!(
                "invalid process_type '{other}': must be one of cpu, memory, network"
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Memory => "memory",
            Category::Network => "network",
        }
    }
}

/// One sampled process. Fields vary by category; a metric the source cannot
/// supply is an explicit `None`, never a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessRecord {
    Cpu {
        pid: u32,
        cpu_percent: f64,
        command: String,
    },
    Memory {
        pid: u32,
        memory_percent: f64,
        resident_memory_kb: u64,
        command: String,
    },
    Network {
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
        command: String,
        network_connections: u64,
    },
}

impl ProcessRecord {
    pub fn pid(&self) -> Option<u32> {
        match self {
            ProcessRecord::Cpu { pid, .. } | ProcessRecord::Memory { pid, .. } => Some(*pid),
            ProcessRecord::Network { pid, .. } => *pid,
        }
    }

    pub fn command(&self) -> &str {
        match self {
            ProcessRecord::Cpu { command, .. }
            | ProcessRecord::Memory { command, .. }
            | ProcessRecord::Network { command, .. } => command,
        }
    }

    pub fn cpu_percent(&self) -> f64 {
        match self {
            ProcessRecord::Cpu { cpu_percent, .. } => *cpu_percent,
            _ => 0.0,
        }
    }

    pub fn memory_percent(&self) -> f64 {
        match self {
            ProcessRecord::Memory { memory_percent, .. } => *memory_percent,
            _ => 0.0,
        }
    }

    pub fn resident_memory_kb(&self) -> u64 {
        match self {
            ProcessRecord::Memory {
                resident_memory_kb, ..
            } => *resident_memory_kb,
            _ => 0,
        }
    }

    pub fn network_connections(&self) -> u64 {
        match self {
            ProcessRecord::Network {
                network_connections,
                ..
            } => *network_connections,
            _ => 0,
        }
    }
}

/// Normalize a raw listing for the given category.
pub fn parse_records(category: Category, raw: &str) -> Vec<ProcessRecord> {
    match category {
        Category::Cpu => parse_cpu_records(raw),
        Category::Memory => parse_memory_records(raw),
        Category::Network => parse_network_records(raw),
    }
}

/// Parse `ps -eo pid,%cpu,comm` output, one record per data line.
fn parse_cpu_records(raw: &str) -> Vec<ProcessRecord> {
    let mut records = Vec::new();

    for line in raw.lines().skip(1) {
        let Some([pid, cpu, command]) = split_columns::<3>(line) else {
            continue;
        };
        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };

        records.push(ProcessRecord::Cpu {
            pid,
            cpu_percent: cpu.parse::<f64>().unwrap_or(0.0),
            command: command.to_string(),
        });
    }

    records
}

/// Parse `ps -eo pid,pmem,rss,comm` output.
fn parse_memory_records(raw: &str) -> Vec<ProcessRecord> {
    let mut records = Vec::new();

    for line in raw.lines().skip(1) {
        let Some([pid, pmem, rss, command]) = split_columns::<4>(line) else {
            continue;
        };
        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };

        records.push(ProcessRecord::Memory {
            pid,
            memory_percent: pmem.parse::<f64>().unwrap_or(0.0),
            resident_memory_kb: rss.parse::<u64>().unwrap_or(0),
            command: command.to_string(),
        });
    }

    records
}

/// Aggregate `lsof -i -n -P` rows into one record per command, counting its
/// connections and keeping the first-seen pid. Records come out ordered by
/// connection count, ties in first-seen order.
fn parse_network_records(raw: &str) -> Vec<ProcessRecord> {
    // (command, first pid, connection count), in first-seen order
    let mut tallies: Vec<(String, Option<u32>, u64)> = Vec::new();

    for line in raw.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }

        let command = parts[0];
        match tallies.iter_mut().find(|(name, _, _)| name == command) {
            Some(entry) => entry.2 += 1,
            None => tallies.push((command.to_string(), parts[1].parse::<u32>().ok(), 1)),
        }
    }

    tallies.sort_by(|a, b| b.2.cmp(&a.2));
    tallies
        .into_iter()
        .map(|(command, pid, network_connections)| ProcessRecord::Network {
            pid,
            command,
            network_connections,
        })
        .collect()
}

/// Split a line into exactly N whitespace-separated columns, with the last
/// column absorbing the remainder of the line (commands may contain spaces).
/// Returns `None` for short lines.
fn split_columns<const N: usize>(line: &str) -> Option<[&str; N]> {
    let mut columns = [""; N];
    let mut rest = line.trim();

    for slot in columns.iter_mut().take(N - 1) {
        let idx = rest.find(char::is_whitespace)?;
        *slot = &rest[..idx];
        rest = rest[idx..].trim_start();
    }

    if rest.is_empty() {
        return None;
    }
    columns[N - 1] = rest;
    Some(columns)
}
