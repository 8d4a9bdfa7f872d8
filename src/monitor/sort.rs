//! Category-aware sorting of process records.
//!
//! Sorts are stable in both directions: records with equal keys keep the
//! collector's order. Numeric keys compare numerically; `command` compares
//! case-insensitively. A missing pid sorts as 0.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::ToolError;

use super::records::{Category, ProcessRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Auto,
    Pid,
    Command,
    CpuPercent,
    MemoryPercent,
    ResidentMemoryKb,
    NetworkConnections,
}

impl SortKey {
    pub fn name(&self) -> &'static str {
        match self {
            SortKey::Auto => "auto",
            SortKey::Pid => "pid",
            SortKey::Command => "command",
            SortKey::CpuPercent => "cpu_percent",
            SortKey::MemoryPercent => "memory_percent",
            SortKey::ResidentMemoryKb => "resident_memory_kb",
            SortKey::NetworkConnections => "network_connections",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(SortKey::Auto),
            "pid" => Some(SortKey::Pid),
            "command" => Some(SortKey::Command),
            "cpu_percent" => Some(SortKey::CpuPercent),
            "memory_percent" => Some(SortKey::MemoryPercent),
            "resident_memory_kb" => Some(SortKey::ResidentMemoryKb),
            "network_connections" => Some(SortKey::NetworkConnections),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// The sort keys a category accepts, in the order they are advertised.
pub fn allowed_keys(category: Category) -> &'static [SortKey] {
    match category {
        Category::Cpu => &[SortKey::Auto, SortKey::CpuPercent, SortKey::Pid, SortKey::Command],
        Category::Memory => &[
            SortKey::Auto,
            SortKey::MemoryPercent,
            SortKey::ResidentMemoryKb,
            SortKey::Pid,
            SortKey::Command,
        ],
        Category::Network => &[
            SortKey::Auto,
            SortKey::NetworkConnections,
            SortKey::Pid,
            SortKey::Command,
        ],
    }
}

/// The field `auto` resolves to for a category.
pub fn primary_metric(category: Category) -> SortKey {
    match category {
        Category::Cpu => SortKey::CpuPercent,
        Category::Memory => SortKey::MemoryPercent,
        Category::Network => SortKey::NetworkConnections,
    }
}

/// Validate the requested sort field and direction for a category.
///
/// `sort_by` is matched case-insensitively against the category's allowed
/// set; `sort_order` must be exactly "asc" or "desc".
pub fn parse_sort_spec(
    sort_by: &str,
    sort_order: &str,
    category: Category,
) -> Result<(SortKey, SortOrder), ToolError> {
    let order = match sort_order {
        "asc" => SortOrder::Asc,
        "desc" => SortOrder::Desc,
        other => {
            return Err(ToolError::InvalidParameter(format!(
                "invalid sort_order '{other}': must be \"asc\" or \"desc\""
            )))
        }
    };

    let allowed = allowed_keys(category);
    let key = SortKey::parse(&sort_by.to_lowercase())
        .filter(|k| allowed.contains(k))
        .ok_or_else(|| {
            let options: Vec<&str> = allowed.iter().map(|k| k.name()).collect();
            ToolError::InvalidParameter(format!(
                "invalid sort_by '{sort_by}' for {} processes: valid options are {}",
                category.label(),
                options.join(", ")
            ))
        })?;

    Ok((key, order))
}

/// Stable-sort records, resolving `auto` to the category's primary metric.
/// Returns the ordered records and the resolved key.
pub fn sort_records(
    mut records: Vec<ProcessRecord>,
    key: SortKey,
    order: SortOrder,
    category: Category,
) -> (Vec<ProcessRecord>, SortKey) {
    let resolved = if key == SortKey::Auto {
        primary_metric(category)
    } else {
        key
    };

    records.sort_by(|a, b| {
        let ordering = compare(a, b, resolved);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    (records, resolved)
}

fn compare(a: &ProcessRecord, b: &ProcessRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Pid => a.pid().unwrap_or(0).cmp(&b.pid().unwrap_or(0)),
        SortKey::Command => a
            .command()
            .to_lowercase()
            .cmp(&b.command().to_lowercase()),
        SortKey::CpuPercent => a.cpu_percent().total_cmp(&b.cpu_percent()),
        SortKey::MemoryPercent => a.memory_percent().total_cmp(&b.memory_percent()),
        SortKey::ResidentMemoryKb => a.resident_memory_kb().cmp(&b.resident_memory_kb()),
        SortKey::NetworkConnections => a.network_connections().cmp(&b.network_connections()),
        // `auto` is resolved before comparison ever runs
        SortKey::Auto => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(pid: u32, cpu_percent: f64, command: &str) -> ProcessRecord {
        ProcessRecord::Cpu {
            pid,
            cpu_percent,
            command: command.into(),
        }
    }

    fn net(pid: Option<u32>, command: &str, connections: u64) -> ProcessRecord {
        ProcessRecord::Network {
            pid,
            command: command.into(),
            network_connections: connections,
        }
    }

    #[test]
    fn test_auto_resolves_to_primary_metric() {
        let records = vec![cpu(1, 10.0, "a"), cpu(2, 90.0, "b")];

        let (auto_sorted, resolved) =
            sort_records(records.clone(), SortKey::Auto, SortOrder::Desc, Category::Cpu);
        assert_eq!(resolved, SortKey::CpuPercent);

        let (explicit, _) =
            sort_records(records, SortKey::CpuPercent, SortOrder::Desc, Category::Cpu);
        assert_eq!(auto_sorted, explicit);
    }

    #[test]
    fn test_desc_is_stable_on_ties() {
        // pid 1 and pid 3 tie at 10.0; pid 1 came first from the collector
        let records = vec![cpu(1, 10.0, "a"), cpu(2, 90.0, "b"), cpu(3, 10.0, "c")];
        let (sorted, _) =
            sort_records(records, SortKey::CpuPercent, SortOrder::Desc, Category::Cpu);

        let pids: Vec<_> = sorted.iter().filter_map(|r| r.pid()).collect();
        assert_eq!(pids, vec![2, 1, 3]);
    }

    #[test]
    fn test_asc_desc_antisymmetry_on_distinct_keys() {
        for key in [SortKey::CpuPercent, SortKey::Pid, SortKey::Command] {
            let records = vec![
                cpu(3, 5.0, "cc"),
                cpu(1, 40.0, "aa"),
                cpu(2, 12.5, "bb"),
                cpu(4, 0.1, "dd"),
            ];
            let (asc, _) = sort_records(records.clone(), key, SortOrder::Asc, Category::Cpu);
            let (desc, _) = sort_records(records, key, SortOrder::Desc, Category::Cpu);

            let mut reversed = asc.clone();
            reversed.reverse();
            assert_eq!(desc, reversed, "key {:?}", key);
        }
    }

    #[test]
    fn test_command_sort_is_case_insensitive() {
        let records = vec![cpu(1, 0.0, "Zsh"), cpu(2, 0.0, "apache"), cpu(3, 0.0, "Bash")];
        let (sorted, _) = sort_records(records, SortKey::Command, SortOrder::Asc, Category::Cpu);

        let commands: Vec<_> = sorted.iter().map(|r| r.command().to_string()).collect();
        assert_eq!(commands, vec!["apache", "Bash", "Zsh"]);
    }

    #[test]
    fn test_missing_pid_sorts_first_ascending() {
        let records = vec![net(Some(9), "a", 1), net(None, "b", 2), net(Some(2), "c", 3)];
        let (sorted, _) = sort_records(records, SortKey::Pid, SortOrder::Asc, Category::Network);

        let commands: Vec<_> = sorted.iter().map(|r| r.command().to_string()).collect();
        assert_eq!(commands, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_invalid_sort_by_names_allowed_set() {
        let err = parse_sort_spec("memory_percent", "desc", Category::Cpu).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
        let msg = err.to_string();
        assert!(msg.contains("cpu processes"));
        assert!(msg.contains("auto, cpu_percent, pid, command"));
    }

    #[test]
    fn test_invalid_sort_order_rejected() {
        let err = parse_sort_spec("auto", "descending", Category::Memory).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");

        // not silently case-folded either
        assert!(parse_sort_spec("auto", "DESC", Category::Memory).is_err());
    }

    #[test]
    fn test_sort_by_is_case_insensitive() {
        let (key, order) = parse_sort_spec("Resident_Memory_KB", "asc", Category::Memory).unwrap();
        assert_eq!(key, SortKey::ResidentMemoryKb);
        assert_eq!(order, SortOrder::Asc);
    }

    #[test]
    fn test_every_category_accepts_pid_command_and_auto() {
        for category in Category::ALL {
            for sort_by in ["auto", "pid", "command"] {
                assert!(parse_sort_spec(sort_by, "asc", category).is_ok());
            }
            assert!(parse_sort_spec(primary_metric(category).name(), "desc", category).is_ok());
        }
    }
}
