//! monitor.system_overview — aggregate snapshot of CPU, memory, and processes
//!
//! OS-level counters come from `sysctl`/`vm_stat`/`top` on macOS and `/proc`
//! on Linux; process aggregates are computed over the same normalized records
//! the listing tools use. The whole snapshot succeeds or the call fails —
//! sections are never partially filled in.

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

use super::records::{self, Category, ProcessRecord};
use super::{collect, decode_input, encode_output};

#[derive(Deserialize)]
struct Input {}

#[derive(Serialize)]
struct Output {
    timestamp: String,
    cpu: CpuOverview,
    memory: MemoryOverview,
    processes: ProcessOverview,
}

#[derive(Debug, Serialize)]
struct CpuOverview {
    usage_percent: f64,
    cores: u32,
    load_average: LoadAverage,
}

#[derive(Debug, Serialize)]
struct LoadAverage {
    #[serde(rename = "1min")]
    one_min: f64,
    #[serde(rename = "5min")]
    five_min: f64,
    #[serde(rename = "15min")]
    fifteen_min: f64,
}

#[derive(Debug, Serialize)]
struct MemoryOverview {
    total_mb: u64,
    used_mb: u64,
    available_mb: u64,
    used_percent: f64,
}

#[derive(Debug, PartialEq, Serialize)]
struct ProcessOverview {
    total_processes: usize,
    total_cpu_percent: f64,
    average_cpu_percent: f64,
    total_memory_percent: f64,
    network_processes: usize,
    total_network_connections: u64,
}

pub fn execute(input: &[u8]) -> Result<Vec<u8>, ToolError> {
    let _input: Input = if input.is_empty() {
        Input {}
    } else {
        decode_input(input)?
    };

    let cpu = if cfg!(target_os = "macos") {
        cpu_overview_macos()?
    } else {
        cpu_overview_linux()?
    };

    let memory = if cfg!(target_os = "macos") {
        memory_overview_macos()?
    } else {
        memory_overview_linux()?
    };

    let output = Output {
        timestamp: chrono::Utc::now().to_rfc3339(),
        cpu,
        memory,
        processes: process_overview()?,
    };

    encode_output(&output)
}

// ===== CPU =====

fn cpu_overview_macos() -> Result<CpuOverview, ToolError> {
    let cores = collect::run_command(&["sysctl", "-n", "hw.ncpu"])?
        .trim()
        .parse::<u32>()
        .unwrap_or(1);

    // sysctl vm.loadavg prints "{ 1.23 2.34 3.45 }"
    let load_raw = collect::run_command(&["sysctl", "-n", "vm.loadavg"])?;
    let load_average = parse_load_average(&load_raw);

    // Two top samples; the second one reflects current usage.
    let top_raw = collect::run_command(&["top", "-l", "2", "-n", "0", "-s", "1"])?;
    let usage_percent = parse_top_cpu_usage(&top_raw);

    Ok(CpuOverview {
        usage_percent,
        cores,
        load_average,
    })
}

fn cpu_overview_linux() -> Result<CpuOverview, ToolError> {
    let cpuinfo = read_proc("/proc/cpuinfo")?;
    let cores = cpuinfo
        .lines()
        .filter(|l| l.starts_with("processor"))
        .count() as u32;

    let load_average = parse_load_average(&read_proc("/proc/loadavg")?);

    // Usage over a short window: two /proc/stat samples 100ms apart.
    let first = parse_proc_stat(&read_proc("/proc/stat")?);
    std::thread::sleep(std::time::Duration::from_millis(100));
    let second = parse_proc_stat(&read_proc("/proc/stat")?);

    let total_delta = second.total.saturating_sub(first.total);
    let idle_delta = second.idle.saturating_sub(first.idle);
    let usage_percent = if total_delta > 0 {
        round2(((total_delta - idle_delta) as f64 / total_delta as f64) * 100.0)
    } else {
        0.0
    };

    Ok(CpuOverview {
        usage_percent,
        cores,
        load_average,
    })
}

/// Parse three load averages out of either `sysctl vm.loadavg` braces or the
/// `/proc/loadavg` line; missing values fall back to 0.
fn parse_load_average(raw: &str) -> LoadAverage {
    let values: Vec<f64> = raw
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split_whitespace()
        .take(3)
        .filter_map(|v| v.parse::<f64>().ok())
        .collect();

    LoadAverage {
        one_min: values.first().copied().unwrap_or(0.0),
        five_min: values.get(1).copied().unwrap_or(0.0),
        fifteen_min: values.get(2).copied().unwrap_or(0.0),
    }
}

/// Pull user+sys from the last "CPU usage: X% user, Y% sys, Z% idle" line.
fn parse_top_cpu_usage(top_output: &str) -> f64 {
    let mut usage = 0.0;
    for line in top_output.lines().filter(|l| l.contains("CPU usage:")) {
        usage = percent_for(line, "user") + percent_for(line, "sys");
    }
    round2(usage)
}

fn percent_for(line: &str, field: &str) -> f64 {
    line.split(',')
        .find(|part| part.contains(field))
        .and_then(|part| {
            part.split_whitespace()
                .find_map(|w| w.trim_end_matches('%').parse::<f64>().ok())
        })
        .unwrap_or(0.0)
}

struct CpuTimes {
    idle: u64,
    total: u64,
}

fn parse_proc_stat(stat: &str) -> CpuTimes {
    // Aggregate line: "cpu  user nice system idle iowait irq softirq ..."
    let values: Vec<u64> = stat
        .lines()
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse::<u64>().ok())
        .collect();

    CpuTimes {
        // idle + iowait
        idle: values.get(3).copied().unwrap_or(0) + values.get(4).copied().unwrap_or(0),
        total: values.iter().sum(),
    }
}

// ===== Memory =====

fn memory_overview_macos() -> Result<MemoryOverview, ToolError> {
    let total_bytes = collect::run_command(&["sysctl", "-n", "hw.memsize"])?
        .trim()
        .parse::<u64>()
        .unwrap_or(0);

    // 16384 on Apple Silicon, 4096 on Intel
    let page_size = collect::run_command(&["sysctl", "-n", "hw.pagesize"])
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(4096);

    let vm_stat = collect::run_command(&["vm_stat"])?;

    let used_pages = page_count(&vm_stat, "Pages active")
        + page_count(&vm_stat, "Pages wired down")
        + page_count(&vm_stat, "Pages occupied by compressor");
    let available_pages = page_count(&vm_stat, "Pages free")
        + page_count(&vm_stat, "Pages inactive")
        + page_count(&vm_stat, "Pages purgeable")
        + page_count(&vm_stat, "Pages speculative");

    Ok(build_memory_overview(
        total_bytes / (1024 * 1024),
        (used_pages * page_size) / (1024 * 1024),
        (available_pages * page_size) / (1024 * 1024),
    ))
}

fn memory_overview_linux() -> Result<MemoryOverview, ToolError> {
    let meminfo = read_proc("/proc/meminfo")?;

    let total_kb = meminfo_kb(&meminfo, "MemTotal");
    let mut available_kb = meminfo_kb(&meminfo, "MemAvailable");
    if available_kb == 0 {
        // older kernels: estimate from free + buffers + cached
        available_kb = meminfo_kb(&meminfo, "MemFree")
            + meminfo_kb(&meminfo, "Buffers")
            + meminfo_kb(&meminfo, "Cached");
    }

    let total_mb = total_kb / 1024;
    let available_mb = available_kb / 1024;
    Ok(build_memory_overview(
        total_mb,
        total_mb.saturating_sub(available_mb),
        available_mb,
    ))
}

fn build_memory_overview(total_mb: u64, used_mb: u64, available_mb: u64) -> MemoryOverview {
    let used_percent = if total_mb > 0 {
        round2((used_mb as f64 / total_mb as f64) * 100.0)
    } else {
        0.0
    };

    MemoryOverview {
        total_mb,
        used_mb,
        available_mb,
        used_percent,
    }
}

/// Extract one counter from `vm_stat` output, e.g. "Pages free:   12345."
fn page_count(vm_stat: &str, key: &str) -> u64 {
    vm_stat
        .lines()
        .find_map(|line| {
            let rest = line.trim().strip_prefix(key)?;
            rest.trim_start_matches(':')
                .trim()
                .trim_end_matches('.')
                .parse::<u64>()
                .ok()
        })
        .unwrap_or(0)
}

/// Extract one counter from `/proc/meminfo`, e.g. "MemTotal:  16384 kB"
fn meminfo_kb(meminfo: &str, key: &str) -> u64 {
    meminfo
        .lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

fn read_proc(path: &str) -> Result<String, ToolError> {
    std::fs::read_to_string(path).map_err(|e| ToolError::CommandFailure {
        command: path.to_string(),
        detail: e.to_string(),
    })
}

// ===== Process aggregates =====

fn process_overview() -> Result<ProcessOverview, ToolError> {
    let cpu = normalized(Category::Cpu)?;
    let memory = normalized(Category::Memory)?;
    let network = normalized(Category::Network)?;
    Ok(aggregate(&cpu, &memory, &network))
}

fn normalized(category: Category) -> Result<Vec<ProcessRecord>, ToolError> {
    let raw = collect::collect_category(category)?;
    Ok(records::parse_records(category, &raw))
}

fn aggregate(
    cpu: &[ProcessRecord],
    memory: &[ProcessRecord],
    network: &[ProcessRecord],
) -> ProcessOverview {
    let total_cpu_percent: f64 = cpu.iter().map(|r| r.cpu_percent()).sum();
    let average_cpu_percent = if cpu.is_empty() {
        0.0
    } else {
        total_cpu_percent / cpu.len() as f64
    };
    let total_memory_percent: f64 = memory.iter().map(|r| r.memory_percent()).sum();

    ProcessOverview {
        total_processes: cpu.len(),
        total_cpu_percent: round2(total_cpu_percent),
        average_cpu_percent: round2(average_cpu_percent),
        total_memory_percent: round2(total_memory_percent),
        network_processes: network.len(),
        total_network_connections: network.iter().map(|r| r.network_connections()).sum(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load_average_sysctl_braces() {
        let load = parse_load_average("{ 1.50 2.25 3.00 }");
        assert_eq!(load.one_min, 1.50);
        assert_eq!(load.five_min, 2.25);
        assert_eq!(load.fifteen_min, 3.00);
    }

    #[test]
    fn test_parse_load_average_proc_loadavg() {
        let load = parse_load_average("0.52 0.58 0.59 1/234 5678\n");
        assert_eq!(load.one_min, 0.52);
        assert_eq!(load.fifteen_min, 0.59);
    }

    #[test]
    fn test_parse_load_average_garbage_defaults_to_zero() {
        let load = parse_load_average("not numbers at all");
        assert_eq!(load.one_min, 0.0);
        assert_eq!(load.five_min, 0.0);
    }

    #[test]
    fn test_parse_top_cpu_usage_takes_last_sample() {
        let top = "\
CPU usage: 50.0% user, 25.0% sys, 25.0% idle
Processes: 400 total
CPU usage: 12.34% user, 5.66% sys, 82.0% idle
";
        assert_eq!(parse_top_cpu_usage(top), 18.0);
    }

    #[test]
    fn test_parse_top_cpu_usage_without_usage_line() {
        assert_eq!(parse_top_cpu_usage("Processes: 400 total\n"), 0.0);
    }

    #[test]
    fn test_page_count() {
        let vm_stat = "\
Mach Virtual Memory Statistics: (page size of 16384 bytes)
Pages free:                              111.
Pages active:                          22222.
Pages inactive:                         3333.
Pages wired down:                       4444.
";
        assert_eq!(page_count(vm_stat, "Pages free"), 111);
        assert_eq!(page_count(vm_stat, "Pages active"), 22222);
        assert_eq!(page_count(vm_stat, "Pages wired down"), 4444);
        assert_eq!(page_count(vm_stat, "Pages occupied by compressor"), 0);
    }

    #[test]
    fn test_meminfo_kb() {
        let meminfo = "\
MemTotal:       16322156 kB
MemFree:         8123456 kB
MemAvailable:   12345678 kB
Buffers:          204800 kB
Cached:          1048576 kB
";
        assert_eq!(meminfo_kb(meminfo, "MemTotal"), 16322156);
        assert_eq!(meminfo_kb(meminfo, "MemAvailable"), 12345678);
        assert_eq!(meminfo_kb(meminfo, "HugePages_Total"), 0);
    }

    #[test]
    fn test_parse_proc_stat() {
        let stat = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 ...\n";
        let times = parse_proc_stat(stat);
        assert_eq!(times.total, 1000);
        assert_eq!(times.idle, 850);
    }

    #[test]
    fn test_build_memory_overview_percent() {
        let mem = build_memory_overview(16000, 4000, 12000);
        assert_eq!(mem.used_percent, 25.0);

        let empty = build_memory_overview(0, 0, 0);
        assert_eq!(empty.used_percent, 0.0);
    }

    #[test]
    fn test_aggregate_process_stats() {
        let cpu = vec![
            ProcessRecord::Cpu {
                pid: 1,
                cpu_percent: 10.0,
                command: "a".into(),
            },
            ProcessRecord::Cpu {
                pid: 2,
                cpu_percent: 30.0,
                command: "b".into(),
            },
        ];
        let memory = vec![ProcessRecord::Memory {
            pid: 1,
            memory_percent: 12.5,
            resident_memory_kb: 1024,
            command: "a".into(),
        }];
        let network = vec![
            ProcessRecord::Network {
                pid: Some(1),
                command: "a".into(),
                network_connections: 4,
            },
            ProcessRecord::Network {
                pid: None,
                command: "c".into(),
                network_connections: 6,
            },
        ];

        let stats = aggregate(&cpu, &memory, &network);
        assert_eq!(
            stats,
            ProcessOverview {
                total_processes: 2,
                total_cpu_percent: 40.0,
                average_cpu_percent: 20.0,
                total_memory_percent: 12.5,
                network_processes: 2,
                total_network_connections: 10,
            }
        );
    }

    #[test]
    fn test_aggregate_empty_snapshot() {
        let stats = aggregate(&[], &[], &[]);
        assert_eq!(stats.total_processes, 0);
        assert_eq!(stats.average_cpu_percent, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(99.999), 100.0);
    }
}
