//! sysinfo によるシステム情報

use sl_domain::port::driven::SystemInfoProvider;
use sl_domain::time::rfc3339_millis;
use sysinfo::System;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Default)]
pub struct SysinfoProvider;

impl SysinfoProvider {
    pub fn new() -> Self {
        Self
    }
}

fn user_name() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| UNKNOWN.to_string())
}

fn mib(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

impl SystemInfoProvider for SysinfoProvider {
    fn describe(&self) -> String {
        let result = std::panic::catch_unwind(|| {
            let mut sys = System::new();
            sys.refresh_cpu();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu();
            sys.refresh_memory();

            let cpu = sys
                .cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string());
            let boot_ms = System::boot_time().saturating_mul(1000);

            let mut lines = Vec::new();
            lines.push(format!("Host: {}", self.host_name()));
            lines.push(format!(
                "OS: {}",
                System::long_os_version().unwrap_or_else(|| UNKNOWN.to_string())
            ));
            lines.push(format!(
                "Kernel: {}",
                System::kernel_version().unwrap_or_else(|| UNKNOWN.to_string())
            ));
            lines.push(format!(
                "Arch: {}",
                System::cpu_arch().unwrap_or_else(|| std::env::consts::ARCH.to_string())
            ));
            lines.push(format!("User: {}", user_name()));
            lines.push(format!(
                "CPU: {} ({} logical, {:.1}% busy)",
                cpu,
                sys.cpus().len(),
                sys.global_cpu_info().cpu_usage()
            ));
            lines.push(format!(
                "Memory: {} MiB used / {} MiB total",
                mib(sys.used_memory()),
                mib(sys.total_memory())
            ));
            if boot_ms > 0 {
                lines.push(format!("Boot: {}", rfc3339_millis(boot_ms)));
            }
            lines.join("\n")
        });
        result.unwrap_or_else(|_| format!("Host: {}\n(system details unavailable)", self.host_name()))
    }

    fn host_name(&self) -> String {
        System::host_name()
            .filter(|h| !h.is_empty())
            .or_else(|| std::env::var("COMPUTERNAME").ok())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_starts_with_host() {
        let provider = SysinfoProvider::new();
        let host = provider.host_name();
        let text = provider.describe();
        assert!(!host.is_empty());
        assert!(text.starts_with(&format!("Host: {}", host)));
        assert!(text.contains("User: "));
    }

    #[test]
    fn mib_rounds_down() {
        assert_eq!(mib(3 * 1024 * 1024 + 5), 3);
        assert_eq!(mib(0), 0);
    }
}
