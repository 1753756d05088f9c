//! Hardware sensor sampling for the stats panel.
//!
//! [`SysinfoMonitor`] reads CPU load, memory and component temperatures
//! through `sysinfo`. Sensor reads are comparatively slow, so a sample is
//! reused until the refresh interval has elapsed. GPU load has no portable
//! source and is always `None`.

use std::time::{Duration, Instant};

use sysinfo::{Components, System};
use tracing::debug;

/// RAM total reported when the platform does not expose one.
pub const FALLBACK_RAM_TOTAL_GB: f32 = 32.0;

const BYTES_PER_GIB: f32 = 1024.0 * 1024.0 * 1024.0;

/// One reading of every value the hardware panel draws.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareStats {
    pub cpu_temp: Option<f32>,
    pub cpu_load: Option<f32>,
    pub gpu_temp: Option<f32>,
    pub gpu_load: Option<f32>,
    pub ram_used_gb: Option<f32>,
    pub ram_total_gb: f32,
}

impl Default for HardwareStats {
    fn default() -> Self {
        Self {
            cpu_temp: None,
            cpu_load: None,
            gpu_temp: None,
            gpu_load: None,
            ram_used_gb: None,
            ram_total_gb: FALLBACK_RAM_TOTAL_GB,
        }
    }
}

/// Source of [`HardwareStats`] for the render loop.
pub trait HardwareMonitor: Send {
    fn stats(&mut self) -> HardwareStats;
}

// ── SysinfoMonitor ───────────────────────────────────────────────

pub struct SysinfoMonitor {
    system: System,
    components: Components,
    refresh: Duration,
    cached: Option<(Instant, HardwareStats)>,
}

impl SysinfoMonitor {
    pub fn new(refresh: Duration) -> Self {
        Self {
            system: System::new(),
            components: Components::new_with_refreshed_list(),
            refresh,
            cached: None,
        }
    }

    pub fn stats_at(&mut self, now: Instant) -> HardwareStats {
        if let Some((at, stats)) = &self.cached {
            if now.saturating_duration_since(*at) < self.refresh {
                return stats.clone();
            }
        }
        let stats = self.sample();
        self.cached = Some((now, stats.clone()));
        stats
    }

    fn sample(&mut self) -> HardwareStats {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.components.refresh(false);

        let temps: Vec<(String, f32)> = self
            .components
            .list()
            .iter()
            .filter_map(|c| c.temperature().map(|t| (c.label().to_lowercase(), t)))
            .filter(|(_, t)| t.is_finite() && *t > 0.0)
            .collect();

        let stats = HardwareStats {
            cpu_temp: pick_cpu_temp(&temps),
            cpu_load: Some(self.system.global_cpu_usage()),
            gpu_temp: pick_gpu_temp(&temps),
            gpu_load: None,
            ram_used_gb: Some(self.system.used_memory() as f32 / BYTES_PER_GIB),
            ram_total_gb: ram_total_gb(self.system.total_memory()),
        };
        debug!(?stats, "hardware sample");
        stats
    }
}

impl HardwareMonitor for SysinfoMonitor {
    fn stats(&mut self) -> HardwareStats {
        self.stats_at(Instant::now())
    }
}

fn ram_total_gb(total_bytes: u64) -> f32 {
    if total_bytes == 0 {
        FALLBACK_RAM_TOTAL_GB
    } else {
        total_bytes as f32 / BYTES_PER_GIB
    }
}

/// Package/die sensors first, then anything CPU-looking.
fn pick_cpu_temp(temps: &[(String, f32)]) -> Option<f32> {
    const PREFERRED: [&str; 4] = ["tctl", "package", "tdie", "coretemp"];
    PREFERRED
        .iter()
        .find_map(|key| temps.iter().find(|(label, _)| label.contains(key)))
        .or_else(|| {
            temps
                .iter()
                .find(|(label, _)| label.contains("cpu") || label.contains("k10temp"))
        })
        .map(|(_, t)| *t)
}

fn pick_gpu_temp(temps: &[(String, f32)]) -> Option<f32> {
    temps
        .iter()
        .find(|(label, _)| {
            label.contains("gpu") || label.contains("amdgpu") || label.contains("nvidia")
        })
        .map(|(_, t)| *t)
}
