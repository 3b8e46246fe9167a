//! Passive yield: CPU/GPU toggles plus stacking capacity plans.

use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ledger::Vault;
use crate::schedule::Interval;

pub const MINED_ASSET: &str = "BTC";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningPlan {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: f64,
    pub hashrate_mh: f64,
    pub description: &'static str,
}

pub static PLANS: [MiningPlan; 3] = [
    MiningPlan {
        id: "asic_pro",
        name: "ASIC Pro Cluster",
        cost: 100.0,
        hashrate_mh: 0.25,
        description: "Entry-level industrial ASIC array for steady yield.",
    },
    MiningPlan {
        id: "datacenter_node",
        name: "Datacenter Node",
        cost: 400.0,
        hashrate_mh: 1.0,
        description: "High-density blade server integration.",
    },
    MiningPlan {
        id: "quantum_nexus",
        name: "Quantum Nexus",
        cost: 1000.0,
        hashrate_mh: 3.0,
        description: "Experimental sub-zero compute.",
    },
];

pub fn find_plan(id: &str) -> Option<&'static MiningPlan> {
    PLANS.iter().find(|plan| plan.id == id)
}

/// Per-tick yield constants, in units of the mined asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccrualRates {
    pub cpu_ceiling: f64,
    pub gpu_ceiling: f64,
    pub plan_factor: f64,
}

impl Default for AccrualRates {
    fn default() -> Self {
        Self {
            cpu_ceiling: 0.000_01,
            gpu_ceiling: 0.000_15,
            plan_factor: 0.000_005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningCapacity {
    pub cpu_enabled: bool,
    pub cpu_hashrate: f64,
    pub gpu_enabled: bool,
    pub gpu_hashrate: f64,
    pub total_mined: f64,
    /// Each entry is one owned unit; duplicates stack.
    pub purchased_plans: Vec<String>,
}

impl Default for MiningCapacity {
    fn default() -> Self {
        Self {
            cpu_enabled: false,
            cpu_hashrate: 0.0,
            gpu_enabled: false,
            gpu_hashrate: 0.0,
            total_mined: 0.0,
            purchased_plans: Vec::new(),
        }
    }
}

impl MiningCapacity {
    /// Flips the CPU miner and re-reads its hashrate (H/s).
    pub fn toggle_cpu<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.cpu_enabled = !self.cpu_enabled;
        self.cpu_hashrate = if self.cpu_enabled {
            450.0 + Uniform::new(0.0, 50.0).sample(rng)
        } else {
            0.0
        };
        self.cpu_enabled
    }

    pub fn toggle_gpu<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.gpu_enabled = !self.gpu_enabled;
        self.gpu_hashrate = if self.gpu_enabled {
            8500.0 + Uniform::new(0.0, 500.0).sample(rng)
        } else {
            0.0
        };
        self.gpu_enabled
    }

    /// Combined MH/s of owned plans. Ids missing from the catalog count zero.
    pub fn plan_hashrate(&self) -> f64 {
        self.purchased_plans
            .iter()
            .filter_map(|id| find_plan(id))
            .map(|plan| plan.hashrate_mh)
            .sum()
    }

    pub fn owned(&self, plan_id: &str) -> usize {
        self.purchased_plans.iter().filter(|id| *id == plan_id).count()
    }

    pub fn is_idle(&self) -> bool {
        !self.cpu_enabled && !self.gpu_enabled && self.plan_hashrate() == 0.0
    }
}

fn jitter<R: Rng + ?Sized>(ceiling: f64, rng: &mut R) -> f64 {
    if ceiling > 0.0 {
        Uniform::new(0.0, ceiling).sample(rng)
    } else {
        0.0
    }
}

/// Amount mined in one tick. Zero when nothing is running.
pub fn accrual_amount<R: Rng + ?Sized>(
    capacity: &MiningCapacity,
    rates: &AccrualRates,
    rng: &mut R,
) -> f64 {
    let mut earned = 0.0;
    if capacity.cpu_enabled {
        earned += jitter(rates.cpu_ceiling, rng);
    }
    if capacity.gpu_enabled {
        earned += jitter(rates.gpu_ceiling, rng);
    }
    earned + capacity.plan_hashrate() * rates.plan_factor
}

pub const ACCRUAL_PERIOD: Duration = Duration::from_secs(3);

/// Owns the accrual timer. Nothing is credited while it is stopped, and
/// stopping drops any partially elapsed period.
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualLoop {
    interval: Interval,
    rates: AccrualRates,
}

impl AccrualLoop {
    pub fn new(period: Duration, rates: AccrualRates) -> Self {
        Self {
            interval: Interval::new(period),
            rates,
        }
    }

    pub fn rates(&self) -> &AccrualRates {
        &self.rates
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_running()
    }

    pub fn start(&mut self) {
        info!(period_ms = self.interval.period().as_millis() as u64, "accrual loop started");
        self.interval.start();
    }

    pub fn stop(&mut self) {
        info!("accrual loop stopped");
        self.interval.stop();
    }

    /// Runs every accrual tick that fell inside `dt` and returns the total mined.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: Duration, vault: &mut Vault, rng: &mut R) -> f64 {
        let ticks = self.interval.advance(dt);
        (0..ticks)
            .filter_map(|_| vault.accrue(&self.rates, rng))
            .sum()
    }
}

impl Default for AccrualLoop {
    fn default() -> Self {
        Self::new(ACCRUAL_PERIOD, AccrualRates::default())
    }
}
