//! Package energy sampling: rate (Watts) and total (Joules) modes

use std::io::Write;
use std::thread;
use std::time::Duration;

use rapl_raw::{RaplEnergyStatus, RaplLayout, RaplPowerUnit, RegisterLayout};

use crate::common::{RegisterAccess, RegisterBackend};
use crate::config::Mode;
use crate::error::{PowertoolError, Result};
use crate::topology::Package;

/// Raw energy delta between two counter readings
///
/// When the counter went backwards it is assumed to have wrapped once and the
/// delta is `u32::MAX - (current - previous)` in wrapping 32-bit arithmetic.
/// More than one wrap per interval is not detected.
pub fn energy_delta(previous: u32, current: u32) -> u32 {
    let delta = current.wrapping_sub(previous);
    if current < previous {
        u32::MAX - delta
    } else {
        delta
    }
}

pub fn to_joules(delta: u32, energy_unit: f64) -> f64 {
    delta as f64 * energy_unit
}

/// Average power over `interval_ms`
pub fn to_watts(delta: u32, energy_unit: f64, interval_ms: u64) -> f64 {
    to_joules(delta, energy_unit) * 1000.0 / interval_ms as f64
}

/// One CSV line: values in package order, newline terminated
pub fn format_line(values: &[f64]) -> String {
    let mut line = values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Sampling state of a single package
pub struct PackageSampler<H> {
    package: Package,
    handle: H,
    units: RaplPowerUnit,
    previous_raw: u32,
}

impl<H: RegisterAccess> PackageSampler<H> {
    fn new(package: Package, mut handle: H, layout: &RaplLayout) -> Result<Self> {
        let units = RaplPowerUnit::decode(handle.read(layout.units_register)?, layout);
        let previous_raw = read_counter(&mut handle, layout)?;

        tracing::debug!(
            "Package {} (core {}): energy unit {} J, time unit {} s, power unit {} W",
            package.index,
            handle.cpu_id(),
            units.energy_unit_multiplier(),
            units.time_unit_multiplier(),
            units.power_unit_multiplier()
        );

        Ok(Self {
            package,
            handle,
            units,
            previous_raw,
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn units(&self) -> &RaplPowerUnit {
        &self.units
    }

    pub fn energy_unit(&self) -> f64 {
        self.units.energy_unit_multiplier()
    }

    /// Read the counter, return the delta since the last reading and keep the new baseline
    fn advance(&mut self, layout: &RaplLayout) -> Result<u32> {
        let current = read_counter(&mut self.handle, layout)?;
        let delta = energy_delta(self.previous_raw, current);
        self.previous_raw = current;
        Ok(delta)
    }
}

fn read_counter<H: RegisterAccess>(handle: &mut H, layout: &RaplLayout) -> Result<u32> {
    let raw = handle.read(layout.energy_register)?;
    Ok(RaplEnergyStatus::from_msr_value(raw).counter)
}

/// Samples the package energy counters of every discovered package
pub struct EnergySampler<H> {
    layout: RaplLayout,
    packages: Vec<PackageSampler<H>>,
}

impl<H: RegisterAccess> EnergySampler<H> {
    /// Open every package's registers, decode units and take the baseline readings
    ///
    /// Any failure aborts the whole initialization; nothing is sampled.
    pub fn initialize<B>(packages: &[Package], layout: RaplLayout, backend: &B) -> Result<Self>
    where
        B: RegisterBackend<Handle = H>,
    {
        let packages = packages
            .iter()
            .map(|package| {
                let handle = backend.open(package.representative_core)?;
                PackageSampler::new(*package, handle, &layout)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { layout, packages })
    }

    pub fn packages(&self) -> &[PackageSampler<H>] {
        &self.packages
    }

    fn deltas(&mut self) -> Result<Vec<(u32, f64)>> {
        let layout = self.layout;
        self.packages
            .iter_mut()
            .map(|p| -> Result<(u32, f64)> { Ok((p.advance(&layout)?, p.energy_unit())) })
            .collect()
    }

    /// One pass over all packages, in Watts averaged over `interval_ms`
    pub fn sample_watts(&mut self, interval_ms: u64) -> Result<Vec<f64>> {
        Ok(self
            .deltas()?
            .into_iter()
            .map(|(delta, unit)| to_watts(delta, unit, interval_ms))
            .collect())
    }

    /// One pass over all packages, in Joules since the previous reading
    pub fn sample_joules(&mut self) -> Result<Vec<f64>> {
        Ok(self
            .deltas()?
            .into_iter()
            .map(|(delta, unit)| to_joules(delta, unit))
            .collect())
    }

    pub fn run<W: Write>(&mut self, mode: Mode, out: &mut W) -> Result<()> {
        match mode {
            Mode::Rate { interval_ms } => self.run_rate(interval_ms, out, None),
            Mode::Total { duration_ms } => self.run_total(duration_ms, out),
        }
    }

    /// Print the average power every `interval_ms`
    ///
    /// Runs until an error occurs, or for `max_iterations` lines when given.
    pub fn run_rate<W: Write>(
        &mut self,
        interval_ms: u64,
        out: &mut W,
        max_iterations: Option<u64>,
    ) -> Result<()> {
        tracing::info!(
            "Sampling {} packages every {} ms",
            self.packages.len(),
            interval_ms
        );

        let mut iterations = 0;
        while max_iterations.map_or(true, |max| iterations < max) {
            thread::sleep(Duration::from_millis(interval_ms));
            let watts = self.sample_watts(interval_ms)?;
            write_line(out, &watts)?;
            iterations += 1;
        }

        Ok(())
    }

    /// Print the energy consumed over `duration_ms`
    pub fn run_total<W: Write>(&mut self, duration_ms: u64, out: &mut W) -> Result<()> {
        tracing::info!(
            "Measuring {} packages over {} ms",
            self.packages.len(),
            duration_ms
        );

        thread::sleep(Duration::from_millis(duration_ms));
        let joules = self.sample_joules()?;
        write_line(out, &joules)
    }
}

fn write_line<W: Write>(out: &mut W, values: &[f64]) -> Result<()> {
    out.write_all(format_line(values).as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| PowertoolError::io("Failed to write measurements", e))
}
