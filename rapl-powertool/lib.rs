pub mod common;
pub mod config;
pub mod error;
pub mod sampler;
pub mod topology;

use std::io::Write;

pub use common::{MsrBackend, RegisterAccess, RegisterBackend};
pub use config::{Mode, PowertoolConfig};
pub use error::{PowertoolError, Result};
pub use sampler::EnergySampler;
pub use topology::{discover_packages, Package};

/// Discover packages, then sample them with `backend` according to `config.mode`
///
/// Returns only after a total measurement or on error; rate mode runs until the
/// process is terminated.
pub fn run<B, W>(config: &PowertoolConfig, backend: &B, out: &mut W) -> Result<()>
where
    B: RegisterBackend,
    W: Write,
{
    let packages = discover_packages(&config.topology_root, config.max_cores, config.max_packages)?;
    if packages.is_empty() {
        return Err(PowertoolError::ConfigError(format!(
            "no CPU packages found in {}",
            config.topology_root.display()
        )));
    }

    tracing::info!(
        "Using {} register layout for cores {:?}",
        config.vendor,
        packages
            .iter()
            .map(|p| p.representative_core)
            .collect::<Vec<_>>()
    );

    let mut sampler = EnergySampler::initialize(&packages, config.layout(), backend)?;
    sampler.run(config.mode, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapl_raw::{RaplLayout, Vendor};
    use std::fs::{self, File};
    use std::os::unix::fs::FileExt;
    use std::path::Path;

    fn fake_machine(root: &Path, vendor: Vendor, package_ids: &[u32], devices: &[u32]) {
        let layout = vendor.layout();
        let topology = root.join("sys");
        for (cpu, id) in package_ids.iter().enumerate() {
            let path = topology::physical_package_id_path(&topology, cpu as u32);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, format!("{id}\n")).unwrap();
        }

        for &cpu in devices {
            let path = rapl_raw::msr::device_path(root.join("dev"), cpu);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let file = File::create(&path).unwrap();
            file.write_all_at(&0x000A_0E03u64.to_le_bytes(), layout.units_register)
                .unwrap();
            set_energy(&path, &layout, 0x0001_0000);
        }
    }

    fn set_energy(device: &Path, layout: &RaplLayout, value: u64) {
        let file = fs::OpenOptions::new().write(true).open(device).unwrap();
        file.write_all_at(&value.to_le_bytes(), layout.energy_register)
            .unwrap();
    }

    fn config(root: &Path, vendor: Vendor, mode: Mode) -> PowertoolConfig {
        PowertoolConfig {
            topology_root: root.join("sys"),
            device_root: root.join("dev"),
            ..PowertoolConfig::new(vendor, mode)
        }
    }

    #[test]
    fn test_total_mode_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fake_machine(dir.path(), Vendor::Intel, &[0, 0, 1, 1], &[0, 2]);

        let config = config(dir.path(), Vendor::Intel, Mode::Total { duration_ms: 1 });
        let mut out = Vec::new();
        run(&config, &MsrBackend::new(&config.device_root), &mut out).unwrap();

        // Device files are static, so no energy was consumed
        assert_eq!(String::from_utf8(out).unwrap(), "0,0\n");
    }

    #[test]
    fn test_amd_total_mode_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fake_machine(dir.path(), Vendor::Amd, &[0, 1], &[0, 1]);

        let config = config(dir.path(), Vendor::Amd, Mode::Total { duration_ms: 1 });
        let mut out = Vec::new();
        run(&config, &MsrBackend::new(&config.device_root), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "0,0\n");
    }

    #[test]
    fn test_amd_layout_through_device_files() {
        let dir = tempfile::tempdir().unwrap();
        fake_machine(dir.path(), Vendor::Amd, &[0, 1], &[0, 1]);
        let layout = RaplLayout::AMD;
        let backend = MsrBackend::new(dir.path().join("dev"));

        let packages = discover_packages(&dir.path().join("sys"), 1024, 16).unwrap();
        let mut sampler = EnergySampler::initialize(&packages, layout, &backend).unwrap();
        assert_eq!(sampler.packages()[0].energy_unit(), 1.0 / 16384.0);

        // 16384 counts of 1/16384 J on the first package, nothing on the second
        let device = rapl_raw::msr::device_path(dir.path().join("dev"), 0);
        set_energy(&device, &layout, 0x0001_0000 + 16384);

        assert_eq!(sampler.sample_joules().unwrap(), vec![1.0, 0.0]);
        assert_eq!(sampler.sample_watts(500).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_device_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        fake_machine(dir.path(), Vendor::Intel, &[0, 1], &[0]);

        let config = config(dir.path(), Vendor::Intel, Mode::Total { duration_ms: 1 });
        let mut out = Vec::new();
        let err = run(&config, &MsrBackend::new(&config.device_root), &mut out).unwrap_err();

        assert_eq!(err.exit_code(), 127);
        assert!(err.to_string().contains("for CPU 1"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_packages_is_config_error() {
        let dir = tempfile::tempdir().unwrap();

        let config = config(dir.path(), Vendor::Intel, Mode::Rate { interval_ms: 1000 });
        let mut out = Vec::new();
        let err = run(&config, &MsrBackend::new(&config.device_root), &mut out).unwrap_err();

        assert!(matches!(err, PowertoolError::ConfigError(_)));
        assert!(out.is_empty());
    }
}
