//! CPU package discovery from the sysfs topology interface

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PowertoolError, Result};

/// One physical CPU socket and the core used to address its registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    /// Position in discovery order, also the output column
    pub index: usize,
    /// Lowest-numbered logical core seen on this package
    pub representative_core: u32,
    /// `physical_package_id` reported by the kernel
    pub physical_id: u32,
}

pub fn physical_package_id_path(topology_root: &Path, cpu: u32) -> PathBuf {
    topology_root
        .join(format!("cpu{cpu}"))
        .join("topology")
        .join("physical_package_id")
}

/// Read the physical package id of `cpu`
///
/// Returns `Ok(None)` when the attribute cannot be read, which means the core
/// is not present.
fn read_physical_package_id(topology_root: &Path, cpu: u32) -> Result<Option<u32>> {
    let path = physical_package_id_path(topology_root, cpu);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };

    content.trim().parse::<u32>().map(Some).map_err(|e| {
        PowertoolError::io_at(&path, io::Error::new(io::ErrorKind::InvalidData, e))
    })
}

/// Group `(core, physical_id)` readings into packages, first seen id first
pub fn group_packages(
    readings: impl IntoIterator<Item = (u32, u32)>,
    max_packages: usize,
) -> Result<Vec<Package>> {
    let mut seen = HashSet::new();
    let mut packages = Vec::new();

    for (core, physical_id) in readings {
        if !seen.insert(physical_id) {
            continue;
        }

        if packages.len() == max_packages {
            return Err(PowertoolError::ConfigError(format!(
                "core {core} belongs to package {physical_id}, but at most {max_packages} packages are supported"
            )));
        }

        tracing::debug!("Package {} -> core {core} (physical id {physical_id})", packages.len());
        packages.push(Package {
            index: packages.len(),
            representative_core: core,
            physical_id,
        });
    }

    Ok(packages)
}

/// Scan cores `0..max_cores` and return one representative core per package
///
/// Scanning stops at the first core without a readable topology entry.
pub fn discover_packages(
    topology_root: &Path,
    max_cores: u32,
    max_packages: usize,
) -> Result<Vec<Package>> {
    let mut readings = Vec::new();
    for cpu in 0..max_cores {
        match read_physical_package_id(topology_root, cpu)? {
            Some(physical_id) => readings.push((cpu, physical_id)),
            None => break,
        }
    }

    let packages = group_packages(readings.iter().copied(), max_packages)?;

    tracing::info!(
        "Discovered {} packages across {} cores",
        packages.len(),
        readings.len()
    );

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_topology(root: &Path, ids: &[&str]) {
        for (cpu, id) in ids.iter().enumerate() {
            let path = physical_package_id_path(root, cpu as u32);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, format!("{id}\n")).unwrap();
        }
    }

    fn cores(packages: &[Package]) -> Vec<(usize, u32)> {
        packages
            .iter()
            .map(|p| (p.index, p.representative_core))
            .collect()
    }

    #[test]
    fn test_first_seen_order() {
        let readings = [0, 1, 0, 2, 1].into_iter().enumerate().map(|(c, id)| (c as u32, id));
        let packages = group_packages(readings, 16).unwrap();
        assert_eq!(cores(&packages), vec![(0, 0), (1, 1), (2, 3)]);
    }

    #[test]
    fn test_order_ignores_numeric_id() {
        let packages = group_packages([(0, 5), (1, 2), (2, 5), (3, 0)], 16).unwrap();
        assert_eq!(cores(&packages), vec![(0, 0), (1, 1), (2, 3)]);
        assert_eq!(packages[0].physical_id, 5);
        assert_eq!(packages[2].physical_id, 0);
    }

    #[test]
    fn test_package_cap_exceeded() {
        let err = group_packages([(0, 0), (1, 1), (2, 2)], 2).unwrap_err();
        assert!(matches!(err, PowertoolError::ConfigError(_)));
        assert_eq!(err.exit_code(), 1);

        // Repeated ids never count against the cap
        assert_eq!(group_packages([(0, 0), (1, 1), (2, 1)], 2).unwrap().len(), 2);
    }

    #[test]
    fn test_discover_from_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        fake_topology(dir.path(), &["0", "1", "0", "2", "1"]);

        let packages = discover_packages(dir.path(), 1024, 16).unwrap();
        assert_eq!(cores(&packages), vec![(0, 0), (1, 1), (2, 3)]);
    }

    #[test]
    fn test_discover_stops_at_first_missing_core() {
        let dir = tempfile::tempdir().unwrap();
        fake_topology(dir.path(), &["0", "0"]);
        // cpu3 exists, but the scan never gets past the missing cpu2
        let path = physical_package_id_path(dir.path(), 3);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "1\n").unwrap();

        let packages = discover_packages(dir.path(), 1024, 16).unwrap();
        assert_eq!(cores(&packages), vec![(0, 0)]);
    }

    #[test]
    fn test_discover_respects_max_cores() {
        let dir = tempfile::tempdir().unwrap();
        fake_topology(dir.path(), &["0", "1", "2"]);

        let packages = discover_packages(dir.path(), 2, 16).unwrap();
        assert_eq!(packages.len(), 2);
    }

    #[test]
    fn test_discover_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_packages(dir.path(), 1024, 16).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_package_id() {
        let dir = tempfile::tempdir().unwrap();
        fake_topology(dir.path(), &["0", "socket"]);

        let err = discover_packages(dir.path(), 1024, 16).unwrap_err();
        assert_eq!(err.exit_code(), 127);
        assert!(err.to_string().contains("cpu1"));
    }
}
