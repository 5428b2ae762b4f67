use anyhow::{bail, Context, Result};
use nalgebra::Matrix4;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::motion::MotionRecord;
use crate::transform::{RigidTransform, TransformArtifact};

/// Read the ground-truth motion log written by the trajectory simulator.
pub fn read_motion_log<P: AsRef<Path>>(path: P) -> Result<Vec<MotionRecord>> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open motion log {:?}", path.as_ref()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: MotionRecord =
            row.with_context(|| "failed to deserialize motion log row")?;
        records.push(record);
    }
    Ok(records)
}

/// Read one per-volume transform artifact back from disk.
pub fn read_transform<P: AsRef<Path>>(path: P) -> Result<RigidTransform> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open transform artifact {:?}", path.as_ref()))?;
    let artifact: TransformArtifact = serde_json::from_reader(BufReader::new(file))
        .with_context(|| "failed to parse transform artifact")?;
    Ok(artifact.to_transform())
}

/// Homogeneous rotation matrix for a logged motion state, using the same
/// Z * X * Y negated-radian convention the simulator injected with.
pub fn known_motion_matrix(xdeg: f64, ydeg: f64, zdeg: f64) -> Matrix4<f64> {
    RigidTransform::rigid_motion(
        xdeg,
        ydeg,
        zdeg,
        nalgebra::Vector3::zeros(),
        nalgebra::Vector3::zeros(),
    )
    .to_homogeneous()
}

/// L2 norm of the difference between two flattened 4x4 matrices.
pub fn l2_difference(known: &Matrix4<f64>, estimated: &Matrix4<f64>) -> f64 {
    (known - estimated).norm()
}

/// Per-entry percent error between two flattened 4x4 matrices, plus the
/// mean over all entries.
///
/// Equal entries score 0. A zero known entry against a non-zero estimate has
/// no finite relative error, so it scores a signed sentinel of magnitude 2.
pub fn percent_error(known: &Matrix4<f64>, estimated: &Matrix4<f64>) -> (Vec<f64>, f64) {
    let mut errors = Vec::with_capacity(16);
    for r in 0..4 {
        for c in 0..4 {
            let o = known[(r, c)];
            let e = estimated[(r, c)];
            let error = if o == e {
                0.0
            } else if o != 0.0 {
                (e - o).abs() / o
            } else {
                2.0 * e / e.abs()
            };
            errors.push(error);
        }
    }
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    (errors, mean)
}

/// Per-volume comparison results for one simulation run.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    pub label: String,
    pub l2_norms: Vec<f64>,
}

/// Score a directory of estimated transform artifacts against the
/// ground-truth motion log. Artifact files are matched to log rows by the
/// zero-padded volume index that leads their file name.
pub fn compare_run<P: AsRef<Path>, Q: AsRef<Path>>(
    log_path: P,
    transform_dir: Q,
    label: &str,
) -> Result<RunMetrics> {
    let records = read_motion_log(&log_path)?;
    if records.is_empty() {
        bail!(
            "motion log {:?} has no rows, nothing to compare",
            log_path.as_ref()
        );
    }

    let mut entries: Vec<_> = std::fs::read_dir(&transform_dir)
        .with_context(|| format!("failed to list {:?}", transform_dir.as_ref()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    let mut l2_norms = Vec::with_capacity(entries.len());
    for path in &entries {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let index: usize = name
            .get(..3)
            .and_then(|s| s.parse().ok())
            .with_context(|| format!("file name {:?} does not start with a volume index", name))?;
        let record = records.iter().find(|r| r.volume == index).with_context(|| {
            format!("no motion log row for volume {} ({:?})", index, name)
        })?;

        let known = known_motion_matrix(record.x_angle, record.y_angle, record.z_angle);
        let estimated = read_transform(path)?.to_homogeneous();
        l2_norms.push(l2_difference(&known, &estimated));
    }

    Ok(RunMetrics {
        label: label.to_string(),
        l2_norms,
    })
}

/// Append one run's metrics as a row of the run-level metrics file:
/// the label followed by one L2 norm per volume.
pub fn append_metrics<P: AsRef<Path>>(path: P, metrics: &RunMetrics) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open metrics file {:?}", path.as_ref()))?;
    let mut writer = BufWriter::new(file);

    let mut line = metrics.label.clone();
    for norm in &metrics.l2_norms {
        line.push(',');
        line.push_str(&norm.to_string());
    }
    writeln!(writer, "{}", line)?;
    Ok(())
}
