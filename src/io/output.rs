use anyhow::{Context, Result};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::Sequence;
use crate::motion::MotionRecord;
use crate::transform::{RigidTransform, TransformArtifact};

fn header_from_mapping(sequence: &Sequence) -> NiftiHeader {
    let mapping = &sequence.mapping;
    let mut header = NiftiHeader::default();

    let mut srow = [[0.0f32; 4]; 3];
    for r in 0..3 {
        for c in 0..4 {
            srow[r][c] = mapping.affine[(r, c)] as f32;
        }
    }
    header.srow_x = srow[0];
    header.srow_y = srow[1];
    header.srow_z = srow[2];
    header.sform_code = 1;

    let size = mapping.voxel_size();
    header.pixdim[1] = size[0] as f32;
    header.pixdim[2] = size[1] as f32;
    header.pixdim[3] = size[2] as f32;
    header.pixdim[4] = mapping.repetition_time as f32;

    header
}

/// Save a sequence as NIfTI, preserving its coordinate mapping.
pub fn save_sequence<P: AsRef<Path>>(sequence: &Sequence, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("could not create output directory {:?}", parent))?;
        }
    }

    let header = header_from_mapping(sequence);
    WriterOptions::new(path.as_ref())
        .reference_header(&header)
        .write_nifti(&sequence.data)
        .with_context(|| format!("failed to write NIfTI file {:?}", path.as_ref()))?;
    Ok(())
}

/// Write the ground-truth motion log: one header line, then one
/// comma-separated row per simulated volume, in volume order.
pub fn write_motion_log<P: AsRef<Path>>(path: P, records: &[MotionRecord]) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("failed to create motion log {:?}", path.as_ref()))?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "Volume Number, X Angle, Y Angle, Z Angle, X Translation, Y Translation, Z Translation"
    )?;
    for r in records {
        writeln!(
            writer,
            "{}, {}, {}, {}, {}, {}, {}",
            r.volume,
            r.x_angle,
            r.y_angle,
            r.z_angle,
            r.x_translation,
            r.y_translation,
            r.z_translation
        )?;
    }
    Ok(())
}

/// Write one per-volume transform artifact, named by its zero-padded
/// volume index so the comparator can match it to the log later.
pub fn write_transform<P: AsRef<Path>>(
    transform: &RigidTransform,
    dir: P,
    volume_index: usize,
) -> Result<PathBuf> {
    let path = dir
        .as_ref()
        .join(format!("{:03}_generated_affine.json", volume_index));
    let file = File::create(&path)
        .with_context(|| format!("failed to create transform artifact {:?}", path))?;
    let artifact = TransformArtifact::from(transform);
    serde_json::to_writer_pretty(BufWriter::new(file), &artifact)
        .with_context(|| format!("failed to serialize transform for volume {}", volume_index))?;
    Ok(path)
}

#[cfg(test)]
mod output_tests {
    use super::*;
    use crate::compare::{read_motion_log, read_transform};
    use crate::transform::Axis;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use tempfile::tempdir;

    #[test]
    fn test_motion_log_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("motion_variables.csv");

        let records = vec![
            MotionRecord {
                volume: 0,
                x_angle: 0.0,
                y_angle: 0.0,
                z_angle: 0.0,
                x_translation: 0.0,
                y_translation: 0.0,
                z_translation: 0.0,
            },
            MotionRecord {
                volume: 1,
                x_angle: 0.5,
                y_angle: -1.25,
                z_angle: 2.0,
                x_translation: 0.0,
                y_translation: 0.0,
                z_translation: 0.0,
            },
        ];
        write_motion_log(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Volume Number, X Angle, Y Angle, Z Angle, X Translation, Y Translation, Z Translation"
        );
        assert_eq!(lines.next().unwrap(), "0, 0, 0, 0, 0, 0, 0");
        assert_eq!(lines.next().unwrap(), "1, 0.5, -1.25, 2, 0, 0, 0");

        let parsed = read_motion_log(&path).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_transform_artifact_file_name_and_content() {
        let dir = tempdir().unwrap();
        let t = RigidTransform::rotation(Axis::Z, 15.0, Vector3::new(32.0, 32.0, 18.0));

        let path = write_transform(&t, dir.path(), 7).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "007_generated_affine.json"
        );

        let back = read_transform(&path).unwrap();
        assert_relative_eq!(back.matrix, t.matrix, epsilon = 1e-15);
        assert_relative_eq!(back.center, t.center, epsilon = 1e-15);
    }
}
