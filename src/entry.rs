use anyhow::{Context, Result};

use crate::compare::{append_metrics, compare_run};
use crate::config::SimulationConfig;
use crate::io::input::load_sequence;
use crate::io::output::{save_sequence, write_motion_log, write_transform};
use crate::motion::simulate_motion;
use crate::noise::add_kspace_noise;
use crate::signal::inject_bold;

/// Promote a single base volume to a temporally constant sequence.
pub fn run_base_replication(input_path: &str, output_path: &str, count: usize) -> Result<()> {
    println!("Replicating {} into {} volumes", input_path, count);
    let sequence = load_sequence(input_path).context("loading base image failed")?;
    let replicated = sequence
        .volume(0)
        .replicate(count)
        .context("replicating base volume failed")?;
    save_sequence(&replicated, output_path).context("writing replicated sequence failed")?;
    println!("Wrote {}", output_path);
    Ok(())
}

/// Corrupt a sequence with rigid motion and write the sequence together with
/// both ground-truth artifacts.
///
/// Everything is simulated in memory first; files appear only once the whole
/// temporal loop succeeded, so the log can never describe a partial sequence.
pub fn run_motion_simulation(
    input_path: &str,
    output_path: &str,
    log_path: &str,
    transform_dir: &str,
    config: &SimulationConfig,
) -> Result<()> {
    println!("Simulating motion for {}", input_path);
    let sequence = load_sequence(input_path).context("loading input sequence failed")?;
    let output =
        simulate_motion(&sequence, &config.motion).context("motion simulation failed")?;

    std::fs::create_dir_all(transform_dir)
        .with_context(|| format!("could not create transform directory {:?}", transform_dir))?;
    for (t, transform) in output.transforms.iter().enumerate() {
        write_transform(transform, transform_dir, t)
            .with_context(|| format!("writing transform for volume {} failed", t))?;
    }
    write_motion_log(log_path, &output.log).context("writing motion log failed")?;
    save_sequence(&output.sequence, output_path).context("writing motion sequence failed")?;

    println!(
        "Wrote {} ({} volumes), log {} and transforms under {}",
        output_path,
        output.sequence.num_volumes(),
        log_path,
        transform_dir
    );
    Ok(())
}

/// Inject the periodic activation signal into an ROI and write the modified
/// sequence plus the signal-only ground truth.
pub fn run_bold_injection(
    input_path: &str,
    roi_path: &str,
    output_path: &str,
    signal_path: &str,
    config: &SimulationConfig,
) -> Result<()> {
    println!("Injecting activation from {} into {}", roi_path, input_path);
    let sequence = load_sequence(input_path).context("loading input sequence failed")?;
    let roi = load_sequence(roi_path)
        .context("loading ROI mask failed")?
        .volume(0);
    let output = inject_bold(&sequence, &roi, &config.bold).context("signal injection failed")?;

    save_sequence(&output.sequence, output_path).context("writing activated sequence failed")?;
    save_sequence(&output.signal, signal_path).context("writing signal-only sequence failed")?;
    println!("Wrote {} and {}", output_path, signal_path);
    Ok(())
}

/// Pass every volume of a sequence through the k-space noise synthesizer.
pub fn run_noise_synthesis(
    input_path: &str,
    output_path: &str,
    config: &SimulationConfig,
) -> Result<()> {
    println!("Adding k-space noise to {}", input_path);
    let sequence = load_sequence(input_path).context("loading input sequence failed")?;
    let noisy = add_kspace_noise(&sequence, &config.noise).context("noise synthesis failed")?;
    save_sequence(&noisy, output_path).context("writing noisy sequence failed")?;
    println!("Wrote {}", output_path);
    Ok(())
}

/// Score estimated transforms against the ground-truth log and append the
/// per-volume L2 norms to a metrics file.
pub fn run_comparison(
    log_path: &str,
    transform_dir: &str,
    metrics_path: &str,
    label: &str,
) -> Result<()> {
    let metrics = compare_run(log_path, transform_dir, label)
        .context("comparison against the motion log failed")?;
    append_metrics(metrics_path, &metrics).context("appending run metrics failed")?;
    println!(
        "Run {}: {} volumes scored, appended to {}",
        label,
        metrics.l2_norms.len(),
        metrics_path
    );
    Ok(())
}
