//! 3-D FFT helpers built on rustfft, following NumPy's fftn/ifftn and
//! fftshift/ifftshift conventions. Data is laid out in C order (z fastest),
//! matching `ndarray`'s default layout.

use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

/// Index into a 3-D array stored in C order: `(i * ny + j) * nz + k`.
#[inline(always)]
pub fn idx3d(i: usize, j: usize, k: usize, ny: usize, nz: usize) -> usize {
    (i * ny + j) * nz + k
}

fn transform_axes(
    data: &mut [Complex64],
    nx: usize,
    ny: usize,
    nz: usize,
    direction: FftDirection,
) {
    let mut planner = FftPlanner::new();

    // z axis is contiguous, transform rows in place
    let fft_z = planner.plan_fft(nz, direction);
    let mut scratch = vec![Complex64::new(0.0, 0.0); fft_z.get_inplace_scratch_len()];
    for i in 0..nx {
        for j in 0..ny {
            let start = idx3d(i, j, 0, ny, nz);
            fft_z.process_with_scratch(&mut data[start..start + nz], &mut scratch);
        }
    }

    // y axis, stride nz: gather, transform, scatter
    let fft_y = planner.plan_fft(ny, direction);
    let mut scratch = vec![Complex64::new(0.0, 0.0); fft_y.get_inplace_scratch_len()];
    let mut buffer = vec![Complex64::new(0.0, 0.0); ny];
    for i in 0..nx {
        for k in 0..nz {
            for j in 0..ny {
                buffer[j] = data[idx3d(i, j, k, ny, nz)];
            }
            fft_y.process_with_scratch(&mut buffer, &mut scratch);
            for j in 0..ny {
                data[idx3d(i, j, k, ny, nz)] = buffer[j];
            }
        }
    }

    // x axis, stride ny*nz
    let fft_x = planner.plan_fft(nx, direction);
    let mut scratch = vec![Complex64::new(0.0, 0.0); fft_x.get_inplace_scratch_len()];
    let mut buffer = vec![Complex64::new(0.0, 0.0); nx];
    for j in 0..ny {
        for k in 0..nz {
            for i in 0..nx {
                buffer[i] = data[idx3d(i, j, k, ny, nz)];
            }
            fft_x.process_with_scratch(&mut buffer, &mut scratch);
            for i in 0..nx {
                data[idx3d(i, j, k, ny, nz)] = buffer[i];
            }
        }
    }
}

/// In-place forward 3-D FFT (complex-to-complex), numpy.fft.fftn behavior.
pub fn fft3d(data: &mut [Complex64], nx: usize, ny: usize, nz: usize) {
    transform_axes(data, nx, ny, nz, FftDirection::Forward);
}

/// In-place inverse 3-D FFT with 1/N normalization, numpy.fft.ifftn behavior.
pub fn ifft3d(data: &mut [Complex64], nx: usize, ny: usize, nz: usize) {
    transform_axes(data, nx, ny, nz, FftDirection::Inverse);
    let n_total = (nx * ny * nz) as f64;
    for value in data.iter_mut() {
        *value /= n_total;
    }
}

fn roll3d(
    data: &[Complex64],
    nx: usize,
    ny: usize,
    nz: usize,
    sx: usize,
    sy: usize,
    sz: usize,
) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); data.len()];
    for i in 0..nx {
        let di = (i + sx) % nx;
        for j in 0..ny {
            let dj = (j + sy) % ny;
            for k in 0..nz {
                let dk = (k + sz) % nz;
                out[idx3d(di, dj, dk, ny, nz)] = data[idx3d(i, j, k, ny, nz)];
            }
        }
    }
    out
}

/// Shift the zero-frequency component to the center of the spectrum,
/// numpy.fft.fftshift behavior.
pub fn fftshift(data: &[Complex64], nx: usize, ny: usize, nz: usize) -> Vec<Complex64> {
    roll3d(data, nx, ny, nz, nx / 2, ny / 2, nz / 2)
}

/// Undo `fftshift`, numpy.fft.ifftshift behavior. Distinct from `fftshift`
/// for odd-sized axes.
pub fn ifftshift(data: &[Complex64], nx: usize, ny: usize, nz: usize) -> Vec<Complex64> {
    roll3d(data, nx, ny, nz, nx - nx / 2, ny - ny / 2, nz - nz / 2)
}
