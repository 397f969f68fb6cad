//! SIMD-accelerated kernels for the frame pipeline using pulp

use num_traits::Float;

#[cfg(feature = "simd")]
use pulp::Arch;

/// Element-wise product `output[i] = signal[i] * window[i]`.
/// Used by both plans: analysis windowing and synthesis windowing.
#[inline]
pub fn apply_window<T: Float + 'static>(signal: &[T], window: &[T], output: &mut [T]) {
    debug_assert_eq!(signal.len(), window.len());
    debug_assert_eq!(signal.len(), output.len());

    #[cfg(feature = "simd")]
    {
        let simd = pulp::Arch::new();
        match (
            std::any::TypeId::of::<T>(),
            std::any::TypeId::of::<f32>(),
            std::any::TypeId::of::<f64>(),
        ) {
            (t, f32_id, _) if t == f32_id => {
                apply_window_f32_simd(
                    simd,
                    unsafe { std::mem::transmute::<&[T], &[f32]>(signal) },
                    unsafe { std::mem::transmute::<&[T], &[f32]>(window) },
                    unsafe { std::mem::transmute::<&mut [T], &mut [f32]>(output) },
                );
                return;
            }
            (t, _, f64_id) if t == f64_id => {
                apply_window_f64_simd(
                    simd,
                    unsafe { std::mem::transmute::<&[T], &[f64]>(signal) },
                    unsafe { std::mem::transmute::<&[T], &[f64]>(window) },
                    unsafe { std::mem::transmute::<&mut [T], &mut [f64]>(output) },
                );
                return;
            }
            _ => {}
        }
    }

    for ((o, &s), &w) in output.iter_mut().zip(signal).zip(window) {
        *o = s * w;
    }
}

#[cfg(feature = "simd")]
fn apply_window_f32_simd(simd: Arch, signal: &[f32], window: &[f32], output: &mut [f32]) {
    simd.dispatch(|| {
        let (signal_head, signal_tail) = pulp::as_arrays::<4, _>(signal);
        let (window_head, window_tail) = pulp::as_arrays::<4, _>(window);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for i in 0..signal_head.len() {
            output_head[i] = [
                signal_head[i][0] * window_head[i][0],
                signal_head[i][1] * window_head[i][1],
                signal_head[i][2] * window_head[i][2],
                signal_head[i][3] * window_head[i][3],
            ];
        }

        for i in 0..signal_tail.len() {
            output_tail[i] = signal_tail[i] * window_tail[i];
        }
    });
}

#[cfg(feature = "simd")]
fn apply_window_f64_simd(simd: Arch, signal: &[f64], window: &[f64], output: &mut [f64]) {
    simd.dispatch(|| {
        let (signal_head, signal_tail) = pulp::as_arrays::<4, _>(signal);
        let (window_head, window_tail) = pulp::as_arrays::<4, _>(window);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for i in 0..signal_head.len() {
            output_head[i] = [
                signal_head[i][0] * window_head[i][0],
                signal_head[i][1] * window_head[i][1],
                signal_head[i][2] * window_head[i][2],
                signal_head[i][3] * window_head[i][3],
            ];
        }

        for i in 0..signal_tail.len() {
            output_tail[i] = signal_tail[i] * window_tail[i];
        }
    });
}

/// Overlap-add accumulation: `output[i] += input[i]`.
#[inline]
pub fn accumulate<T: Float + 'static>(input: &[T], output: &mut [T]) {
    debug_assert_eq!(input.len(), output.len());

    #[cfg(feature = "simd")]
    {
        let simd = pulp::Arch::new();
        match (
            std::any::TypeId::of::<T>(),
            std::any::TypeId::of::<f32>(),
            std::any::TypeId::of::<f64>(),
        ) {
            (t, f32_id, _) if t == f32_id => {
                accumulate_f32_simd(
                    simd,
                    unsafe { std::mem::transmute::<&[T], &[f32]>(input) },
                    unsafe { std::mem::transmute::<&mut [T], &mut [f32]>(output) },
                );
                return;
            }
            (t, _, f64_id) if t == f64_id => {
                accumulate_f64_simd(
                    simd,
                    unsafe { std::mem::transmute::<&[T], &[f64]>(input) },
                    unsafe { std::mem::transmute::<&mut [T], &mut [f64]>(output) },
                );
                return;
            }
            _ => {}
        }
    }

    for (o, &i) in output.iter_mut().zip(input) {
        *o = *o + i;
    }
}

#[cfg(feature = "simd")]
fn accumulate_f32_simd(simd: Arch, input: &[f32], output: &mut [f32]) {
    simd.dispatch(|| {
        let (input_head, input_tail) = pulp::as_arrays::<4, _>(input);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for i in 0..input_head.len() {
            output_head[i][0] += input_head[i][0];
            output_head[i][1] += input_head[i][1];
            output_head[i][2] += input_head[i][2];
            output_head[i][3] += input_head[i][3];
        }

        for i in 0..input_tail.len() {
            output_tail[i] += input_tail[i];
        }
    });
}

#[cfg(feature = "simd")]
fn accumulate_f64_simd(simd: Arch, input: &[f64], output: &mut [f64]) {
    simd.dispatch(|| {
        let (input_head, input_tail) = pulp::as_arrays::<4, _>(input);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for i in 0..input_head.len() {
            output_head[i][0] += input_head[i][0];
            output_head[i][1] += input_head[i][1];
            output_head[i][2] += input_head[i][2];
            output_head[i][3] += input_head[i][3];
        }

        for i in 0..input_tail.len() {
            output_tail[i] += input_tail[i];
        }
    });
}
