use anyhow::bail;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    Device, FromSample, InputCallbackInfo, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
    StreamError,
};
use crossbeam_channel::{Receiver, Sender};
use realfft::RealFftPlanner;
use realfft::num_complex::Complex32;
use std::time::Duration;
use tracing::{debug, warn};

use rezvibe::Snapshot;
use rezvibe::config::AudioConfig;

/// Maps one bin's power to the 0..=255 range of the host spectrum.
pub fn power_to_level(power: f32, gain: f32, floor_db: f32) -> f32 {
    if power <= 0.0 || floor_db >= 0.0 {
        return 0.0;
    }
    let db = 20.0 * (power.sqrt() * gain).log10();
    ((db - floor_db) / -floor_db).clamp(0.0, 1.0) * 255.0
}

/// Spawns the analyzer thread.
///
/// Receives interleaved frames with `device_channels` channels and sends a
/// [`Snapshot`] of `bins` magnitudes per spectrum channel every half window.
pub fn start_spectrum_analyzer(
    rx_frames: Receiver<Vec<f32>>,
    tx_snap: Sender<Snapshot>,
    device_channels: usize,
    bins: usize,
    audio: AudioConfig,
) {
    std::thread::spawn(move || {
        let device_channels = device_channels.max(1);
        let channels = audio.channels.clamp(1, device_channels);
        let fft_size: usize = bins * 2;
        let hop: usize = fft_size / 2;

        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let mut input: Vec<f32> = r2c.make_input_vec();
        let mut spectrum: Vec<Complex32> = r2c.make_output_vec();
        let mut scratch = r2c.make_scratch_vec();

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let n = i as f32;
                0.5 - 0.5 * ((2.0 * std::f32::consts::PI * n) / fft_size as f32).cos()
            })
            .collect();

        // one rolling buffer per spectrum channel
        let mut rings: Vec<Vec<f32>> = vec![Vec::with_capacity(fft_size * 2); channels];

        debug!(
            "analyzer running: {} of {} channels, {}-point FFT",
            channels, device_channels, fft_size
        );

        while let Ok(chunk) = rx_frames.recv() {
            for frame in chunk.chunks(device_channels) {
                for (ring, &sample) in rings.iter_mut().zip(frame) {
                    ring.push(sample);
                }
            }

            while rings.iter().all(|ring| ring.len() >= fft_size) {
                let mut levels = Vec::with_capacity(channels);

                for ring in &rings {
                    for i in 0..fft_size {
                        input[i] = ring[i] * window[i];
                    }

                    if let Err(e) = r2c.process_with_scratch(&mut input, &mut spectrum, &mut scratch) {
                        warn!("FFT failed: {}", e);
                        return;
                    }

                    let channel: Vec<f32> = spectrum
                        .iter()
                        .take(bins)
                        .map(|c| power_to_level(c.re * c.re + c.im * c.im, audio.gain, audio.floor_db))
                        .collect();
                    levels.push(channel);
                }

                let _ = tx_snap.try_send(Snapshot::new(levels));

                // advance by hop (50% overlap)
                for ring in &mut rings {
                    ring.drain(0..hop);
                }
            }
        }
    });
}

pub fn build_loopback_stream<T>(
    device: &Device,
    cfg: &StreamConfig,
    tx_frames: Sender<Vec<f32>>,
) -> Result<Stream, anyhow::Error>
where
    T: Sample + Send + 'static + SizedSample + std::fmt::Debug,
    f32: FromSample<<T as Sample>::Float>,
{
    let err_callback = |err: StreamError| warn!("an error occurred on stream: {}", err);

    let input_callback = move |data: &[T], _info: &InputCallbackInfo| {
        if data.is_empty() {
            return;
        }
        let chunk: Vec<f32> = data
            .iter()
            .map(|s| f32::from_sample(s.to_float_sample()))
            .collect();
        let _ = tx_frames.try_send(chunk);
    };

    let latency = Some(Duration::from_millis(20));
    let stream = device.build_input_stream(cfg, input_callback, err_callback, latency)?;
    stream.play()?;
    Ok(stream)
}

pub fn create_audio_stream(
    device: &Device,
    sample_format: SampleFormat,
    cfg: &StreamConfig,
    tx_frames: Sender<Vec<f32>>,
) -> Result<Stream, anyhow::Error> {
    match sample_format {
        SampleFormat::F32 => build_loopback_stream::<f32>(device, cfg, tx_frames),
        SampleFormat::I16 => build_loopback_stream::<i16>(device, cfg, tx_frames),
        SampleFormat::U16 => build_loopback_stream::<u16>(device, cfg, tx_frames),
        _ => bail!("unsupported sample format: {:?}", sample_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_maps_to_zero() {
        assert_eq!(power_to_level(0.0, 0.2, -60.0), 0.0);
    }

    #[test]
    fn levels_span_the_byte_range() {
        // magnitude 5 * gain 0.2 = 0 dB
        assert_eq!(power_to_level(25.0, 0.2, -60.0), 255.0);
        // -30 dB sits halfway
        let half = power_to_level((5.0 * 10f32.powf(-1.5)).powi(2), 0.2, -60.0);
        assert!((half - 127.5).abs() < 0.5);
        assert_eq!(power_to_level(1e-12, 0.2, -60.0), 0.0);
    }

    #[test]
    fn analyzer_emits_full_snapshots() {
        let (tx_frames, rx_frames) = crossbeam_channel::bounded(4);
        let (tx_snap, rx_snap) = crossbeam_channel::bounded(4);
        start_spectrum_analyzer(rx_frames, tx_snap, 2, 64, AudioConfig::default());

        let frames: Vec<f32> = (0..256).map(|i| ((i / 2) as f32 * 0.3).sin()).collect();
        tx_frames.send(frames).unwrap();

        let snap = rx_snap.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(snap.channels.len(), 2);
        assert_eq!(snap.bins(), Some(64));
        assert!(snap.channels[0].iter().all(|v| (0.0..=255.0).contains(v)));
    }
}
