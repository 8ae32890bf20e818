use super::capture::{CaptureConstraints, CaptureDevice, CaptureFormat, CaptureStream, ChunkSink};
use crate::{ChatError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The host's default input device
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalCapture;

impl CpalCapture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureDevice for CpalCapture {
    fn acquire(&self, constraints: &CaptureConstraints) -> Result<Box<dyn CaptureStream>> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| ChatError::DeviceUnavailable("No input device available".into()))?;

        info!("Using input device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

        if constraints.echo_cancellation || constraints.noise_suppression {
            debug!("Echo cancellation and noise suppression are left to the host audio stack");
        }

        let config = negotiate_config(&device, constraints.sample_rate)?;
        Ok(Box::new(CpalStream::new(device, config)))
    }
}

/// Prefer an f32 config at the requested rate, else the device default
fn negotiate_config(device: &Device, sample_rate: u32) -> Result<StreamConfig> {
    let preferred = SampleRate(sample_rate);

    let matching = device
        .supported_input_configs()
        .map_err(|e| ChatError::DeviceUnavailable(format!("Failed to query input configs: {}", e)))?
        .filter(|range| range.sample_format() == SampleFormat::F32)
        .find(|range| range.min_sample_rate() <= preferred && preferred <= range.max_sample_rate());

    match matching {
        Some(range) => Ok(range.with_sample_rate(preferred).config()),
        None => {
            warn!("{} Hz not supported by input device, using its default", sample_rate);
            device
                .default_input_config()
                .map(|supported| supported.config())
                .map_err(|e| ChatError::DeviceUnavailable(format!("Failed to get input config: {}", e)))
        }
    }
}

/// PCM waiting to fill a timeslice, plus whether the stream was finalized
#[derive(Default)]
struct PendingAudio {
    bytes: Vec<u8>,
    finalized: bool,
}

struct CpalStream {
    device: Device,
    config: StreamConfig,
    format: CaptureFormat,
    stream: Option<Stream>,
    pending: Arc<Mutex<PendingAudio>>,
    sink: Option<ChunkSink>,
}

impl CpalStream {
    fn new(device: Device, config: StreamConfig) -> Self {
        let format = CaptureFormat::pcm16(config.sample_rate.0, config.channels);
        Self {
            device,
            config,
            format,
            stream: None,
            pending: Arc::new(Mutex::new(PendingAudio::default())),
            sink: None,
        }
    }
}

impl CaptureStream for CpalStream {
    fn format(&self) -> &CaptureFormat {
        &self.format
    }

    fn start(&mut self, timeslice: Duration, sink: ChunkSink) -> Result<()> {
        if self.stream.is_some() {
            warn!("Already recording");
            return Ok(());
        }

        let slice_bytes = self.format.bytes_per_slice(timeslice);
        let pending = Arc::clone(&self.pending);
        let callback_sink = sink.clone();

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mut pending = pending.lock();
                    if pending.finalized {
                        return;
                    }

                    for &sample in data {
                        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                        pending.bytes.extend_from_slice(&value.to_le_bytes());
                    }

                    if pending.bytes.len() >= slice_bytes {
                        let chunk = std::mem::take(&mut pending.bytes);
                        if callback_sink.send(chunk).is_err() {
                            debug!("Recording session gone, dropping chunk");
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| ChatError::DeviceUnavailable(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ChatError::DeviceUnavailable(format!("Failed to start input stream: {}", e)))?;

        self.stream = Some(stream);
        self.sink = Some(sink);

        info!(
            "Started audio capture at {} Hz, {} channel(s)",
            self.format.sample_rate, self.format.channels
        );
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.pause() {
                warn!("Failed to pause input stream: {}", e);
            }
        }

        let mut pending = self.pending.lock();
        pending.finalized = true;
        let rest = std::mem::take(&mut pending.bytes);

        if let Some(sink) = &self.sink {
            if !rest.is_empty() && sink.send(rest).is_err() {
                debug!("Recording session gone, dropping final chunk");
            }
        }

        Ok(())
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Stopped audio capture");
        }
        self.sink = None;
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}
